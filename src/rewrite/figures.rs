//! Image passes: Markdown `![alt](path)` and inline HTML `<img>` tags both
//! become a centred `figure` environment.
//!
//! Raster and vector sources are converted to PNG next to the original by a
//! separate tool, so with [`RewriteOptions::png_images`] set the reference is
//! pointed at the `.png` sibling. Relative paths are resolved against the
//! page's own directory.

use super::{Pass, RewriteContext, RewriteError, RewriteOptions, rewrite_until_stable};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;

static MARKDOWN_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"!\[([^\]\n]*)\]\(\s*([^)\s]+)(?:\s+"[^"]*")?\s*\)"#).unwrap()
});

static HTML_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["'][^>]*>"#).unwrap()
});

static HTML_ALT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\balt\s*=\s*["']([^"']*)["']"#).unwrap());

/// Extensions the image converter turns into PNG.
const CONVERTIBLE_EXTENSIONS: &[&str] = &["svg", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff"];

pub(super) fn images(
    text: &str,
    options: &RewriteOptions,
    context: &RewriteContext,
) -> Result<String, RewriteError> {
    rewrite_until_stable(
        Pass::Images,
        text,
        options.max_iterations,
        &MARKDOWN_IMAGE,
        |caps: &Captures| render_figure(&caps[2], &caps[1], options, context),
    )
}

pub(super) fn html_images(
    text: &str,
    options: &RewriteOptions,
    context: &RewriteContext,
) -> Result<String, RewriteError> {
    rewrite_until_stable(
        Pass::HtmlImages,
        text,
        options.max_iterations,
        &HTML_IMAGE,
        |caps: &Captures| {
            let caption = HTML_ALT
                .captures(&caps[0])
                .map(|alt| alt[1].to_string())
                .unwrap_or_default();
            render_figure(&caps[1], &caption, options, context)
        },
    )
}

fn render_figure(
    source: &str,
    caption: &str,
    options: &RewriteOptions,
    context: &RewriteContext,
) -> String {
    let path = resolve_image_path(source, options, context);
    let mut out = format!(
        "\\begin{{figure}}[{}]\n\\centering\n\\includegraphics[width={}]{{{}}}\n",
        options.figure_placement, options.figure_width, path
    );
    let caption = caption.trim();
    if !caption.is_empty() {
        out.push_str(&format!("\\caption{{{caption}}}\n"));
    }
    out.push_str("\\end{figure}");
    out
}

fn resolve_image_path(source: &str, options: &RewriteOptions, context: &RewriteContext) -> String {
    if source.contains("://") {
        return source.to_string();
    }

    let raw = Path::new(source);
    let mut resolved = match &context.asset_dir {
        Some(dir) if raw.is_relative() => dir.join(raw),
        _ => raw.to_path_buf(),
    };

    let convertible = resolved
        .extension()
        .map(|e| {
            let ext = e.to_string_lossy();
            CONVERTIBLE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false);
    if options.png_images && convertible {
        resolved.set_extension("png");
    }

    let resolved = resolved.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '\\' {
        resolved.replace('\\', "/")
    } else {
        resolved.into_owned()
    }
}
