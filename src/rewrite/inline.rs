//! Line-level and span-level passes: blank lines, front matter, rules,
//! emphasis and links.

use super::{Pass, RewriteError, RewriteOptions, rewrite_until_stable};
use crate::frontmatter;
use once_cell::sync::Lazy;
use regex::{Captures, NoExpand, Regex};

static WHITESPACE_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]+$").unwrap());
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

static HORIZONTAL_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:-{3,}|\*{3,}|_{3,})[ \t]*$").unwrap());

// Flanks are consumed, so adjacent spans need a second sweep.
static STAR_ITALIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(^|[^\w*\\])\*([^*\s](?:[^*\n]*[^*\s])?)\*($|[^\w*])").unwrap()
});
static UNDERSCORE_ITALIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(^|[^\w\\])_([^_\s](?:[^_\n]*[^_\s])?)_($|[^\w])").unwrap()
});

static STAR_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*").unwrap());
static UNDERSCORE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"__([^_\n]+?)__").unwrap());

static LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\[([^\]\n]+)\]\(\s*([^)\s]+)(?:\s+"[^"]*")?\s*\)"#).unwrap()
});

/// Link and image targets, `](...)`, plus `src="..."` attributes.
static TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\]\([^)\n]*\)|\bsrc\s*=\s*(?:"[^"\n]*"|'[^'\n]*')"#).unwrap()
});
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new("\x01([0-9]+)\x01").unwrap());

const RULE: &str = r"\noindent\rule{\textwidth}{0.4pt}";
const ITALIC: &str = r"${1}\textit{${2}}${3}";
const BOLD: &str = r"\textbf{${1}}";

/// Attribute list some pages append to external links.
pub(super) const LINK_TARGET_ARTIFACT: &str = r#"{:target="_blank" rel="noopener"}"#;

pub(super) fn strip_blank_lines(text: &str) -> String {
    let cleared = WHITESPACE_ONLY.replace_all(text, "");
    BLANK_RUN.replace_all(&cleared, "\n\n").into_owned()
}

pub(super) fn strip_front_matter(text: &str) -> String {
    match frontmatter::front_matter_span(text) {
        Some(span) => format!("{}{}", &text[..span.start], &text[span.end..]),
        None => text.to_string(),
    }
}

pub(super) fn horizontal_rules(text: &str) -> String {
    HORIZONTAL_RULE
        .replace_all(text, NoExpand(RULE))
        .into_owned()
}

pub(super) fn italic(text: &str, options: &RewriteOptions) -> Result<String, RewriteError> {
    let limit = options.max_iterations;
    outside_targets(text, |masked| {
        let starred = rewrite_until_stable(Pass::Italic, masked, limit, &STAR_ITALIC, ITALIC)?;
        rewrite_until_stable(Pass::Italic, &starred, limit, &UNDERSCORE_ITALIC, ITALIC)
    })
}

pub(super) fn bold(text: &str) -> String {
    let masked = Masked::new(text);
    let starred = STAR_BOLD.replace_all(&masked.text, BOLD);
    masked.restore(&UNDERSCORE_BOLD.replace_all(&starred, BOLD))
}

/// Text with every link target swapped for a `\x01N\x01` placeholder, so the
/// emphasis patterns cannot match inside URLs and image paths.
struct Masked {
    text: String,
    targets: Vec<String>,
}

impl Masked {
    fn new(text: &str) -> Self {
        let mut targets = Vec::new();
        let text = TARGET
            .replace_all(text, |caps: &Captures| {
                targets.push(caps[0].to_string());
                format!("\x01{}\x01", targets.len() - 1)
            })
            .into_owned();
        Self { text, targets }
    }

    fn restore(&self, text: &str) -> String {
        if self.targets.is_empty() {
            return text.to_string();
        }
        PLACEHOLDER
            .replace_all(text, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.targets.get(i))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

fn outside_targets<F>(text: &str, rewrite: F) -> Result<String, RewriteError>
where
    F: FnOnce(&str) -> Result<String, RewriteError>,
{
    let masked = Masked::new(text);
    match rewrite(&masked.text) {
        Ok(out) => Ok(masked.restore(&out)),
        Err(RewriteError::IterationLimit {
            pass,
            limit,
            fragment,
        }) => Err(RewriteError::IterationLimit {
            pass,
            limit,
            fragment: masked.restore(&fragment),
        }),
    }
}

pub(super) fn links(text: &str) -> String {
    let cleaned = text.replace(LINK_TARGET_ARTIFACT, "");
    LINK.replace_all(&cleaned, |caps: &Captures| {
        let label = &caps[1];
        let url = &caps[2];
        format!(
            "\\href{{{url}}}{{{label}}}\\footnote{{{}}}",
            escape_footnote_url(url)
        )
    })
    .into_owned()
}

/// Escape characters that break inside `\footnote` when not wrapped by `\href`.
fn escape_footnote_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        if matches!(c, '_' | '%' | '#' | '&') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
