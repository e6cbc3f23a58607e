//! Markdown → LaTeX text rewriting.
//!
//! A page body is converted by a fixed sequence of independent [`Pass`]es.
//! Each pass takes text and returns text; later passes only ever see the
//! output of earlier ones, so the order in [`Pass::ALL`] matters:
//!
//! ```text
//!  1. strip-blank-lines     whitespace-only lines, runs of blank lines
//!  2. strip-front-matter    the --- delimited metadata block
//!  3. horizontal-rules      ---, ***, ___      → \rule
//!  4. italic                *x*, _x_           → \textit{x}
//!  5. bold                  **x**, __x__       → \textbf{x}
//!  6. unordered-lists       - / * / + bullets  → itemize
//!  7. images                ![alt](path)       → figure
//!  8. html-images           <img src="...">    → figure
//!  9. tables                | a | b |          → tabular
//! 10. headers               # .. ####          → \part .. \subsubsection
//! 11. links                 [text](url)        → \href + \footnote
//! 12. fenced-code           ``` blocks         → verbatim
//! ```
//!
//! Rule and emphasis markers are consumed before lists so `***` never opens
//! a bullet; images are converted before links so `![..](..)` is never read as
//! a link. Every pass except front-matter stripping and the final code pass
//! only touches prose outside fenced code blocks.
//!
//! ## Termination
//!
//! Passes whose patterns can still match after one sweep (emphasis with
//! adjacent spans, lists, images) repeat until nothing matches, capped at
//! [`RewriteOptions::max_iterations`]. Hitting the cap fails with
//! [`RewriteError::IterationLimit`] carrying the fragment that kept matching.

mod blocks;
mod figures;
mod inline;

use crate::config::BuildConfig;
use regex::{Regex, Replacer};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[error("{pass} pass still matching after {limit} iterations near {fragment:?}")]
    IterationLimit {
        pass: Pass,
        limit: usize,
        fragment: String,
    },
}

/// One step of the rewrite pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    StripBlankLines,
    StripFrontMatter,
    HorizontalRules,
    Italic,
    Bold,
    UnorderedLists,
    Images,
    HtmlImages,
    Tables,
    Headers,
    Links,
    FencedCode,
}

impl Pass {
    /// All passes in the order the pipeline runs them.
    pub const ALL: [Pass; 12] = [
        Pass::StripBlankLines,
        Pass::StripFrontMatter,
        Pass::HorizontalRules,
        Pass::Italic,
        Pass::Bold,
        Pass::UnorderedLists,
        Pass::Images,
        Pass::HtmlImages,
        Pass::Tables,
        Pass::Headers,
        Pass::Links,
        Pass::FencedCode,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Pass::StripBlankLines => "strip-blank-lines",
            Pass::StripFrontMatter => "strip-front-matter",
            Pass::HorizontalRules => "horizontal-rules",
            Pass::Italic => "italic",
            Pass::Bold => "bold",
            Pass::UnorderedLists => "unordered-lists",
            Pass::Images => "images",
            Pass::HtmlImages => "html-images",
            Pass::Tables => "tables",
            Pass::Headers => "headers",
            Pass::Links => "links",
            Pass::FencedCode => "fenced-code",
        }
    }

    /// Apply this pass alone.
    pub fn apply(
        self,
        text: &str,
        options: &RewriteOptions,
        context: &RewriteContext,
    ) -> Result<String, RewriteError> {
        match self {
            Pass::StripBlankLines => {
                map_prose(&text.replace("\r\n", "\n"), |p| Ok(inline::strip_blank_lines(p)))
            }
            Pass::StripFrontMatter => Ok(inline::strip_front_matter(text)),
            Pass::HorizontalRules => map_prose(text, |p| Ok(inline::horizontal_rules(p))),
            Pass::Italic => map_prose(text, |p| inline::italic(p, options)),
            Pass::Bold => map_prose(text, |p| Ok(inline::bold(p))),
            Pass::UnorderedLists => map_prose(text, |p| blocks::unordered_lists(p, options)),
            Pass::Images => map_prose(text, |p| figures::images(p, options, context)),
            Pass::HtmlImages => map_prose(text, |p| figures::html_images(p, options, context)),
            Pass::Tables => map_prose(text, |p| Ok(blocks::tables(p))),
            Pass::Headers => map_prose(text, |p| Ok(blocks::headers(p))),
            Pass::Links => map_prose(text, |p| Ok(inline::links(p))),
            Pass::FencedCode => Ok(blocks::fenced_code(text)),
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Settings shared by every page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Cap on sweeps for passes that repeat until nothing matches.
    pub max_iterations: usize,
    /// `width=` argument of `\includegraphics`.
    pub figure_width: String,
    /// Float placement specifier for `figure`.
    pub figure_placement: String,
    /// Point image references at the `.png` produced by the image converter.
    pub png_images: bool,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            max_iterations: 64,
            figure_width: "0.8\\textwidth".to_string(),
            figure_placement: "H".to_string(),
            png_images: true,
        }
    }
}

impl RewriteOptions {
    pub fn from_build_config(config: &BuildConfig) -> Self {
        Self {
            max_iterations: config.rewrite.max_iterations,
            figure_width: config.figures.width.clone(),
            figure_placement: config.figures.placement.clone(),
            png_images: config.figures.png_images,
        }
    }
}

/// Per-page input to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct RewriteContext {
    /// Directory relative image paths are resolved against.
    pub asset_dir: Option<PathBuf>,
}

/// The full pass sequence.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: RewriteOptions,
}

impl Pipeline {
    pub fn new(options: RewriteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Convert one page body to a LaTeX fragment.
    pub fn run(&self, text: &str, context: &RewriteContext) -> Result<String, RewriteError> {
        let mut current = text.to_string();
        for pass in Pass::ALL {
            current = pass.apply(&current, &self.options, context)?;
            trace!(%pass, len = current.len(), "applied pass");
        }
        Ok(current)
    }
}

/// Replace every match of `re`, repeating until none remain.
fn rewrite_until_stable<R: Replacer>(
    pass: Pass,
    text: &str,
    limit: usize,
    re: &Regex,
    mut replacer: R,
) -> Result<String, RewriteError> {
    let mut current = text.to_string();
    for _ in 0..limit {
        if !re.is_match(&current) {
            return Ok(current);
        }
        current = re.replace_all(&current, replacer.by_ref()).into_owned();
    }
    match re.find(&current) {
        Some(m) => Err(RewriteError::IterationLimit {
            pass,
            limit,
            fragment: m.as_str().to_string(),
        }),
        None => Ok(current),
    }
}

/// A run of lines that is either ordinary prose or a fenced code block.
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Prose(&'a str),
    /// Opening fence through closing fence, inclusive.
    Code(&'a str),
}

/// Split `text` at fence lines. An unclosed fence runs to the end.
fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    let mut in_code = false;

    for (index, chunk) in text.split_inclusive('\n').enumerate() {
        let line = chunk.trim_end_matches(['\n', '\r']);
        let end = offset + chunk.len();
        if crate::frontmatter::toggles_fence(index, line) {
            if in_code {
                out.push(Segment::Code(&text[start..end]));
                start = end;
            } else {
                if start < offset {
                    out.push(Segment::Prose(&text[start..offset]));
                }
                start = offset;
            }
            in_code = !in_code;
        }
        offset = end;
    }

    if start < text.len() {
        let rest = &text[start..];
        out.push(if in_code {
            Segment::Code(rest)
        } else {
            Segment::Prose(rest)
        });
    }
    out
}

/// Apply `f` to prose segments, copying code blocks through untouched.
fn map_prose<F>(text: &str, mut f: F) -> Result<String, RewriteError>
where
    F: FnMut(&str) -> Result<String, RewriteError>,
{
    let mut out = String::with_capacity(text.len());
    for segment in segments(text) {
        match segment {
            Segment::Prose(prose) => out.push_str(&f(prose)?),
            Segment::Code(code) => out.push_str(code),
        }
    }
    Ok(out)
}
