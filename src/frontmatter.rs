//! Front-matter parsing.
//!
//! Pages carry their navigation metadata in a block delimited by `---` lines:
//!
//! ```text
//! ---
//! title: Install
//! parent: Guide
//! grand_parent: Home
//! nav_order: 1
//! has_children: false
//! ---
//! # Installing
//! ...
//! ```
//!
//! ## Rules
//!
//! - The first `---` line opens the block and the second closes it. Nothing
//!   after the closing delimiter is read.
//! - A line with an odd number of ```` ``` ```` markers toggles fenced code.
//!   Delimiters and keys inside fenced code are ignored.
//! - Keys are split from values on the first colon. Values are trimmed and one
//!   pair of matching surrounding quotes is removed.
//! - Unknown keys are ignored. `title` is the only required key.
//!
//! A file without a block or without a `title` is not an error: it is simply
//! not a content page ([`Parsed::NoFrontMatter`], [`Parsed::NoTitle`]).
//! A block that is present but broken (never closed, an empty `title`, a
//! non-integer `nav_order`, a flag that is neither `true` nor `false`) is a
//! [`FrontMatterError`].

use crate::types::Document;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

/// Line that opens and closes the front-matter block.
pub const DELIMITER: &str = "---";

const FENCE: &str = "```";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("front matter opened on line {0} is never closed")]
    Unterminated(usize),
    #[error("line {0}: title is empty")]
    EmptyTitle(usize),
    #[error("line {line}: nav_order {value:?} is not an integer")]
    InvalidNavOrder { line: usize, value: String },
    #[error("line {line}: {key} must be `true` or `false`, found {value:?}")]
    InvalidFlag {
        line: usize,
        key: &'static str,
        value: String,
    },
}

/// Outcome of parsing one file's front matter.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// Block found and `title` set.
    Valid(Document),
    /// Block found but no `title` key in it.
    NoTitle,
    /// No opening delimiter outside fenced code.
    NoFrontMatter,
}

impl Parsed {
    pub fn is_valid(&self) -> bool {
        matches!(self, Parsed::Valid(_))
    }

    pub fn into_document(self) -> Option<Document> {
        match self {
            Parsed::Valid(doc) => Some(doc),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq)]
enum LineKind {
    Open,
    Close,
    Field,
    Other,
}

/// Tracks the two toggles while walking a file line by line.
#[derive(Default)]
struct LineScanner {
    in_front_matter: bool,
    in_fence: bool,
}

impl LineScanner {
    fn classify(&mut self, index: usize, line: &str) -> LineKind {
        if toggles_fence(index, line) {
            self.in_fence = !self.in_fence;
            return LineKind::Other;
        }
        if self.in_fence {
            return LineKind::Other;
        }
        if line.trim() == DELIMITER {
            self.in_front_matter = !self.in_front_matter;
            return if self.in_front_matter {
                LineKind::Open
            } else {
                LineKind::Close
            };
        }
        if self.in_front_matter {
            LineKind::Field
        } else {
            LineKind::Other
        }
    }
}

pub(crate) fn toggles_fence(index: usize, line: &str) -> bool {
    line.matches(FENCE).count() % 2 == 1 || (index == 0 && line.trim_start().starts_with(FENCE))
}

/// Parse the front matter of `text`, recording `path` as the document's source.
pub fn parse_front_matter(text: &str, path: &Path) -> Result<Parsed, FrontMatterError> {
    let mut scanner = LineScanner::default();
    let mut doc = Document {
        full_path: path.to_path_buf(),
        ..Document::default()
    };
    let mut has_title = false;
    let mut opened_on = None;

    for (index, line) in text.lines().enumerate() {
        match scanner.classify(index, line) {
            LineKind::Open => opened_on = Some(index + 1),
            LineKind::Close => {
                return Ok(if has_title {
                    Parsed::Valid(doc)
                } else {
                    Parsed::NoTitle
                });
            }
            LineKind::Field => apply_field(&mut doc, &mut has_title, index + 1, line)?,
            LineKind::Other => {}
        }
    }

    match opened_on {
        Some(line) => Err(FrontMatterError::Unterminated(line)),
        None => Ok(Parsed::NoFrontMatter),
    }
}

fn apply_field(
    doc: &mut Document,
    has_title: &mut bool,
    line_no: usize,
    line: &str,
) -> Result<(), FrontMatterError> {
    let Some((key, raw)) = line.split_once(':') else {
        return Ok(());
    };
    let value = unquote(raw.trim());

    match key.trim() {
        "title" => {
            if value.is_empty() {
                return Err(FrontMatterError::EmptyTitle(line_no));
            }
            doc.title = value.to_string();
            *has_title = true;
        }
        "parent" => doc.parent = value.to_string(),
        "grand_parent" => doc.grand_parent = value.to_string(),
        "nav_order" => {
            doc.nav_order = value
                .parse()
                .map_err(|_| FrontMatterError::InvalidNavOrder {
                    line: line_no,
                    value: value.to_string(),
                })?;
        }
        "has_children" => doc.has_children = parse_flag("has_children", line_no, value)?,
        "nav_exclude" => doc.nav_exclude = parse_flag("nav_exclude", line_no, value)?,
        _ => {}
    }
    Ok(())
}

fn parse_flag(key: &'static str, line: usize, value: &str) -> Result<bool, FrontMatterError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(FrontMatterError::InvalidFlag {
            line,
            key,
            value: value.to_string(),
        })
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Byte range of the front-matter block, both delimiter lines included.
///
/// Returns `None` when there is no block or it is never closed.
pub fn front_matter_span(text: &str) -> Option<Range<usize>> {
    let mut scanner = LineScanner::default();
    let mut offset = 0;
    let mut start = None;

    for (index, chunk) in text.split_inclusive('\n').enumerate() {
        let line = chunk.trim_end_matches(['\n', '\r']);
        match scanner.classify(index, line) {
            LineKind::Open => start = Some(offset),
            LineKind::Close => return start.map(|s| s..offset + chunk.len()),
            LineKind::Field | LineKind::Other => {}
        }
        offset += chunk.len();
    }
    None
}
