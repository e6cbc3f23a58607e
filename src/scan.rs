//! Folder scanning and manifest generation.
//!
//! Stage 1 of the build pipeline. Walks the source directory recursively and
//! parses the front matter of every Markdown file, producing a flat
//! [`Manifest`] of valid documents that the tree stage consumes.
//!
//! ## Directory Structure
//!
//! The folder layout carries no meaning; the hierarchy comes entirely from
//! front matter. A typical tree:
//!
//! ```text
//! docs/
//! ├── config.toml          # Build configuration (optional)
//! ├── index.md             # title: Home
//! ├── guide/
//! │   ├── index.md         # title: Guide, parent: Home
//! │   └── install.md       # title: Install, parent: Guide, grand_parent: Home
//! ├── notes.md             # No front matter, skipped
//! └── .drafts/             # Hidden, never descended
//! ```
//!
//! ## Skipped Files
//!
//! Markdown files that are not content pages are recorded in
//! [`Manifest::skipped`] with the reason, instead of failing the scan:
//! no front matter, no `title`, or malformed front matter.
//!
//! ## Parallel Parsing
//!
//! Files are discovered sequentially (sorted by name for stable output) and
//! then parsed in parallel with [rayon](https://docs.rs/rayon). Documents are
//! independent until tree insertion, so order is restored on collection.

use crate::frontmatter::{self, Parsed};
use crate::types::Document;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Source directory not found: {0}")]
    MissingRoot(PathBuf),
    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Manifest output from the scan stage.
#[derive(Debug, Default, Serialize)]
pub struct Manifest {
    pub documents: Vec<Document>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedFile>,
}

/// A Markdown file that did not yield a document.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    NoFrontMatter,
    NoTitle,
    Malformed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoFrontMatter => write!(f, "no front matter"),
            SkipReason::NoTitle => write!(f, "no title"),
            SkipReason::Malformed(msg) => write!(f, "malformed front matter: {msg}"),
        }
    }
}

const MARKDOWN_EXTENSIONS: &[&str] = &["md"];

/// Scan `root` for Markdown pages.
pub fn scan(root: &Path) -> Result<Manifest, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }

    let files = collect_markdown_files(root)?;
    debug!(count = files.len(), root = %root.display(), "discovered markdown files");

    let outcomes: Vec<(PathBuf, Result<Document, SkipReason>)> = files
        .into_par_iter()
        .map(|path| {
            let outcome = parse_page(&path);
            (path, outcome)
        })
        .collect();

    let mut manifest = Manifest::default();
    for (path, outcome) in outcomes {
        match outcome {
            Ok(doc) => {
                debug!(title = %doc.title, path = %path.display(), "collected document");
                manifest.documents.push(doc);
            }
            Err(reason) => {
                if let SkipReason::Malformed(msg) = &reason {
                    warn!(path = %path.display(), "skipping page: {msg}");
                } else {
                    debug!(path = %path.display(), %reason, "skipping file");
                }
                manifest.skipped.push(SkippedFile { path, reason });
            }
        }
    }

    info!(
        documents = manifest.documents.len(),
        skipped = manifest.skipped.len(),
        "scan complete"
    );
    Ok(manifest)
}

/// Recursively list Markdown files, descending into every non-hidden directory.
fn collect_markdown_files(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = entry.map_err(|source| ScanError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_markdown(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|e| {
            let ext = e.to_string_lossy();
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

fn parse_page(path: &Path) -> Result<Document, SkipReason> {
    let content = fs::read_to_string(path).map_err(|e| SkipReason::Malformed(e.to_string()))?;
    match frontmatter::parse_front_matter(&content, path) {
        Ok(Parsed::Valid(doc)) => Ok(doc),
        Ok(Parsed::NoTitle) => Err(SkipReason::NoTitle),
        Ok(Parsed::NoFrontMatter) => Err(SkipReason::NoFrontMatter),
        Err(e) => Err(SkipReason::Malformed(e.to_string())),
    }
}
