//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Every page is shown by its semantic identity, a positional index and its
//! title, with the Markdown file it came from as secondary context on an
//! indented `Source:` line. Paths are displayed relative to the source root.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Pages
//! 001 Home
//!     Source: index.md
//! 002 Guide (parent: Home)
//!     Source: guide/index.md
//!
//! Skipped
//!     notes.md: no front matter
//!
//! Config
//!     config.toml
//! ```
//!
//! ## Tree
//!
//! ```text
//! 001 Home
//!     Source: index.md
//!     001 Guide
//!         Source: guide/index.md
//!         001 Install
//!             Source: guide/install.md
//! ```
//!
//! ## Build
//!
//! ```text
//! Home (412 bytes)
//!     Guide (230 bytes)
//!         Install (1024 bytes)
//!
//! Wrote 3 pages to output.tex
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O beyond an existence check for `config.toml`.

use crate::config::CONFIG_FILE;
use crate::generate::GenerateReport;
use crate::scan::Manifest;
use crate::tree::Page;
use crate::types::Document;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Path shown to the user: relative to the source root when possible.
fn display_path(path: &Path, source_root: &Path) -> String {
    path.strip_prefix(source_root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Header line for a page: index, title and the declared parent chain.
///
/// ```text
/// 001 Home
/// 002 Guide (parent: Home)
/// 003 Install (parent: Guide / Home)
/// ```
fn page_header(index: usize, doc: &Document) -> String {
    match (doc.parent.as_str(), doc.grand_parent.as_str()) {
        ("", _) => format!("{} {}", format_index(index), doc.title),
        (parent, "") => format!("{} {} (parent: {})", format_index(index), doc.title, parent),
        (parent, grand) => format!(
            "{} {} (parent: {} / {})",
            format_index(index),
            doc.title,
            parent,
            grand
        ),
    }
}

fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

// ============================================================================
// Stage 1: Scan output
// ============================================================================

/// Format scan stage output: valid pages in walk order, then skipped files.
pub fn format_scan_output(manifest: &Manifest, source_root: &Path) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];
    for (i, doc) in manifest.documents.iter().enumerate() {
        lines.push(page_header(i + 1, doc));
        lines.push(format!(
            "    Source: {}",
            display_path(&doc.full_path, source_root)
        ));
    }

    if !manifest.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for skipped in &manifest.skipped {
            lines.push(format!(
                "    {}: {}",
                display_path(&skipped.path, source_root),
                skipped.reason
            ));
        }
    }

    if source_root.join(CONFIG_FILE).exists() {
        lines.push(String::new());
        lines.push("Config".to_string());
        lines.push(format!("    {CONFIG_FILE}"));
    }

    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(manifest: &Manifest, source_root: &Path) {
    for line in format_scan_output(manifest, source_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Tree output
// ============================================================================

/// Format the page tree, one indentation level per depth below the root.
pub fn format_tree(root: &Page, source_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    format_children(root, 0, source_root, &mut lines);
    lines
}

fn format_children(page: &Page, depth: usize, source_root: &Path, lines: &mut Vec<String>) {
    let pad = indent(depth);
    for (i, child) in page.children.iter().enumerate() {
        lines.push(format!("{}{} {}", pad, format_index(i + 1), child.title()));
        lines.push(format!(
            "{}    Source: {}",
            pad,
            display_path(&child.document.full_path, source_root)
        ));
        format_children(child, depth + 1, source_root, lines);
    }
}

/// Print the page tree to stdout.
pub fn print_tree(root: &Page, source_root: &Path) {
    for line in format_tree(root, source_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 3: Build output
// ============================================================================

/// Format the build report: pages in the order written, then a summary.
///
/// `output` is `None` for `check`, which converts without writing.
pub fn format_generate_output(report: &GenerateReport, output: Option<&Path>) -> Vec<String> {
    let mut lines: Vec<String> = report
        .pages
        .iter()
        .map(|page| {
            format!(
                "{}{} ({} bytes)",
                indent(page.depth.saturating_sub(1)),
                page.title,
                page.bytes
            )
        })
        .collect();

    if !lines.is_empty() {
        lines.push(String::new());
    }
    let pages = pluralize(report.pages.len(), "page");
    lines.push(match output {
        Some(path) => format!("Wrote {} to {}", pages, path.display()),
        None => format!("Checked {}, no errors", pages),
    });
    lines
}

/// Print build output to stdout.
pub fn print_generate_output(report: &GenerateReport, output: Option<&Path>) {
    for line in format_generate_output(report, output) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
