//! Shared test utilities for the mdlatex test suite.
//!
//! Provides fixture setup, document builders, lookup helpers, and tree-shape
//! assertions that work with scan and tree data structures (`Manifest`,
//! `Document`, `Page`).
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let manifest = scan(tmp.path()).unwrap();
//! assert_eq!(find_skipped(&manifest, "notes.md").reason, SkipReason::NoFrontMatter);
//!
//! let root = build_tree(vec![doc("Home", "", "", 0), doc("Guide", "Home", "", 1)]).unwrap();
//! assert_tree_shape(&root, &[(1, "Home"), (2, "Guide")]);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::scan::{Manifest, SkippedFile};
use crate::tree::Page;
use crate::types::Document;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/docs/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/docs");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `content` to `root/rel_path`, creating parent directories.
pub fn write_page(root: &Path, rel_path: &str, content: &str) -> PathBuf {
    let path = root.join(rel_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

// =========================================================================
// Builders
// =========================================================================

/// A document at `/docs/<title lowercased>.md` with the given placement.
pub fn doc(title: &str, parent: &str, grand_parent: &str, nav_order: i64) -> Document {
    Document {
        title: title.to_string(),
        parent: parent.to_string(),
        grand_parent: grand_parent.to_string(),
        nav_order,
        full_path: PathBuf::from(format!("/docs/{}.md", title.to_lowercase())),
        ..Document::default()
    }
}

// =========================================================================
// Manifest lookups: panic with a clear message on miss
// =========================================================================

/// All document titles in manifest (walk) order.
pub fn document_titles(manifest: &Manifest) -> Vec<&str> {
    manifest.documents.iter().map(|d| d.title.as_str()).collect()
}

/// Find a skipped file by file name. Panics if not found.
pub fn find_skipped<'a>(manifest: &'a Manifest, file_name: &str) -> &'a SkippedFile {
    manifest
        .skipped
        .iter()
        .find(|s| s.path.file_name().is_some_and(|n| n == file_name))
        .unwrap_or_else(|| {
            let names: Vec<String> = manifest
                .skipped
                .iter()
                .map(|s| s.path.display().to_string())
                .collect();
            panic!("skipped file '{file_name}' not found. Skipped: {names:?}")
        })
}

// =========================================================================
// Tree assertions
// =========================================================================

/// Titles of a page's direct children, in sibling order.
pub fn child_titles(page: &Page) -> Vec<&str> {
    page.children.iter().map(|c| c.title()).collect()
}

/// Assert the pre-order `(depth, title)` sequence below the root.
///
/// ```ignore
/// assert_tree_shape(&root, &[
///     (1, "Home"),
///     (2, "Guide"),
///     (3, "Install"),
///     (2, "Reference"),
/// ]);
/// ```
pub fn assert_tree_shape(root: &Page, expected: &[(usize, &str)]) {
    let actual: Vec<(usize, &str)> = root
        .iter()
        .filter(|(_, p)| !p.document.is_root())
        .map(|(depth, p)| (depth, p.title()))
        .collect();
    assert_eq!(
        actual, expected,
        "tree shape mismatch.\n  actual:   {actual:?}\n  expected: {expected:?}"
    );
}
