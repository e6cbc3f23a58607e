//! Shared types used across all pipeline stages.
//!
//! A [`Document`] is produced by the scan stage, owned by the tree during the
//! build, and read by the generate stage. It is serialized into the scan
//! manifest so `mdlatex scan --manifest` output can be inspected as JSON.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Front-matter metadata and source path for one Markdown page.
///
/// Only documents whose front matter explicitly sets `title` are ever
/// constructed by the parser; absence of a title is how non-content files are
/// filtered out of the build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Page title; also the key children name in their `parent` field.
    pub title: String,
    /// Title of the logical parent page. Empty for root-level pages.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent: String,
    /// Title of the logical grandparent page, used to tell apart parents that
    /// share a title in different branches.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub grand_parent: String,
    /// Sibling sort key.
    #[serde(default)]
    pub nav_order: i64,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default)]
    pub nav_exclude: bool,
    /// Source file. Empty only for the synthetic root.
    pub full_path: PathBuf,
}

impl Document {
    /// The synthetic document wrapped by the root page of every tree.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.full_path.as_os_str().is_empty()
    }

    /// `(parent, grand_parent)`: the anchor this document attaches under.
    pub fn target_key(&self) -> (&str, &str) {
        (&self.parent, &self.grand_parent)
    }

    /// `(title, parent)`: the anchor children of this document declare.
    pub fn anchor_key(&self) -> (&str, &str) {
        (&self.title, &self.parent)
    }

    /// Directory containing the source file, used to resolve relative assets.
    pub fn source_dir(&self) -> Option<&Path> {
        if self.is_root() {
            None
        } else {
            self.full_path.parent()
        }
    }
}
