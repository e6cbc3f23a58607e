//! Page tree construction.
//!
//! Stage 2 of the build pipeline. Arranges the flat document set from the scan
//! stage into a hierarchy using the `parent` and `grand_parent` titles each page
//! declares in its front matter:
//!
//! ```text
//! (root)                       title "", parent ""
//! └── Home                     parent ""
//!     ├── Guide                parent "Home"
//!     │   └── Install          parent "Guide", grand_parent "Home"
//!     └── Reference            parent "Home"
//!         └── Install          parent "Reference", grand_parent "Home"
//! ```
//!
//! A document attaches under the page whose title equals its `parent` and whose
//! own parent equals its `grand_parent`. The grandparent check lets two
//! branches both contain an "Install" page without ambiguity.
//!
//! ## Building
//!
//! Documents arrive in filesystem order, so a child is often seen before its
//! parent has been placed. [`build_tree`] therefore sweeps the pending set
//! repeatedly, attaching what it can each time. A sweep that attaches nothing
//! means the rest can never be placed, and the build fails with
//! [`TreeError::Unresolved`] naming each of them.
//!
//! Two pages sharing the same `(title, parent)` pair are only a problem when
//! some document targets that pair; that case fails up front with
//! [`TreeError::DuplicateTarget`].
//!
//! ## Ordering
//!
//! Siblings are sorted by `nav_order`, then title, then source path, so the
//! tree is identical whatever order the documents were scanned in.

use crate::types::Document;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("{} page(s) declare a parent that does not exist:\n{}", .0.len(), describe_unresolved(.0))]
    Unresolved(Vec<UnresolvedDocument>),
    #[error("ambiguous parent: {}", describe_duplicates(.0))]
    DuplicateTarget(Vec<DuplicateAnchor>),
}

/// A document that no page in the tree accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDocument {
    pub title: String,
    pub parent: String,
    pub grand_parent: String,
    pub path: PathBuf,
}

impl From<Document> for UnresolvedDocument {
    fn from(doc: Document) -> Self {
        Self {
            title: doc.title,
            parent: doc.parent,
            grand_parent: doc.grand_parent,
            path: doc.full_path,
        }
    }
}

/// A `(title, parent)` pair shared by several pages that other pages target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateAnchor {
    pub title: String,
    pub parent: String,
    /// Source files declaring the pair. An empty path is the synthetic root.
    pub paths: Vec<PathBuf>,
}

fn describe_unresolved(docs: &[UnresolvedDocument]) -> String {
    docs.iter()
        .map(|d| {
            format!(
                "  {:?} (parent {:?}, grand_parent {:?}) in {}",
                d.title,
                d.parent,
                d.grand_parent,
                d.path.display()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn describe_duplicates(anchors: &[DuplicateAnchor]) -> String {
    anchors
        .iter()
        .map(|a| {
            let paths: Vec<String> = a
                .paths
                .iter()
                .map(|p| {
                    if p.as_os_str().is_empty() {
                        "<root>".to_string()
                    } else {
                        p.display().to_string()
                    }
                })
                .collect();
            format!(
                "title {:?} with parent {:?} is declared by {}",
                a.title,
                a.parent,
                paths.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// A node in the page tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub document: Document,
    /// Sorted by [`sibling_key`].
    pub children: Vec<Page>,
}

fn sibling_key(doc: &Document) -> (i64, &str, &Path) {
    (doc.nav_order, &doc.title, &doc.full_path)
}

impl Page {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            children: Vec::new(),
        }
    }

    /// The root page wrapping the synthetic empty document.
    pub fn root() -> Self {
        Self::new(Document::root())
    }

    pub fn title(&self) -> &str {
        &self.document.title
    }

    /// Whether `doc` belongs directly under this page.
    pub fn accepts(&self, doc: &Document) -> bool {
        doc.parent == self.document.title && doc.grand_parent == self.document.parent
    }

    /// Attach `doc` under the first page, depth-first, that accepts it.
    ///
    /// Hands the document back when nothing in this subtree accepts it.
    pub fn insert(&mut self, doc: Document) -> Result<(), Document> {
        if self.accepts(&doc) {
            self.attach(doc);
            return Ok(());
        }
        let mut doc = doc;
        for child in &mut self.children {
            match child.insert(doc) {
                Ok(()) => return Ok(()),
                Err(back) => doc = back,
            }
        }
        Err(doc)
    }

    fn attach(&mut self, doc: Document) {
        let pos = self
            .children
            .partition_point(|c| sibling_key(&c.document) <= sibling_key(&doc));
        self.children.insert(pos, Page::new(doc));
    }

    /// Depth-first pre-order traversal yielding `(depth, page)`; the root is depth 0.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            stack: vec![(0, self)],
        }
    }

    /// Number of pages in this subtree, including this one.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// True when this page has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// First page in pre-order with the given title.
    pub fn find(&self, title: &str) -> Option<&Page> {
        self.iter().map(|(_, p)| p).find(|p| p.title() == title)
    }
}

/// Iterator returned by [`Page::iter`].
pub struct PreOrder<'a> {
    stack: Vec<(usize, &'a Page)>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (usize, &'a Page);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, page) = self.stack.pop()?;
        self.stack
            .extend(page.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, page))
    }
}

/// Build the page tree from a flat document set.
pub fn build_tree(documents: Vec<Document>) -> Result<Page, TreeError> {
    check_duplicate_targets(&documents)?;

    let mut root = Page::root();
    let mut pending = documents;
    let max_sweeps = pending.len();

    for sweep in 1..=max_sweeps {
        if pending.is_empty() {
            break;
        }
        let before = pending.len();
        let mut unattached = Vec::with_capacity(before);
        for doc in pending {
            if let Err(doc) = root.insert(doc) {
                unattached.push(doc);
            }
        }
        pending = unattached;

        debug!(
            sweep,
            attached = before - pending.len(),
            pending = pending.len(),
            "tree sweep"
        );
        if pending.len() == before {
            break;
        }
    }

    if pending.is_empty() {
        Ok(root)
    } else {
        Err(TreeError::Unresolved(
            pending.into_iter().map(UnresolvedDocument::from).collect(),
        ))
    }
}

/// Reject `(title, parent)` anchors declared more than once when some document
/// would attach under them.
fn check_duplicate_targets(documents: &[Document]) -> Result<(), TreeError> {
    let root = Document::root();
    let mut anchors: BTreeMap<(&str, &str), Vec<&Path>> = BTreeMap::new();
    for doc in std::iter::once(&root).chain(documents) {
        anchors
            .entry(doc.anchor_key())
            .or_default()
            .push(&doc.full_path);
    }

    let targets: HashSet<(&str, &str)> = documents.iter().map(Document::target_key).collect();

    let duplicates: Vec<DuplicateAnchor> = anchors
        .into_iter()
        .filter(|(key, paths)| paths.len() > 1 && targets.contains(key))
        .map(|((title, parent), mut paths)| {
            paths.sort();
            DuplicateAnchor {
                title: title.to_string(),
                parent: parent.to_string(),
                paths: paths.into_iter().map(Path::to_path_buf).collect(),
            }
        })
        .collect();

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(TreeError::DuplicateTarget(duplicates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn chain() -> Vec<Document> {
        vec![
            doc("Home", "", "", 0),
            doc("Guide", "Home", "", 1),
            doc("Install", "Guide", "Home", 1),
        ]
    }

    #[test]
    fn builds_three_level_chain() {
        let root = build_tree(chain()).unwrap();
        assert_tree_shape(&root, &[(1, "Home"), (2, "Guide"), (3, "Install")]);
    }

    #[test]
    fn preorder_visits_chain_in_order() {
        let root = build_tree(chain()).unwrap();
        let visited: Vec<&str> = root.iter().skip(1).map(|(_, p)| p.title()).collect();
        assert_eq!(visited, vec!["Home", "Guide", "Install"]);
    }

    #[test]
    fn children_before_parents_still_attach() {
        let mut docs = chain();
        docs.reverse();
        let root = build_tree(docs).unwrap();
        assert_tree_shape(&root, &[(1, "Home"), (2, "Guide"), (3, "Install")]);
    }

    #[test]
    fn siblings_sorted_by_nav_order() {
        let docs = vec![
            doc("Home", "", "", 0),
            doc("Third", "Home", "", 3),
            doc("First", "Home", "", 1),
            doc("Second", "Home", "", 2),
        ];
        let root = build_tree(docs).unwrap();
        let home = root.find("Home").unwrap();
        assert_eq!(child_titles(home), vec!["First", "Second", "Third"]);
        let orders: Vec<i64> = home.children.iter().map(|c| c.document.nav_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn equal_nav_order_broken_by_title() {
        let docs = vec![
            doc("Home", "", "", 0),
            doc("Beta", "Home", "", 1),
            doc("Alpha", "Home", "", 1),
        ];
        let root = build_tree(docs).unwrap();
        assert_eq!(child_titles(root.find("Home").unwrap()), vec!["Alpha", "Beta"]);
    }

    #[test]
    fn build_independent_of_input_order() {
        let docs = vec![
            doc("Home", "", "", 0),
            doc("B", "Home", "", 2),
            doc("A", "Home", "", 1),
            doc("A1", "A", "Home", 0),
            doc("B1", "B", "Home", 5),
            doc("B0", "B", "Home", 5),
        ];
        let mut reversed = docs.clone();
        reversed.reverse();
        assert_eq!(build_tree(docs).unwrap(), build_tree(reversed).unwrap());
    }

    #[test]
    fn grand_parent_disambiguates_same_titled_parents() {
        let docs = vec![
            doc("Home", "", "", 0),
            doc("Guide", "Home", "", 1),
            doc("Reference", "Home", "", 2),
            doc("Install", "Guide", "Home", 1),
            doc("Install", "Reference", "Home", 1),
            doc("Linux", "Install", "Reference", 1),
        ];
        let root = build_tree(docs).unwrap();

        let guide = root.find("Guide").unwrap();
        assert!(guide.children[0].children.is_empty());

        let reference = root.find("Reference").unwrap();
        assert_eq!(child_titles(&reference.children[0]), vec!["Linux"]);
    }

    #[test]
    fn unresolved_parent_is_reported() {
        let mut ghost = doc("Haunted", "Ghost", "", 1);
        ghost.full_path = PathBuf::from("/docs/haunted.md");
        let docs = vec![doc("Home", "", "", 0), ghost];

        let err = build_tree(docs).unwrap_err();
        match &err {
            TreeError::Unresolved(docs) => {
                assert_eq!(docs.len(), 1);
                assert_eq!(docs[0].title, "Haunted");
                assert_eq!(docs[0].parent, "Ghost");
                assert_eq!(docs[0].path, PathBuf::from("/docs/haunted.md"));
            }
            other => panic!("expected Unresolved, got {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains("Haunted"));
        assert!(message.contains("/docs/haunted.md"));
    }

    #[test]
    fn descendants_of_unresolved_are_reported_too() {
        let docs = vec![
            doc("Home", "", "", 0),
            doc("Orphan", "Missing", "", 1),
            doc("Grandchild", "Orphan", "Missing", 1),
        ];
        let TreeError::Unresolved(docs) = build_tree(docs).unwrap_err() else {
            panic!("expected Unresolved");
        };
        let titles: Vec<&str> = docs.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Orphan", "Grandchild"]);
    }

    #[test]
    fn wrong_grand_parent_is_unresolved() {
        let docs = vec![
            doc("Home", "", "", 0),
            doc("Guide", "Home", "", 1),
            doc("Install", "Guide", "Elsewhere", 1),
        ];
        assert!(matches!(build_tree(docs), Err(TreeError::Unresolved(_))));
    }

    #[test]
    fn duplicate_target_is_error() {
        let docs = vec![
            doc("Home", "", "", 0),
            doc("Guide", "Home", "", 1),
            doc("Guide", "Home", "", 2),
            doc("Install", "Guide", "Home", 1),
        ];
        match build_tree(docs) {
            Err(TreeError::DuplicateTarget(anchors)) => {
                assert_eq!(anchors.len(), 1);
                assert_eq!(anchors[0].title, "Guide");
                assert_eq!(anchors[0].parent, "Home");
                assert_eq!(anchors[0].paths.len(), 2);
            }
            other => panic!("expected DuplicateTarget, got {other:?}"),
        }
    }

    #[test]
    fn untargeted_duplicates_are_fine() {
        let docs = vec![
            doc("Home", "", "", 0),
            doc("FAQ", "Home", "", 1),
            doc("FAQ", "Home", "", 2),
        ];
        let root = build_tree(docs).unwrap();
        assert_eq!(child_titles(root.find("Home").unwrap()), vec!["FAQ", "FAQ"]);
    }

    #[test]
    fn empty_input_builds_bare_root() {
        let root = build_tree(Vec::new()).unwrap();
        assert!(root.document.is_root());
        assert!(root.is_empty());
        assert_eq!(root.len(), 1);
    }

    #[test]
    fn insert_hands_back_unmatched_document() {
        let mut root = Page::root();
        let stray = doc("Stray", "Nowhere", "", 0);
        let back = root.insert(stray.clone()).unwrap_err();
        assert_eq!(back, stray);
        assert!(root.children.is_empty());
    }
}
