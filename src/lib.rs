//! # mdlatex
//!
//! Builds one LaTeX document from a folder of Markdown pages. Each page
//! declares its position in a front-matter block (`title`, `parent`,
//! `grand_parent`, `nav_order`); the folder layout itself carries no meaning.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Scan      docs/       →  Manifest        (front matter → flat documents)
//! 2. Tree      Manifest    →  Page tree       (parent links → hierarchy)
//! 3. Generate  Page tree   →  output.tex      (depth-first, rewrite per page)
//! ```
//!
//! Scanning parses files in parallel; the tree and generate stages are strictly
//! sequential because sibling order and output order depend on them.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`frontmatter`] | Parses the `---` delimited block at the top of a page |
//! | [`scan`] | Stage 1: walks the source directory, produces the scan manifest |
//! | [`tree`] | Stage 2: bounded fixed-point build of the page tree |
//! | [`rewrite`] | Markdown → LaTeX pass pipeline applied to each page body |
//! | [`generate`] | Stage 3: writes every page in tree order to one file |
//! | [`config`] | `config.toml` loading, validation, and merging |
//! | [`types`] | The `Document` record shared between stages |
//! | [`output`] | CLI output formatting of stage results |
//!
//! # Design Decisions
//!
//! ## Fail Instead of Loop
//!
//! A page whose parent never appears cannot be placed. The tree stage sweeps
//! the pending documents at most once per document and stops as soon as a
//! sweep places nothing, returning every unplaced document by title and path.
//! Rewrite passes that repeat until their pattern stops matching are capped
//! the same way by `rewrite.max_iterations`.
//!
//! ## Ambiguity Is an Error
//!
//! Two pages with the same title under the same parent are allowed until some
//! other page names them as its parent. Then the build fails listing both
//! files rather than picking one.
//!
//! ## Regex Passes, Not a Markdown Parser
//!
//! The rewrite stage handles a known subset of Markdown with one regular
//! expression family per construct. Anything outside the subset passes through
//! as plain text. Fenced code is never rewritten.

pub mod config;
pub mod frontmatter;
pub mod generate;
pub mod output;
pub mod rewrite;
pub mod scan;
pub mod tree;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
