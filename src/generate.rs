//! LaTeX document generation.
//!
//! Stage 3 of the build pipeline. Walks the page tree depth-first and writes
//! every page, converted by the rewrite [`Pipeline`], into one output file.
//!
//! ## Output Structure
//!
//! ```text
//! \documentclass{report}          ┐
//! \usepackage{graphicx}           │ only with document.standalone
//! \begin{document}                ┘
//! % source: docs/index.md         ← document.source_comments
//! \part{Home}\label{Home} ...
//!
//! % source: docs/guide/index.md
//! ...
//! \end{document}                  ← only with document.standalone
//! ```
//!
//! Pages appear in tree pre-order: a page, then its children in `nav_order`
//! order, then its next sibling. The synthetic root contributes no content.
//!
//! The output is opened once and written sequentially. It is truncated at the
//! start of a build unless `document.append` is set, in which case fragments
//! are added after whatever the file already holds.

use crate::config::DocumentConfig;
use crate::rewrite::{Pipeline, RewriteContext, RewriteError};
use crate::tree::Page;
use crate::types::Document;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("cannot write output {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read page {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("rewriting {path} failed: {source}")]
    Rewrite {
        path: PathBuf,
        #[source]
        source: RewriteError,
    },
}

/// Summary of a build, one entry per page in the order written.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateReport {
    pub pages: Vec<RenderedPage>,
}

impl GenerateReport {
    /// Total bytes of LaTeX written for page content.
    pub fn total_bytes(&self) -> usize {
        self.pages.iter().map(|p| p.bytes).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPage {
    pub title: String,
    pub path: PathBuf,
    /// Depth below the synthetic root; top-level pages are 1.
    pub depth: usize,
    /// Length of the converted fragment.
    pub bytes: usize,
}

/// Write every page under `root` to `output`.
pub fn generate(
    root: &Page,
    output: &Path,
    pipeline: &Pipeline,
    config: &DocumentConfig,
) -> Result<GenerateReport, GenerateError> {
    let output_err = |source: std::io::Error| GenerateError::Output {
        path: output.to_path_buf(),
        source,
    };

    let file = open_output(output, config.append).map_err(output_err)?;
    let mut writer = BufWriter::new(file);

    if config.standalone {
        write_preamble(&mut writer, config).map_err(output_err)?;
    }

    let mut report = GenerateReport::default();
    for (depth, page) in root.iter() {
        let doc = &page.document;
        if doc.is_root() {
            continue;
        }

        let fragment = render_page(doc, pipeline)?;

        if config.source_comments {
            writeln!(writer, "% source: {}", doc.full_path.display()).map_err(output_err)?;
        }
        writer.write_all(fragment.as_bytes()).map_err(output_err)?;
        writer.write_all(b"\n\n").map_err(output_err)?;

        debug!(title = %doc.title, depth, bytes = fragment.len(), "wrote page");
        report.pages.push(RenderedPage {
            title: doc.title.clone(),
            path: doc.full_path.clone(),
            depth,
            bytes: fragment.len(),
        });
    }

    if config.standalone {
        writeln!(writer, "\\end{{document}}").map_err(output_err)?;
    }
    writer.flush().map_err(output_err)?;

    info!(
        pages = report.pages.len(),
        output = %output.display(),
        "generated document"
    );
    Ok(report)
}

/// Convert every page without writing anything, for validating a source tree.
pub fn check(root: &Page, pipeline: &Pipeline) -> Result<GenerateReport, GenerateError> {
    let mut report = GenerateReport::default();
    for (depth, page) in root.iter() {
        let doc = &page.document;
        if doc.is_root() {
            continue;
        }
        let fragment = render_page(doc, pipeline)?;
        report.pages.push(RenderedPage {
            title: doc.title.clone(),
            path: doc.full_path.clone(),
            depth,
            bytes: fragment.len(),
        });
    }
    Ok(report)
}

fn render_page(doc: &Document, pipeline: &Pipeline) -> Result<String, GenerateError> {
    let body = fs::read_to_string(&doc.full_path).map_err(|source| GenerateError::Read {
        path: doc.full_path.clone(),
        source,
    })?;
    let context = RewriteContext {
        asset_dir: doc.source_dir().map(Path::to_path_buf),
    };
    pipeline
        .run(&body, &context)
        .map_err(|source| GenerateError::Rewrite {
            path: doc.full_path.clone(),
            source,
        })
}

fn open_output(path: &Path, append: bool) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options.open(path)
}

fn write_preamble(out: &mut impl Write, config: &DocumentConfig) -> std::io::Result<()> {
    writeln!(out, "\\documentclass{{{}}}", config.class)?;
    for package in &config.packages {
        writeln!(out, "\\usepackage{{{package}}}")?;
    }
    if let Some(title) = &config.title {
        writeln!(out, "\\title{{{title}}}")?;
    }
    writeln!(out, "\\begin{{document}}")?;
    if config.title.is_some() {
        writeln!(out, "\\maketitle")?;
    }
    writeln!(out)
}
