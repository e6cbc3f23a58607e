//! End-to-end tests: scan a source tree, build the page tree, write LaTeX.
//!
//! Uses the `fixtures/docs` site plus small ad-hoc trees written to temp
//! directories. The last tests drive the compiled `mdlatex` binary.

use mdlatex::config::{self, BuildConfig};
use mdlatex::generate::{self, GenerateError};
use mdlatex::rewrite::{Pipeline, RewriteOptions};
use mdlatex::scan::{self, SkipReason};
use mdlatex::tree::{self, TreeError};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    copy_dir(
        &Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/docs"),
        tmp.path(),
    );
    tmp
}

fn copy_dir(src: &Path, dst: &Path) {
    for entry in fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        let target = dst.join(entry.file_name());
        if entry.path().is_dir() {
            fs::create_dir_all(&target).unwrap();
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Run every stage with the config found in `source`.
fn build(source: &Path, output: &Path) -> generate::GenerateReport {
    let config = config::load_config(source).unwrap();
    let manifest = scan::scan(source).unwrap();
    let root = tree::build_tree(manifest.documents).unwrap();
    let pipeline = Pipeline::new(RewriteOptions::from_build_config(&config));
    generate::generate(&root, output, &pipeline, &config.document).unwrap()
}

// =========================================================================
// Library pipeline
// =========================================================================

#[test]
fn fixture_site_builds_in_tree_order() {
    let src = fixtures();
    let out_dir = TempDir::new().unwrap();
    let output = out_dir.path().join("manual.tex");

    let report = build(src.path(), &output);

    let visited: Vec<(usize, &str)> = report
        .pages
        .iter()
        .map(|p| (p.depth, p.title.as_str()))
        .collect();
    assert_eq!(
        visited,
        vec![
            (1, "Home"),
            (2, "Guide"),
            (3, "Install"),
            (3, "Configure"),
            (2, "Reference"),
            (3, "Install"),
        ]
    );
    assert!(report.pages[2].path.ends_with("guide/install.md"));
    assert!(report.pages[5].path.ends_with("reference/install.md"));
}

#[test]
fn fixture_site_converts_markdown() {
    let src = fixtures();
    let out_dir = TempDir::new().unwrap();
    let output = out_dir.path().join("manual.tex");
    build(src.path(), &output);

    let tex = fs::read_to_string(&output).unwrap();

    // Front matter never reaches the output
    assert!(!tex.contains("nav_order"));
    assert!(!tex.contains("grand_parent"));

    assert!(tex.contains("\\part{Operator Manual}\\label{Operator_Manual}"));
    assert!(tex.contains("\\textbf{operator manual}"));
    assert!(tex.contains("\\textit{Guide}"));
    assert!(tex.contains("\\noindent\\rule{\\textwidth}{0.4pt}"));

    assert!(tex.contains("\\item Unpack the archive"));
    assert_eq!(tex.matches("\\begin{itemize}").count(), 2);

    assert!(tex.contains("\\begin{verbatim}\n# not a header\n"));
    assert!(!tex.contains("\\part{not a header}"));

    assert!(tex.contains("\\begin{tabular}{|l|c|r|}"));
    assert!(tex.contains("rate&100&Sample rate\\\\"));

    assert!(tex.contains(
        "\\href{https://example.com/notes_v2}{vendor notes}\\footnote{https://example.com/notes\\_v2}"
    ));
    assert!(!tex.contains("{:target="));

    assert!(tex.contains("/guide/img/wiring.png}"));
    assert!(tex.contains("/guide/img/panel.png}"));
    assert!(tex.contains("\\caption{Front panel}"));
    assert!(tex.contains("\\textbf{--prefix}"));
}

#[test]
fn fixture_site_skips_non_pages() {
    let src = fixtures();
    let manifest = scan::scan(src.path()).unwrap();

    let reasons: Vec<(String, SkipReason)> = manifest
        .skipped
        .iter()
        .map(|s| {
            (
                s.path.file_name().unwrap().to_string_lossy().into_owned(),
                s.reason.clone(),
            )
        })
        .collect();
    assert!(reasons.contains(&("notes.md".to_string(), SkipReason::NoFrontMatter)));
    assert!(reasons.contains(&("wip.md".to_string(), SkipReason::NoTitle)));
}

#[test]
fn config_file_changes_output() {
    let src = fixtures();
    write(
        src.path(),
        "config.toml",
        r#"
[figures]
png_images = false
width = "5cm"

[document]
standalone = true
source_comments = false
"#,
    );
    let out_dir = TempDir::new().unwrap();
    let output = out_dir.path().join("manual.tex");
    build(src.path(), &output);

    let tex = fs::read_to_string(&output).unwrap();
    assert!(tex.starts_with("\\documentclass{report}\n"));
    assert!(tex.trim_end().ends_with("\\end{document}"));
    assert!(!tex.contains("% source:"));
    assert!(tex.contains("[width=5cm]"));
    assert!(tex.contains("/guide/img/wiring.svg}"));
}

#[test]
fn unresolved_parent_fails_without_hanging() {
    let src = TempDir::new().unwrap();
    write(src.path(), "index.md", "---\ntitle: Home\n---\n");
    write(
        src.path(),
        "lost.md",
        "---\ntitle: Lost\nparent: Ghost\n---\nBody\n",
    );

    let manifest = scan::scan(src.path()).unwrap();
    let err = tree::build_tree(manifest.documents).unwrap_err();
    let TreeError::Unresolved(docs) = &err else {
        panic!("expected Unresolved, got {err:?}");
    };
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].title, "Lost");
    assert!(docs[0].path.ends_with("lost.md"));
    assert!(err.to_string().contains("Ghost"));
}

#[test]
fn unreadable_output_location_is_fatal() {
    let src = fixtures();
    let manifest = scan::scan(src.path()).unwrap();
    let root = tree::build_tree(manifest.documents).unwrap();
    let config = BuildConfig::default();

    let result = generate::generate(
        &root,
        &src.path().join("no/such/dir/out.tex"),
        &Pipeline::default(),
        &config.document,
    );
    assert!(matches!(result, Err(GenerateError::Output { .. })));
}

// =========================================================================
// Binary
// =========================================================================

fn mdlatex(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_mdlatex"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn cli_build_writes_output() {
    let src = fixtures();
    let out_dir = TempDir::new().unwrap();
    let output = out_dir.path().join("manual.tex");

    let result = mdlatex(&[
        "--source",
        src.path().to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "build",
    ]);
    assert!(
        result.status.success(),
        "build failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("Wrote 6 pages"));
    assert!(output.exists());
}

#[test]
fn cli_check_reports_unresolved_parent() {
    let src = TempDir::new().unwrap();
    write(src.path(), "lost.md", "---\ntitle: Lost\nparent: Ghost\n---\n");

    let result = mdlatex(&["--source", src.path().to_str().unwrap(), "check"]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("Lost"));
}

#[test]
fn cli_gen_config_round_trips() {
    let result = mdlatex(&["gen-config"]);
    assert!(result.status.success());
    let parsed: BuildConfig = toml::from_str(&String::from_utf8_lossy(&result.stdout)).unwrap();
    assert_eq!(parsed.rewrite.max_iterations, 64);
}
