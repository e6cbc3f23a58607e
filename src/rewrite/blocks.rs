//! Multi-line constructs: lists, tables, headers and fenced code.

use super::{Pass, RewriteError, RewriteOptions, Segment, rewrite_until_stable, segments};
use crate::frontmatter::toggles_fence;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// An unindented bullet line followed by further bullet lines at any indent.
static LIST_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[-*+][ \t]+.*(?:\n[ \t]*[-*+][ \t]+.*)*").unwrap()
});

static TABLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\|.*(?:\n[ \t]*\|.*)*").unwrap());

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(#{1,4})[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$").unwrap()
});

/// `[text](url)` and `![alt](path)` inside a header title; headers run before links.
static TITLE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!?\[([^\]\n]*)\]\([^)\n]*\)").unwrap());

const TAB_WIDTH: usize = 4;

pub(super) fn unordered_lists(
    text: &str,
    options: &RewriteOptions,
) -> Result<String, RewriteError> {
    rewrite_until_stable(
        Pass::UnorderedLists,
        text,
        options.max_iterations,
        &LIST_BLOCK,
        |caps: &Captures| render_list(&caps[0]),
    )
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

fn render_list(block: &str) -> String {
    let mut out = String::new();
    let mut levels: Vec<usize> = Vec::new();

    for line in block.lines() {
        let indent = indent_width(line);
        let item = line.trim_start()[1..].trim();

        match levels.last() {
            Some(&current) if indent > current => {
                levels.push(indent);
                out.push_str("\\begin{itemize}\n");
            }
            Some(_) => {
                while levels.len() > 1 && levels.last().is_some_and(|&l| indent < l) {
                    levels.pop();
                    out.push_str("\\end{itemize}\n");
                }
            }
            None => {
                levels.push(indent);
                out.push_str("\\begin{itemize}\n");
            }
        }
        out.push_str("\\item ");
        out.push_str(item);
        out.push('\n');
    }

    for _ in &levels {
        out.push_str("\\end{itemize}\n");
    }
    out.pop();
    out
}

pub(super) fn tables(text: &str) -> String {
    TABLE_BLOCK
        .replace_all(text, |caps: &Captures| render_table(&caps[0]))
        .into_owned()
}

fn split_row(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

/// A row of only `|`, `:`, `-` and whitespace, with at least one dash.
fn is_alignment_row(line: &str) -> bool {
    line.contains('-')
        && line
            .chars()
            .all(|c| matches!(c, '|' | ':' | '-') || c.is_whitespace())
}

fn column_alignment(cell: &str) -> char {
    match (cell.starts_with(':'), cell.ends_with(':')) {
        (true, true) => 'c',
        (false, true) => 'r',
        _ => 'l',
    }
}

fn render_table(block: &str) -> String {
    let lines: Vec<&str> = block.lines().collect();
    let columns = lines
        .iter()
        .filter(|l| !is_alignment_row(l))
        .map(|l| split_row(l).len())
        .max()
        .unwrap_or(0);

    let mut alignment: Vec<char> = lines
        .iter()
        .find(|l| is_alignment_row(l))
        .map(|l| split_row(l).iter().map(|c| column_alignment(c)).collect())
        .unwrap_or_default();
    alignment.resize(columns, 'l');

    let spec: String = alignment.iter().map(|a| format!("|{a}")).collect();
    let mut out = format!("\\begin{{tabular}}{{{spec}|}}\n\\hline\n");
    for line in lines {
        if is_alignment_row(line) {
            out.push_str("\\hline\n");
            continue;
        }
        let mut cells = split_row(line);
        cells.resize(columns, String::new());
        out.push_str(&cells.join("&"));
        out.push_str("\\\\\n");
    }
    out.push_str("\\hline\n\\end{tabular}");
    out
}

pub(super) fn headers(text: &str) -> String {
    HEADER
        .replace_all(text, |caps: &Captures| {
            let command = match caps[1].len() {
                1 => "part",
                2 => "section",
                3 => "subsection",
                _ => "subsubsection",
            };
            let title = &caps[2];
            format!("\\{command}{{{title}}}\\label{{{}}}", header_label(title))
        })
        .into_owned()
}

/// Label for a header: links reduced to their text, spaces become
/// underscores, characters LaTeX treats specially in `\label` are dropped.
fn header_label(title: &str) -> String {
    TITLE_LINK
        .replace_all(title, "${1}")
        .chars()
        .filter(|c| !matches!(c, '\\' | '{' | '}' | '$' | '%' | '&' | '#' | '^' | '~'))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

pub(super) fn fenced_code(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in segments(text) {
        match segment {
            Segment::Prose(prose) => out.push_str(prose),
            Segment::Code(code) => {
                let mut lines = code.split_inclusive('\n');
                lines.next();
                let body: Vec<&str> = lines.collect();
                let closed = body
                    .last()
                    .is_some_and(|l| toggles_fence(1, l.trim_end_matches(['\n', '\r'])));
                let content = if closed {
                    &body[..body.len() - 1]
                } else {
                    &body[..]
                };
                out.push_str("\\begin{verbatim}\n");
                for line in content {
                    out.push_str(line);
                }
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str("\\end{verbatim}");
                if code.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
    }
    out
}
