//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Dry run
//!
//! The planned entries as an indented tree. Folders end in `/`; explicit
//! titles and labels follow in quotes; image resolution overrides in
//! brackets.
//!
//! ```text
//! binder/
//!     intro.pdf
//!     reports/ "Annual Reports"
//!         chart.png "Q1 Chart" [300 dpi]
//!         q1.pdf
//!
//! 1 folder, 3 files
//! ```
//!
//! ## Outline
//!
//! ```text
//! binder → p.1
//!     intro → p.1
//!     Annual Reports → p.4
//!         Q1 Chart → p.4
//! ```
//!
//! ## Summary
//!
//! ```text
//! Skipped reports/broken.pdf: Cannot read PDF: ...
//! Bound 12 pages, 6 outline items → binder.pdf
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.

use crate::assemble::Outline;
use crate::compile::{CompileReport, Issue};
use crate::describe::{Entry, EntryKind};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Nesting depth of an entry from its root-relative path; the root is 0.
fn entry_depth(entry: &Entry) -> usize {
    if entry.relative.is_empty() {
        0
    } else {
        entry.relative.matches('/').count() + 1
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// One dry-run line for an entry.
///
/// ```text
/// reports/ "Annual Reports"
/// chart.png "Q1 Chart" [300 dpi]
/// ```
fn entry_line(entry: &Entry) -> String {
    let mut line = indent(entry_depth(entry));
    line.push_str(&file_name(&entry.path));
    if entry.is_folder() {
        line.push('/');
    }
    if let Some(label) = &entry.label {
        line.push_str(&format!(" \"{label}\""));
    }
    if let (EntryKind::Image, Some(dpi)) = (entry.kind, entry.resolution) {
        line.push_str(&format!(" [{dpi} dpi]"));
    }
    line
}

// ============================================================================
// Dry run
// ============================================================================

pub fn format_plan(entries: &[Entry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["Nothing to bind".to_string()];
    }
    let mut lines: Vec<String> = entries.iter().map(entry_line).collect();

    // The root is not counted as a folder of its own.
    let folders = entries.iter().filter(|e| e.is_folder()).count().saturating_sub(1);
    let files = entries.len() - folders - 1;
    lines.push(String::new());
    lines.push(format!("{}, {}", plural(folders, "folder"), plural(files, "file")));
    lines
}

pub fn print_plan(entries: &[Entry]) {
    for line in format_plan(entries) {
        println!("{}", line);
    }
}

// ============================================================================
// Outline
// ============================================================================

/// The outline as a tree; page numbers are 1-based for display.
pub fn format_outline(outline: &Outline) -> Vec<String> {
    outline
        .nodes()
        .iter()
        .enumerate()
        .map(|(index, node)| {
            format!(
                "{}{} → p.{}",
                indent(outline.depth(index)),
                node.title,
                node.target_page + 1
            )
        })
        .collect()
}

pub fn print_outline(outline: &Outline) {
    for line in format_outline(outline) {
        println!("{}", line);
    }
}

// ============================================================================
// Summary
// ============================================================================

fn issue_line(verb: &str, issue: &Issue, root: &Path) -> String {
    let shown = issue.path.strip_prefix(root).unwrap_or(&issue.path);
    format!("{} {}: {}", verb, shown.display(), issue.reason)
}

pub fn format_summary(report: &CompileReport) -> Vec<String> {
    let root = report
        .entries()
        .first()
        .map(|e| e.path.as_path())
        .unwrap_or(Path::new(""));

    let mut lines = Vec::new();
    for issue in &report.skipped {
        lines.push(issue_line("Skipped", issue, root));
    }
    for issue in &report.failed_outlines {
        lines.push(issue_line("No outline item for", issue, root));
    }
    lines.push(format!(
        "Bound {}, {} → {}",
        plural(report.total_pages(), "page"),
        plural(report.outline().len() - report.failed_outlines.len(), "outline item"),
        report.output.display()
    ));
    lines
}

pub fn print_summary(report: &CompileReport) {
    for line in format_summary(report) {
        println!("{}", line);
    }
}
