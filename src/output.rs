//! CLI output formatting for the build report.
//!
//! # Information-First Display
//!
//! The report is **information-centric, not file-centric**. Every page leads
//! with its positional index and title; the generated unit path follows after
//! an arrow. Sections mirror the navigation tree so the report doubles as a
//! content inventory.
//!
//! # Output Format
//!
//! ```text
//! Pages
//! 001 guide
//!     001 intro → pages/7d9f1c0a/page.tsx
//!     002 setup → pages/00f3b2e1/page.tsx
//! 002 about (custom) → pages/5a71d4c9/page.tsx
//!
//! Assets
//!     3 images, 2 code snippets
//!
//! Failures
//!     docs/bad.md: missing required front matter attributes in bad.md: author
//!
//! Built 3 pages, 3 images, 2 code snippets, 1 failed
//! ```
//!
//! The `Failures` section appears only when documents were dropped; each
//! failure was already printed to stderr as it happened, the report just
//! totals them up.
//!
//! # Architecture
//!
//! The stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure —
//! no I/O, no side effects.

use std::collections::HashSet;

use crate::site::BuildOutcome;
use crate::types::{NavigationNode, NodeKind};

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

// ============================================================================
// Tree walker
// ============================================================================

/// A flattened row from walking the navigation tree.
struct TreeRow<'a> {
    depth: usize,
    position: usize,
    node: &'a NavigationNode,
}

/// Walk the navigation tree, assigning positional indices per sibling level.
/// Returns a flat list of rows with depth and position for formatting.
fn walk_navigation(nodes: &[NavigationNode]) -> Vec<TreeRow<'_>> {
    let mut rows = Vec::new();
    walk_navigation_recursive(nodes, 0, &mut rows);
    rows
}

fn walk_navigation_recursive<'a>(
    nodes: &'a [NavigationNode],
    depth: usize,
    rows: &mut Vec<TreeRow<'a>>,
) {
    for (i, node) in nodes.iter().enumerate() {
        rows.push(TreeRow {
            depth,
            position: i + 1,
            node,
        });
        walk_navigation_recursive(&node.children, depth + 1, rows);
    }
}

// ============================================================================
// Build report
// ============================================================================

/// Format the report for a finished build.
///
/// Folders show bare headers; pages show `→` and their generated unit path,
/// with `(custom)` marking pages whose body came from an override file.
pub fn format_build_output(outcome: &BuildOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    let rows = walk_navigation(&outcome.manifest.navigation);

    lines.push("Pages".to_string());
    let mut page_count = 0;
    let mut code_names: HashSet<&str> = HashSet::new();
    for row in &rows {
        let base_indent = indent(row.depth);
        let header = format!("{} {}", format_index(row.position), row.node.title);
        match row.node.kind {
            NodeKind::Folder => lines.push(format!("{base_indent}{header}")),
            NodeKind::Page => {
                page_count += 1;
                let marker = if row.node.has_override { " (custom)" } else { "" };
                lines.push(format!(
                    "{base_indent}{header}{marker} \u{2192} {}",
                    row.node.output_path
                ));
                for asset in &row.node.code_assets {
                    code_names.insert(asset.hash_path.as_str());
                }
            }
        }
    }

    lines.push(String::new());
    lines.push("Assets".to_string());
    lines.push(format!(
        "    {} images, {} code snippets",
        outcome.manifest.images.len(),
        code_names.len()
    ));

    if !outcome.failures.is_empty() {
        lines.push(String::new());
        lines.push("Failures".to_string());
        for failure in &outcome.failures {
            lines.push(format!(
                "    {}: {}",
                failure.path.display(),
                failure.message
            ));
        }
    }

    lines.push(String::new());
    let mut summary = format!(
        "Built {} pages, {} images, {} code snippets",
        page_count,
        outcome.manifest.images.len(),
        code_names.len()
    );
    if !outcome.failures.is_empty() {
        summary.push_str(&format!(", {} failed", outcome.failures.len()));
    }
    lines.push(summary);

    lines
}

/// Print the build report to stdout.
pub fn print_build_output(outcome: &BuildOutcome) {
    for line in format_build_output(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
