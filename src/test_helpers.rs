//! Shared test utilities for the vellum test suite.
//!
//! Provides fixture-tree builders and navigation lookups that work with the
//! site-builder output (`SiteManifest`, `NavigationNode`).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_file(tmp.path(), "_01_guide/intro.md", &document("# Intro\n\nhello"));
//!
//! let outcome = build_site(tmp.path(), &tmp.path().join("dist"), BuildConfig::default()).unwrap();
//! assert_nav_shape(&outcome.manifest.navigation, &[("guide", &["intro"])]);
//! ```

use std::fs;
use std::path::Path;

use crate::types::NavigationNode;

// =========================================================================
// Fixture builders
// =========================================================================

/// A front matter header satisfying every required key.
pub fn front_matter() -> &'static str {
    "---\n\
     created_at: 2024-01-10\n\
     last_updated_at: 2024-02-20\n\
     author: test author\n\
     has_custom_tsx: false\n\
     ---\n"
}

/// A complete document: valid front matter followed by the given body.
pub fn document(body: &str) -> String {
    format!("{}{body}", front_matter())
}

/// Write a file under `root`, creating parent directories as needed.
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

// =========================================================================
// Navigation lookups — panics with a clear message on miss
// =========================================================================

/// Find a node by title anywhere in the forest. Panics if not found.
pub fn find_node<'a>(navigation: &'a [NavigationNode], title: &str) -> &'a NavigationNode {
    fn walk<'a>(nodes: &'a [NavigationNode], title: &str) -> Option<&'a NavigationNode> {
        for node in nodes {
            if node.title == title {
                return Some(node);
            }
            if let Some(found) = walk(&node.children, title) {
                return Some(found);
            }
        }
        None
    }
    walk(navigation, title).unwrap_or_else(|| {
        let titles = nav_titles(navigation);
        panic!("nav node '{title}' not found. Top-level: {titles:?}")
    })
}

/// Top-level navigation titles in order.
pub fn nav_titles(navigation: &[NavigationNode]) -> Vec<&str> {
    navigation.iter().map(|n| n.title.as_str()).collect()
}

/// Assert that the navigation forest matches an expected shape.
///
/// Each entry is `(title, children)`. Use `&[]` for leaf nodes.
///
/// ```rust
/// assert_nav_shape(&outcome.manifest.navigation, &[
///     ("guide", &["intro", "setup"]),
///     ("about", &[]),
/// ]);
/// ```
pub fn assert_nav_shape(navigation: &[NavigationNode], expected: &[(&str, &[&str])]) {
    let actual = nav_titles(navigation);
    let expected_titles: Vec<&str> = expected.iter().map(|(t, _)| *t).collect();
    assert_eq!(actual, expected_titles, "nav top-level titles mismatch");

    for (title, children) in expected {
        let node = find_node(navigation, title);
        let actual_children: Vec<&str> =
            node.children.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            actual_children,
            children.to_vec(),
            "nav children of '{title}' mismatch"
        );
    }
}
