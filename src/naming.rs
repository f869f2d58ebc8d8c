//! Centralized filename parsing for the `_N_name` convention.
//!
//! Content entries (documents and folders) share one naming pattern: an
//! optional order prefix (`_N_`) followed by the real name. This module owns
//! prefix parsing, display titles, sibling ordering, and the stable per-path
//! identifier, so the traversal and manifest layers never reimplement them.
//!
//! ## Display Titles
//!
//! The order prefix and a trailing extension are stripped for display, the
//! rest is kept verbatim:
//! - `_1_Getting-Started.md` → "Getting-Started"
//! - `_02_Guides/` → "Guides"
//! - `notes.md` → "notes"
//!
//! ## Section Folders
//!
//! Only folders whose prefix number starts with `0` (`_01_Api`, `_02_Guides`)
//! are treated as sections and descended into. Other folders are ignored by
//! the traversal, which lets content live next to scratch directories.
//!
//! ## Path Identity
//!
//! Every page gets a stable identifier derived from its root-relative source
//! path: the first 8 hex characters of the path's SHA-256. Renaming or moving
//! a document changes its identity; editing its contents does not.

use sha2::{Digest, Sha256};
use std::cmp::Ordering;

/// Result of parsing an entry name like `_20_release-notes`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Order prefix if present (e.g., `20` from `_20_release-notes`)
    pub order: Option<u64>,
    /// Name part after `_N_`. For unprefixed entries, this is the full input.
    pub name: String,
}

/// Parse an entry name following the `_N_name` convention.
///
/// Handles these patterns:
/// - `"_1_intro"` → order=Some(1), name="intro"
/// - `"_02_Guides"` → order=Some(2), name="Guides"
/// - `"_10_"` → order=Some(10), name=""
/// - `"_10"` → order=None, name="_10" (no closing underscore)
/// - `"notes"` → order=None, name="notes"
pub fn parse_entry_name(name: &str) -> ParsedName {
    if let Some((order, rest)) = split_order_prefix(name) {
        return ParsedName {
            order: Some(order),
            name: rest.to_string(),
        };
    }
    ParsedName {
        order: None,
        name: name.to_string(),
    }
}

/// Split off an `_N_` prefix, returning the number and the remainder.
fn split_order_prefix(name: &str) -> Option<(u64, &str)> {
    let digits = name.strip_prefix('_')?;
    let end = digits.find(|c: char| !c.is_ascii_digit())?;
    if end == 0 || digits.as_bytes()[end] != b'_' {
        return None;
    }
    let order = digits[..end].parse::<u64>().ok()?;
    Some((order, &digits[end + 1..]))
}

/// True for folder names that mark a section: `_0` followed by a digit.
///
/// `_01_Api` and `_02_Guides` are sections; `_1_drafts` and `assets` are not.
pub fn is_section_dir(name: &str) -> bool {
    let b = name.as_bytes();
    b.len() >= 3 && b[0] == b'_' && b[1] == b'0' && b[2].is_ascii_digit()
}

/// Human-facing title for an entry: extension and order prefix stripped.
pub fn display_title(file_name: &str) -> String {
    let stem = strip_extension(file_name);
    parse_entry_name(stem).name
}

/// Drop the last dot-extension. A leading dot is part of the name, not an
/// extension marker.
fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Ordering for sibling entries.
///
/// When both names carry an `_N_` prefix they sort by the prefix number.
/// Everything else falls back to [`natural_cmp`], so `item2` sorts before
/// `item10` and case differences do not scatter related files.
pub fn sibling_order(a: &str, b: &str) -> Ordering {
    match (split_order_prefix(a), split_order_prefix(b)) {
        (Some((na, _)), Some((nb, _))) => na.cmp(&nb).then_with(|| natural_cmp(a, b)),
        _ => natural_cmp(a, b),
    }
}

/// Case-insensitive comparison that treats digit runs as numbers.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ca = a.chars().peekable();
    let mut cb = b.chars().peekable();
    loop {
        match (ca.peek().copied(), cb.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let run_a = take_digit_run(&mut ca);
                let run_b = take_digit_run(&mut cb);
                let ord = cmp_digit_runs(&run_a, &run_b);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x
                    .to_lowercase()
                    .cmp(y.to_lowercase())
                    .then_with(|| x.cmp(&y));
                if ord != Ordering::Equal {
                    return ord;
                }
                ca.next();
                cb.next();
            }
        }
    }
}

fn take_digit_run(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

/// Compare digit runs numerically. Leading zeros do not change the value,
/// but fewer zeros sort first so the ordering stays total.
fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let sa = a.trim_start_matches('0');
    let sb = b.trim_start_matches('0');
    sa.len()
        .cmp(&sb.len())
        .then_with(|| sa.cmp(sb))
        .then_with(|| a.len().cmp(&b.len()))
}

/// Stable identifier for a root-relative source path: the first 8 hex
/// characters of its SHA-256. Separators are normalized to `/` first so the
/// identifier matches across platforms.
pub fn path_hash(relative_path: &str) -> String {
    let normalized = relative_path.replace('\\', "/");
    let digest = Sha256::digest(normalized.as_bytes());
    let hex = format!("{:x}", digest);
    hex[..8].to_string()
}
