//! Front matter extraction and validation.
//!
//! Documents may open with a `---` fenced header of `key: value` lines:
//!
//! ```text
//! ---
//! created_at: 2024-01-15
//! last_updated_at: 2024-03-02
//! author: ana
//! has_custom_tsx: false
//! ---
//! # Title
//! ```
//!
//! The header is split off before compilation; the body starts right after
//! the closing marker. A document without a header compiles with an empty
//! attribute set and fails validation, since four attributes are required on
//! every page.
//!
//! ## Parsing rules
//!
//! Each header line is split at its first `:`; key and value are trimmed.
//! Lines without a colon are ignored. An attribute that is present but empty
//! counts as missing.

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Attributes every document must carry.
pub const REQUIRED_KEYS: [&str; 4] = ["created_at", "last_updated_at", "author", "has_custom_tsx"];

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("missing required front matter attributes in {path}: {}", keys.join(", "))]
    MissingAttributes { path: String, keys: Vec<String> },
}

/// Parsed front matter attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    attrs: BTreeMap<String, String>,
}

impl FrontMatter {
    /// Look up an attribute. Returns `None` when absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Attribute value, treating empty strings as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Optional title override for the navigation entry.
    pub fn title(&self) -> Option<&str> {
        self.get_non_empty("title")
    }

    /// True only when `has_custom_tsx` is exactly `"true"`.
    pub fn has_override(&self) -> bool {
        self.get("has_custom_tsx") == Some("true")
    }
}

/// Split a document into front matter and body.
///
/// The opening `---` must be the first thing in the document and sit alone on
/// its line; the closing `---` must start a line. When no well-formed header
/// is found the whole input is the body.
pub fn extract(content: &str) -> (FrontMatter, &str) {
    let Some(rest) = content.strip_prefix("---") else {
        return (FrontMatter::default(), content);
    };
    let Some(line_end) = rest.find('\n') else {
        return (FrontMatter::default(), content);
    };
    if !rest[..line_end].trim().is_empty() {
        return (FrontMatter::default(), content);
    }
    let header_start = line_end + 1;
    // Closing marker: the first "---" sitting at a line start. The newline
    // before it must come from a header line, so the search starts at the
    // header itself, which rules out `---` immediately after the opener.
    let close = rest[header_start..]
        .find("\n---")
        .map(|i| header_start + i);
    let Some(close) = close else {
        return (FrontMatter::default(), content);
    };
    let header = &rest[header_start..close];
    let body = &rest[close + "\n---".len()..];
    (parse_header(header), body)
}

fn parse_header(header: &str) -> FrontMatter {
    let mut attrs = BTreeMap::new();
    for line in header.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        attrs.insert(key.to_string(), value.trim().to_string());
    }
    FrontMatter { attrs }
}

/// Check that all [`REQUIRED_KEYS`] are present and non-empty.
pub fn validate(front: &FrontMatter, path: &Path) -> Result<(), FrontMatterError> {
    let missing: Vec<String> = REQUIRED_KEYS
        .iter()
        .filter(|key| front.get_non_empty(key).is_none())
        .map(|key| key.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(FrontMatterError::MissingAttributes {
            path: path.display().to_string(),
            keys: missing,
        })
    }
}
