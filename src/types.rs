//! Manifest types shared between the site builder and its consumers.
//!
//! These types serialize to `site-manifest.json`, the contract read by the
//! navigation and search UI. Field names on the wire are camelCase and every
//! field is always present, so consumers never need to probe for keys.

use serde::{Deserialize, Serialize};

/// What a navigation entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Page,
    Folder,
}

/// One stored code block, by its content-addressed output path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAsset {
    /// Path under the output root, `velcode/{hash}.txt`.
    pub hash_path: String,
}

/// One image reference resolved while compiling a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUsage {
    /// Basename the document referred to.
    pub original_name: String,
    /// Path under the output root, `velimage/{hash}{ext}`.
    pub hash_path: String,
}

/// One image stored during the pre-pass, for the manifest's global list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAsset {
    /// Source path relative to the content root, `/`-separated.
    pub original_path: String,
    /// Path under the output root, `velimage/{hash}{ext}`.
    pub hash_path: String,
}

/// An entry in the navigation forest.
///
/// Page nodes carry their identity hash and asset lists; folder nodes carry
/// only a title and children, with the remaining fields empty. Sibling order
/// is fixed when a node is pushed and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationNode {
    /// Display title (front matter override or cleaned file name).
    pub title: String,
    /// Whether the entry is a page or a section folder.
    pub kind: NodeKind,
    /// Web path `/{hash}`, empty for folders.
    pub path: String,
    /// Path-hash identity, empty for folders.
    pub hash: String,
    /// True when the page body came from a hand-written override.
    pub has_override: bool,
    /// Source path relative to the content root, empty for folders and
    /// standalone overrides.
    pub source_path: String,
    /// Generated page unit path under the output root, empty for folders.
    pub output_path: String,
    /// Code blocks stored while compiling this page.
    pub code_assets: Vec<CodeAsset>,
    /// Images resolved while compiling this page.
    pub image_assets: Vec<ImageUsage>,
    /// Child entries in display order.
    pub children: Vec<NavigationNode>,
}

impl NavigationNode {
    /// A section folder entry; children are filled in while its directory
    /// is traversed.
    pub fn folder(title: String) -> Self {
        Self {
            title,
            kind: NodeKind::Folder,
            path: String::new(),
            hash: String::new(),
            has_override: false,
            source_path: String::new(),
            output_path: String::new(),
            code_assets: Vec::new(),
            image_assets: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// The whole manifest: navigation forest plus the deduplicated list of every
/// stored image. Rebuilt from scratch on every invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteManifest {
    pub navigation: Vec<NavigationNode>,
    pub images: Vec<StoredAsset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&NodeKind::Page).unwrap(), "\"page\"");
        assert_eq!(
            serde_json::to_string(&NodeKind::Folder).unwrap(),
            "\"folder\""
        );
    }

    #[test]
    fn folder_node_serializes_every_field() {
        let node = NavigationNode::folder("Guides".into());
        let json = serde_json::to_value(&node).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "title",
            "kind",
            "path",
            "hash",
            "hasOverride",
            "sourcePath",
            "outputPath",
            "codeAssets",
            "imageAssets",
            "children",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(json["kind"], "folder");
        assert_eq!(json["path"], "");
        assert_eq!(json["children"], serde_json::json!([]));
    }

    #[test]
    fn asset_fields_are_camel_case() {
        let usage = ImageUsage {
            original_name: "logo.png".into(),
            hash_path: "velimage/abc.png".into(),
        };
        let json = serde_json::to_string(&usage).unwrap();
        assert!(json.contains("\"originalName\""));
        assert!(json.contains("\"hashPath\""));

        let stored = StoredAsset {
            original_path: "docs/logo.png".into(),
            hash_path: "velimage/abc.png".into(),
        };
        let json = serde_json::to_string(&stored).unwrap();
        assert!(json.contains("\"originalPath\""));

        let code = CodeAsset {
            hash_path: "velcode/def.txt".into(),
        };
        assert_eq!(
            serde_json::to_string(&code).unwrap(),
            "{\"hashPath\":\"velcode/def.txt\"}"
        );
    }

    #[test]
    fn manifest_round_trips() {
        let manifest = SiteManifest {
            navigation: vec![NavigationNode::folder("Top".into())],
            images: vec![StoredAsset {
                original_path: "a.png".into(),
                hash_path: "velimage/ff.png".into(),
            }],
        };
        let json = serde_json::to_string_pretty(&manifest).unwrap();
        let back: SiteManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }
}
