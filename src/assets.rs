//! Content-addressed asset store.
//!
//! Images and code snippets are stored under names derived from their bytes:
//!
//! ```text
//! <output>/velimage/<sha256-hex><ext>    images, extension lowercased
//! <output>/velcode/<sha256-hex>.txt     code snippet text
//! ```
//!
//! Identical bytes map to identical names, so duplicated assets collapse to a
//! single stored file no matter how many documents reference them. Each
//! canonical name is written at most once per build.
//!
//! ## Reference resolution
//!
//! Documents reference images by whatever path the author typed. Resolution
//! keys on the file name alone: the basename is percent-decoded and looked up
//! in the registration map. When two source images share a basename, the one
//! registered last wins. Unresolvable references pass through untouched.
//!
//! ## Failure policy
//!
//! Asset writes never abort a build. A failed image registration is reported
//! and the reference is left as written; a failed code write is reported and
//! the page keeps its (now dangling) snippet name.

use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config;
use crate::types::StoredAsset;

/// Stores hashed assets under an output root and answers reference lookups.
pub struct AssetStore {
    image_dir: PathBuf,
    code_dir: PathBuf,
    /// Source basename (decoded) to canonical stored name.
    by_basename: HashMap<String, String>,
    /// Canonical names already written this build.
    written_images: HashSet<String>,
    written_code: HashSet<String>,
    site_images: Vec<StoredAsset>,
}

impl AssetStore {
    pub fn new(output_root: &Path) -> Self {
        Self {
            image_dir: output_root.join(config::IMAGE_DIR),
            code_dir: output_root.join(config::CODE_DIR),
            by_basename: HashMap::new(),
            written_images: HashSet::new(),
            written_code: HashSet::new(),
            site_images: Vec::new(),
        }
    }

    /// Hash a source image, store it under its canonical name, and record the
    /// basename mapping. Returns the canonical name, or `None` when the file
    /// could not be read or written (the failure is reported on stderr).
    pub fn register_image(&mut self, source: &Path, root: &Path) -> Option<String> {
        match self.store_image(source, root) {
            Ok(name) => Some(name),
            Err(err) => {
                eprintln!("failed to store image {}: {err}", source.display());
                None
            }
        }
    }

    fn store_image(&mut self, source: &Path, root: &Path) -> io::Result<String> {
        let bytes = fs::read(source)?;
        let ext = source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        let name = format!("{:x}{ext}", Sha256::digest(&bytes));

        if !self.written_images.contains(&name) {
            fs::write(self.image_dir.join(&name), &bytes)?;
            self.written_images.insert(name.clone());
            let original = source.strip_prefix(root).unwrap_or(source);
            self.site_images.push(StoredAsset {
                original_path: original.to_string_lossy().replace('\\', "/"),
                hash_path: format!("{}/{name}", config::IMAGE_DIR),
            });
        }

        let basename = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.by_basename.insert(basename, name.clone());
        Ok(name)
    }

    /// Resolve an authored image reference against the registration map.
    ///
    /// The reference's basename is percent-decoded and looked up; a hit
    /// returns `(decoded basename, canonical stored name)`.
    pub fn resolve_reference(&self, reference: &str) -> Option<(String, String)> {
        let basename = reference
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(reference);
        let decoded = match urlencoding::decode(basename) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => basename.to_string(),
        };
        let canonical = self.by_basename.get(&decoded)?;
        Some((decoded, canonical.clone()))
    }

    /// Store a code snippet, returning its content hash. The snippet file is
    /// `<hash>.txt` under the code directory, written once per build.
    pub fn store_code(&mut self, text: &str) -> String {
        let hash = format!("{:x}", Sha256::digest(text.as_bytes()));
        if self.written_code.insert(hash.clone()) {
            let dest = self.code_dir.join(format!("{hash}.txt"));
            if let Err(err) = fs::write(&dest, text) {
                eprintln!("failed to write code snippet {}: {err}", dest.display());
            }
        }
        hash
    }

    /// All images stored this build, in registration order.
    pub fn site_images(&self) -> &[StoredAsset] {
        &self.site_images
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_at(root: &Path) -> AssetStore {
        fs::create_dir_all(root.join(config::IMAGE_DIR)).unwrap();
        fs::create_dir_all(root.join(config::CODE_DIR)).unwrap();
        AssetStore::new(root)
    }

    fn write_image(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn canonical_name_is_hash_plus_lower_ext() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let mut store = store_at(&out);
        let src = write_image(tmp.path(), "Photo.PNG", b"pixels");

        let name = store.register_image(&src, tmp.path()).unwrap();
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), 64 + 4);
        assert!(out.join(config::IMAGE_DIR).join(&name).exists());
    }

    #[test]
    fn identical_bytes_store_once() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let mut store = store_at(&out);
        let a = write_image(tmp.path(), "a/pic.png", b"same-bytes");
        let b = write_image(tmp.path(), "b/pic2.png", b"same-bytes");

        let name_a = store.register_image(&a, tmp.path()).unwrap();
        let name_b = store.register_image(&b, tmp.path()).unwrap();
        assert_eq!(name_a, name_b);
        assert_eq!(store.site_images().len(), 1);
        assert_eq!(store.site_images()[0].original_path, "a/pic.png");

        let stored: Vec<_> = fs::read_dir(out.join(config::IMAGE_DIR))
            .unwrap()
            .collect();
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn last_registration_wins_for_shared_basenames() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let mut store = store_at(&out);
        let first = write_image(tmp.path(), "a/logo.png", b"first");
        let second = write_image(tmp.path(), "b/logo.png", b"second");

        store.register_image(&first, tmp.path()).unwrap();
        let winner = store.register_image(&second, tmp.path()).unwrap();

        let (decoded, canonical) = store.resolve_reference("images/logo.png").unwrap();
        assert_eq!(decoded, "logo.png");
        assert_eq!(canonical, winner);
    }

    #[test]
    fn resolution_decodes_percent_escapes() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let mut store = store_at(&out);
        let src = write_image(tmp.path(), "my photo.png", b"pixels");
        store.register_image(&src, tmp.path()).unwrap();

        assert!(store.resolve_reference("./my%20photo.png").is_some());
        assert!(store.resolve_reference("my photo.png").is_some());
    }

    #[test]
    fn unknown_references_do_not_resolve() {
        let tmp = TempDir::new().unwrap();
        let store = store_at(&tmp.path().join("out"));
        assert!(store.resolve_reference("missing.png").is_none());
        assert!(store.resolve_reference("https://example.com/x.png").is_none());
    }

    #[test]
    fn unreadable_image_reports_and_returns_none() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_at(&tmp.path().join("out"));
        let missing = tmp.path().join("nope.png");
        assert_eq!(store.register_image(&missing, tmp.path()), None);
        assert!(store.site_images().is_empty());
    }

    #[test]
    fn code_snippets_are_stored_by_content_hash() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let mut store = store_at(&out);

        let h1 = store.store_code("let x = 1;");
        let h2 = store.store_code("let x = 1;");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);

        let dest = out.join(config::CODE_DIR).join(format!("{h1}.txt"));
        assert_eq!(fs::read_to_string(dest).unwrap(), "let x = 1;");
        let stored: Vec<_> = fs::read_dir(out.join(config::CODE_DIR)).unwrap().collect();
        assert_eq!(stored.len(), 1);
    }
}
