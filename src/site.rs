//! Site building pipeline.
//!
//! Orchestrates a full build: clean the output root, register every image
//! under the input tree, traverse the content in display order, convert each
//! document, and serialize the manifest.
//!
//! ## Content layout
//!
//! ```text
//! docs/                        # input root
//! ├── vellum.toml              # optional config
//! ├── _01_guide/               # section folder: navigated and descended
//! │   ├── _1_intro.md
//! │   └── _2_setup.md
//! ├── drafts/                  # plain folder: images registered, no pages
//! ├── about.md                 # page at the root level
//! ├── about.tsx                # override for about.md (with has_custom_tsx)
//! └── logo.png                 # stored content-addressed
//! ```
//!
//! Only folders named `_0N…` become navigation sections; other directories
//! are left out of the traversal entirely. The image pre-pass walks the whole
//! tree regardless, so documents can reference images from any folder.
//!
//! ## Output layout
//!
//! ```text
//! dist/
//! ├── pages/{hash}/page.tsx    # one unit per document
//! ├── velimage/{hash}{ext}     # canonical images
//! ├── velcode/{hash}.txt       # canonical code blocks
//! └── site-manifest.json       # navigation forest + image list
//! ```
//!
//! ## Failure policy
//!
//! Converting one document can fail: bad front matter, a grammar error, a
//! missing override file. The failure is printed, recorded on the outcome,
//! and that document dropped; the rest of the build keeps going. Only
//! input- or output-level faults abort the whole run.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::assets::AssetStore;
use crate::compiler::{CompileError, Compiler};
use crate::config::{self, BuildConfig};
use crate::frontmatter::{self, FrontMatterError};
use crate::markup;
use crate::naming;
use crate::normalize::Normalizer;
use crate::template;
use crate::types::{CodeAsset, NavigationNode, NodeKind, SiteManifest};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Input path not found: {0}")]
    InputNotFound(PathBuf),
    #[error("Manifest serialization error: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Why a single document was dropped from the build.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    FrontMatter(#[from] FrontMatterError),
    #[error(transparent)]
    Grammar(#[from] CompileError),
    #[error("has_custom_tsx is true but the override file is missing: {0}")]
    MissingOverride(PathBuf),
    #[error("document body must start with a '# ' heading")]
    MissingLeadingHeading,
}

/// A dropped document, kept for the build report.
#[derive(Debug)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Everything a finished build produced.
#[derive(Debug)]
pub struct BuildOutcome {
    pub manifest: SiteManifest,
    pub failures: Vec<DocumentFailure>,
    pub output_root: PathBuf,
}

/// Run a full build of `input` (a directory or a single document) into
/// `output_root`.
pub fn build_site(
    input: &Path,
    output_root: &Path,
    config: BuildConfig,
) -> Result<BuildOutcome, BuildError> {
    let metadata =
        fs::metadata(input).map_err(|_| BuildError::InputNotFound(input.to_path_buf()))?;
    let input_root = if metadata.is_dir() {
        input.to_path_buf()
    } else {
        input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    };

    clean_output(output_root)?;

    let mut builder = SiteBuilder {
        input_root,
        output_root: output_root.to_path_buf(),
        config,
        store: AssetStore::new(output_root),
        consumed_overrides: HashSet::new(),
        failures: Vec::new(),
    };

    let navigation = if metadata.is_dir() {
        builder.register_images(input);
        builder.traverse(input)?
    } else {
        // A single document builds without the image pre-pass.
        let mut nodes = Vec::new();
        if let Some(node) = builder.process_file(input) {
            nodes.push(node);
        }
        nodes
    };

    let manifest = SiteManifest {
        navigation,
        images: builder.store.site_images().to_vec(),
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(output_root.join(config::MANIFEST_FILE), json)?;

    Ok(BuildOutcome {
        manifest,
        failures: builder.failures,
        output_root: output_root.to_path_buf(),
    })
}

struct SiteBuilder {
    input_root: PathBuf,
    output_root: PathBuf,
    config: BuildConfig,
    store: AssetStore,
    /// Override files claimed by a sibling document, by relative path.
    consumed_overrides: HashSet<String>,
    failures: Vec<DocumentFailure>,
}

impl SiteBuilder {
    // ==================== traversal ====================

    /// Register every image under the tree before any document compiles,
    /// so forward references resolve.
    fn register_images(&mut self, root: &Path) {
        for path in self.image_paths(root) {
            // Registration failures are reported by the store; the reference
            // will simply not resolve.
            let _ = self.store.register_image(&path, &self.input_root);
        }
    }

    fn image_paths(&self, root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| keep_entry(e, &self.config))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.config.is_image(e.path()))
            .map(|e| e.into_path())
            .collect()
    }

    fn traverse(&mut self, dir: &Path) -> Result<Vec<NavigationNode>, BuildError> {
        let mut nodes = Vec::new();
        for (name, path) in self.sorted_entries(dir)? {
            if path.is_dir() {
                if naming::is_section_dir(&name) {
                    let mut folder = NavigationNode::folder(naming::parse_entry_name(&name).name);
                    folder.children = self.traverse(&path)?;
                    nodes.push(folder);
                }
            } else if let Some(node) = self.process_file(&path) {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    fn sorted_entries(&self, dir: &Path) -> Result<Vec<(String, PathBuf)>, BuildError> {
        let mut entries: Vec<(String, PathBuf)> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| (e.file_name().to_string_lossy().into_owned(), e.path()))
            .filter(|(name, _)| !name.starts_with('.') && !self.config.is_excluded(name))
            .collect();
        entries.sort_by(|a, b| naming::sibling_order(&a.0, &b.0));
        Ok(entries)
    }

    // ==================== per-document conversion ====================

    /// Convert one file into a navigation node, or `None` when the file is
    /// not a document or its conversion failed.
    fn process_file(&mut self, path: &Path) -> Option<NavigationNode> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())?;
        match ext.as_str() {
            "md" | "mdx" => match self.convert_document(path) {
                Ok(node) => Some(node),
                Err(err) => {
                    self.record_failure(path, err);
                    None
                }
            },
            config::OVERRIDE_EXT => self.passthrough_override(path),
            _ => None,
        }
    }

    fn record_failure(&mut self, path: &Path, err: DocumentError) {
        eprintln!("failed to convert {}: {err}", path.display());
        self.failures.push(DocumentFailure {
            path: path.to_path_buf(),
            message: err.to_string(),
        });
    }

    fn convert_document(&mut self, path: &Path) -> Result<NavigationNode, DocumentError> {
        let raw = fs::read_to_string(path)?;
        let relative = self.relative_source(path);
        let hash = naming::path_hash(&relative);

        let (front, body) = frontmatter::extract(&raw);
        frontmatter::validate(&front, Path::new(&relative))?;

        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let title = front
            .title()
            .map(str::to_string)
            .unwrap_or_else(|| naming::display_title(file_name));

        if front.has_override() {
            let override_path = path.with_extension(config::OVERRIDE_EXT);
            if !override_path.exists() {
                return Err(DocumentError::MissingOverride(override_path));
            }
            let content = fs::read_to_string(&override_path)?;
            let output_path = self.write_page(&hash, &content)?;
            self.consumed_overrides
                .insert(self.relative_source(&override_path));
            return Ok(NavigationNode {
                title,
                kind: NodeKind::Page,
                path: format!("/{hash}"),
                hash,
                has_override: true,
                source_path: relative,
                output_path,
                code_assets: Vec::new(),
                image_assets: Vec::new(),
                children: Vec::new(),
            });
        }

        if !body.trim().starts_with("# ") {
            return Err(DocumentError::MissingLeadingHeading);
        }

        let compiled = Compiler::new(&mut self.store).compile(body)?;
        let (nodes, extra_usages) = Normalizer::new(&self.store).normalize(compiled.nodes, &front);

        let body_markup = markup::render_nodes(&nodes);
        let page = template::render_page(&body_markup, &self.edit_url(&hash));
        let output_path = self.write_page(&hash, &page)?;

        // A same-named override is claimed even when the flag is off, so it
        // never doubles as a standalone page.
        self.consumed_overrides
            .insert(self.relative_source(&path.with_extension(config::OVERRIDE_EXT)));

        let code_assets = compiled
            .code_assets
            .into_iter()
            .map(|name| CodeAsset {
                hash_path: format!("{}/{name}", config::CODE_DIR),
            })
            .collect();
        let mut image_assets = compiled.image_usages;
        image_assets.extend(extra_usages);

        Ok(NavigationNode {
            title,
            kind: NodeKind::Page,
            path: format!("/{hash}"),
            hash,
            has_override: false,
            source_path: relative,
            output_path,
            code_assets,
            image_assets,
            children: Vec::new(),
        })
    }

    /// A standalone override becomes a page of its own unless a document
    /// already claimed it.
    fn passthrough_override(&mut self, path: &Path) -> Option<NavigationNode> {
        let relative = self.relative_source(path);
        if self.consumed_overrides.contains(&relative) {
            return None;
        }
        match self.copy_override(path, relative) {
            Ok(node) => Some(node),
            Err(err) => {
                self.record_failure(path, err);
                None
            }
        }
    }

    fn copy_override(
        &mut self,
        path: &Path,
        relative: String,
    ) -> Result<NavigationNode, DocumentError> {
        let content = fs::read_to_string(path)?;
        let hash = naming::path_hash(&relative);
        let output_path = self.write_page(&hash, &content)?;
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        Ok(NavigationNode {
            title: naming::display_title(file_name),
            kind: NodeKind::Page,
            path: format!("/{hash}"),
            hash,
            has_override: true,
            source_path: String::new(),
            output_path,
            code_assets: Vec::new(),
            image_assets: Vec::new(),
            children: Vec::new(),
        })
    }

    // ==================== output ====================

    fn write_page(&self, hash: &str, content: &str) -> Result<String, std::io::Error> {
        let dir = self.output_root.join(config::PAGES_DIR).join(hash);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(config::PAGE_FILE), content)?;
        Ok(format!(
            "{}/{hash}/{}",
            config::PAGES_DIR,
            config::PAGE_FILE
        ))
    }

    fn relative_source(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.input_root).unwrap_or(path);
        rel.to_string_lossy().replace('\\', "/")
    }

    fn edit_url(&self, hash: &str) -> String {
        let base = self.config.edit_source_base_url.trim_end_matches('/');
        if base.is_empty() {
            return String::new();
        }
        format!("{base}/{}/{hash}", config::PAGES_DIR)
    }
}

fn keep_entry(entry: &walkdir::DirEntry, config: &BuildConfig) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    !name.starts_with('.') && !config.is_excluded(name)
}

/// Empty the pages, image, and code directories. The directories themselves
/// stay (they may be mount points); missing ones are created.
fn clean_output(output_root: &Path) -> Result<(), std::io::Error> {
    for dir in [config::PAGES_DIR, config::IMAGE_DIR, config::CODE_DIR] {
        reset_directory(&output_root.join(dir))?;
    }
    Ok(())
}

fn reset_directory(dir: &Path) -> Result<(), std::io::Error> {
    if dir.exists() {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
    } else {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}
