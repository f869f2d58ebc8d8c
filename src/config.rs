//! Build configuration module.
//!
//! Handles loading and validating `vellum.toml`. Configuration is flat and
//! sparse: stock defaults cover everything, a config file overrides only the
//! keys it names.
//!
//! ## Config File Location
//!
//! Place `vellum.toml` in the content root, or one level above it (useful
//! when the content tree lives inside a larger project):
//!
//! ```text
//! project/
//! ├── vellum.toml          # Found when building project/docs
//! └── docs/
//!     ├── _01_guide/
//!     │   └── intro.md
//!     └── about.md
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output_root = "dist"                  # Where the compiled site is written
//! edit_source_base_url = ""             # Base URL for page edit links ("" = none)
//! excluded_dirs = [
//!     "node_modules", "dist", "build", "out", ".git", ".idea",
//! ]
//! image_extensions = [
//!     ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp",
//! ]
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! ## Fixed Layout Names
//!
//! The output layout itself is not configurable. Page units, image assets,
//! code assets, and the manifest always land under the same directory names,
//! exposed here as constants so the writer and the tests agree on them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file name, looked up in the content root and its parent.
pub const CONFIG_FILE: &str = "vellum.toml";

/// Directory for page units under the output root.
pub const PAGES_DIR: &str = "pages";
/// Directory for content-addressed image assets under the output root.
pub const IMAGE_DIR: &str = "velimage";
/// Directory for content-addressed code assets under the output root.
pub const CODE_DIR: &str = "velcode";
/// Navigation manifest file name under the output root.
pub const MANIFEST_FILE: &str = "site-manifest.json";
/// File name of every page unit inside its hash directory.
pub const PAGE_FILE: &str = "page.tsx";
/// Extension of per-document page overrides placed next to sources.
pub const OVERRIDE_EXT: &str = "tsx";

/// Web path prefix under which stored images are served.
pub const IMAGE_WEB_PREFIX: &str = "/velimage/";

/// Public URL for a stored image's canonical name.
pub fn image_web_path(canonical: &str) -> String {
    format!("{IMAGE_WEB_PREFIX}{canonical}")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build configuration loaded from `vellum.toml`.
///
/// All fields have sensible defaults. A config file needs only the values
/// it wants to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Directory the compiled site is written to.
    pub output_root: String,
    /// Directory names skipped entirely while scanning the content tree.
    pub excluded_dirs: Vec<String>,
    /// File extensions (with leading dot) registered as image assets.
    pub image_extensions: Vec<String>,
    /// Base URL for per-page edit links. Empty disables edit links.
    pub edit_source_base_url: String,
}

fn default_output_root() -> String {
    "dist".to_string()
}

fn default_excluded_dirs() -> Vec<String> {
    ["node_modules", "dist", "build", "out", ".git", ".idea"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_image_extensions() -> Vec<String> {
    [".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            excluded_dirs: default_excluded_dirs(),
            image_extensions: default_image_extensions(),
            edit_source_base_url: String::new(),
        }
    }
}

impl BuildConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_root.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output_root must not be empty".into(),
            ));
        }
        if self.image_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "image_extensions must not be empty".into(),
            ));
        }
        for ext in &self.image_extensions {
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(ConfigError::Validation(format!(
                    "image extensions must start with a dot: {ext:?}"
                )));
            }
        }
        Ok(())
    }

    /// Whether a directory name is excluded from the content scan.
    pub fn is_excluded(&self, dir_name: &str) -> bool {
        self.excluded_dirs.iter().any(|d| d == dir_name)
    }

    /// Whether a path carries one of the configured image extensions.
    pub fn is_image(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let dotted = format!(".{}", ext.to_ascii_lowercase());
        self.image_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&dotted))
    }
}

// =============================================================================
// Config loading and validation
// =============================================================================

/// Load config for a content root.
///
/// Looks for `vellum.toml` in the root itself, then in its parent. When
/// neither exists the stock defaults apply. A file that exists but fails to
/// parse or validate is an error.
pub fn load_config(content_root: &Path) -> Result<BuildConfig, ConfigError> {
    let mut candidates = vec![content_root.join(CONFIG_FILE)];
    if let Some(parent) = content_root.parent() {
        candidates.push(parent.join(CONFIG_FILE));
    }
    for candidate in candidates {
        if candidate.exists() {
            let content = fs::read_to_string(&candidate)?;
            let config: BuildConfig = toml::from_str(&content)?;
            config.validate()?;
            return Ok(config);
        }
    }
    Ok(BuildConfig::default())
}

/// Returns a fully-commented stock `vellum.toml` with all keys and
/// explanations. Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Vellum Configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# The config file is looked up in the content root first, then in its
# parent directory. Unknown keys will cause an error.

# Directory the compiled site is written to.
output_root = "dist"

# Base URL for per-page edit links, rendered into every page's footer.
# Leave empty to emit pages without a usable edit link.
#   edit_source_base_url = "https://github.com/you/site/edit/main"
edit_source_base_url = ""

# Directory names skipped entirely while scanning the content tree.
excluded_dirs = [
    "node_modules",
    "dist",
    "build",
    "out",
    ".git",
    ".idea",
]

# File extensions (with leading dot) registered as image assets.
image_extensions = [
    ".jpg",
    ".jpeg",
    ".png",
    ".gif",
    ".svg",
    ".webp",
]
"##
}
