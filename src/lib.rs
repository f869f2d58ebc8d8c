//! # Vellum
//!
//! A build-time compiler from a tree of markdown-like documents to typed
//! component markup. Your filesystem is the data source: `_0N` folders become
//! navigation sections, documents become page units, and every image or code
//! block is stored once under a content hash.
//!
//! # Architecture: One Pass, Five Steps
//!
//! A build walks the content tree once and runs every document through the
//! same pipeline:
//!
//! ```text
//! 1. Register    content tree   →  velimage/              (images by hash)
//! 2. Compile     document body  →  node tree              (grammar → nodes)
//! 3. Normalize   node tree      →  canonical nodes        (raw tags, hoisting, meta)
//! 4. Render      nodes          →  pages/<hash>/page.tsx  (component markup)
//! 5. Manifest    navigation     →  site-manifest.json     (tree + asset index)
//! ```
//!
//! The split between compile and normalize exists for two reasons:
//!
//! - **Grammar stays small**: the compiler only knows the authored syntax.
//!   Everything about embedded raw tags (canonical spelling, void expansion,
//!   block hoisting) lives in one later pass.
//! - **Testability**: each step is a function over plain node values, so unit
//!   tests can exercise the interesting cases without building a whole site.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`site`] | Build orchestration — clean, traverse, convert, write the manifest |
//! | [`compiler`] | Line grammar — headings, lists, boxes, posts, code, math, inlines |
//! | [`normalize`] | Canonicalize embedded raw tags, hoist block elements, inject page meta |
//! | [`markup`] | Node tree, tag tables, escaping, and rendering to component markup |
//! | [`template`] | The page unit shell that generated bodies are spliced into |
//! | [`assets`] | Content-addressed store for images and code snippets |
//! | [`frontmatter`] | `---` header extraction and required-attribute validation |
//! | [`config`] | `vellum.toml` loading and validation |
//! | [`naming`] | `_N_name` convention, natural ordering, path hashing |
//! | [`types`] | Manifest types serialized for the host application |
//! | [`output`] | CLI output formatting — tree-based display of the build report |
//!
//! # Design Decisions
//!
//! ## Suffixed Component Tags
//!
//! Generated markup never contains a plain HTML element. Every tag is a
//! component with a `vel` suffix (`H1vel`, `Pvel`, `Imgvel`, ...), so the host
//! application decides what a paragraph or an image actually renders as.
//! Restyling the whole site is a component edit, not a rebuild. Raw tags that
//! authors embed in documents are folded into the same namespace by
//! [`normalize`].
//!
//! ## Content-Addressed Assets
//!
//! Images and code blocks are stored under the SHA-256 of their bytes. The
//! same screenshot referenced from ten documents lands on disk once, renames
//! of the source file don't invalidate anything, and a rebuild that changes
//! no bytes changes no asset names.
//!
//! ## Path-Derived Page Identity
//!
//! A page's hash is derived from its root-relative source path, not its
//! content. Editing a document keeps its URL; only moving it changes
//! identity. Titles are display-only and free to change.
//!
//! ## Per-Document Failure Isolation
//!
//! A document with broken front matter or a grammar error is reported and
//! dropped; the rest of the site still builds. The manifest only ever lists
//! pages that actually exist on disk.
//!
//! ## Section Folders
//!
//! Only directories named `_0N…` (e.g. `_01_guides`) appear in navigation and
//! are descended into. Plain directories are invisible to the tree but still
//! contribute images, so asset folders need no special casing.
//!
//! # Host Application Contract
//!
//! The output is self-contained data: page units import their components from
//! the host (`@/components/vel/importer`), and `site-manifest.json` carries
//! the full navigation tree plus every asset path. The host renders the tree,
//! routes `/{hash}` to `pages/{hash}/page.tsx`, and serves `velimage/` and
//! `velcode/` statically. Nothing in the output requires this crate at
//! runtime.

pub mod assets;
pub mod compiler;
pub mod config;
pub mod frontmatter;
pub mod markup;
pub mod naming;
pub mod normalize;
pub mod output;
pub mod site;
pub mod template;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
