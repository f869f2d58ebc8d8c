//! Post-compilation normalization passes.
//!
//! The compiler leaves authored tags as raw text and paragraphs as it found
//! them. Normalization runs two passes over the tree, then injects page
//! metadata:
//!
//! ```text
//! pass A  canonicalize: raw tags get the component spelling, void elements
//!         expand to open/close pairs, image sources re-resolve against the
//!         asset store
//! pass B  repair: block-level elements that ended up inside a paragraph are
//!         hoisted out; paragraph fragments left empty are dropped
//! meta    a PageMeta element is inserted after the first H1vel (or at the
//!         top when there is none), carrying the front matter dates
//! ```
//!
//! Pass A is pure text rewriting on [`Node::Raw`] fragments, driven by one
//! tag-shaped regex. Pass B works on node sequences: a raw block element
//! spans several fragments (open tag, children, close tag), so the pass
//! counts depth across siblings to move the whole span out in one piece.
//! An unclosed block element stays where it is.

use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::assets::AssetStore;
use crate::config;
use crate::frontmatter::FrontMatter;
use crate::markup::{self, Node};
use crate::types::ImageUsage;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?([a-zA-Z0-9]+)([^>]*)>").expect("tag pattern"));

static SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src="([^"]*)"|src='([^']*)'"#).expect("src pattern"));

/// Per-document normalizer. Collects the image usages found while
/// re-resolving sources.
pub struct Normalizer<'a> {
    store: &'a AssetStore,
    usages: Vec<ImageUsage>,
}

impl<'a> Normalizer<'a> {
    pub fn new(store: &'a AssetStore) -> Self {
        Self {
            store,
            usages: Vec::new(),
        }
    }

    /// Run both passes and the metadata injection. Returns the normalized
    /// tree and the image usages recorded along the way.
    pub fn normalize(mut self, nodes: Vec<Node>, front: &FrontMatter) -> (Vec<Node>, Vec<ImageUsage>) {
        let nodes = self.canonicalize(nodes);
        let mut nodes = hoist_blocks(nodes);
        inject_meta(&mut nodes, front);
        (nodes, self.usages)
    }

    // ==================== pass A: canonicalize ====================

    fn canonicalize(&mut self, nodes: Vec<Node>) -> Vec<Node> {
        nodes
            .into_iter()
            .map(|node| self.canonicalize_node(node))
            .collect()
    }

    fn canonicalize_node(&mut self, node: Node) -> Node {
        match node {
            Node::Raw(raw) => Node::Raw(self.rewrite_raw(&raw)),
            Node::Image { src, alt, title } => {
                let src = self.resolve(&src).unwrap_or(src);
                Node::Image { src, alt, title }
            }
            Node::Heading { level, content } => Node::Heading {
                level,
                content: self.canonicalize(content),
            },
            Node::Paragraph(content) => Node::Paragraph(self.canonicalize(content)),
            Node::List { ordered, items } => Node::List {
                ordered,
                items: items
                    .into_iter()
                    .map(|item| self.canonicalize(item))
                    .collect(),
            },
            Node::Blockquote(content) => Node::Blockquote(self.canonicalize(content)),
            Node::Bold(content) => Node::Bold(self.canonicalize(content)),
            Node::Italic(content) => Node::Italic(self.canonicalize(content)),
            Node::Strike(content) => Node::Strike(self.canonicalize(content)),
            Node::Link {
                href,
                title,
                content,
            } => Node::Link {
                href,
                title,
                content: self.canonicalize(content),
            },
            Node::Box { kind, content } => Node::Box {
                kind,
                content: self.canonicalize(content),
            },
            Node::Post { left, images } => Node::Post {
                left: self.canonicalize(left),
                images: self.canonicalize(images),
            },
            other => other,
        }
    }

    /// Rewrite every tag in a raw fragment to its canonical component form.
    fn rewrite_raw(&mut self, raw: &str) -> String {
        TAG_RE
            .replace_all(raw, |caps: &Captures<'_>| self.rewrite_tag(caps))
            .into_owned()
    }

    fn rewrite_tag(&mut self, caps: &Captures<'_>) -> String {
        let whole = &caps[0];
        let name = &caps[1];
        let lower = name.to_ascii_lowercase();
        let canonical = markup::canonical_tag(name);
        if whole.starts_with("</") {
            return format!("</{canonical}>");
        }

        let mut attrs = caps.get(2).map_or("", |m| m.as_str()).to_string();
        if lower == "img" || lower == "imgvel" {
            attrs = self.rewrite_src_attr(&attrs);
        }
        // Void elements expand to a pair; a self-closing slash would read as
        // a stray attribute after expansion, so it is dropped.
        if markup::VOID_TAGS.contains(&lower.as_str()) {
            let mut kept = attrs.trim_end();
            if let Some(rest) = kept.strip_suffix('/') {
                kept = rest.trim_end();
            }
            return format!("<{canonical}{kept}></{canonical}>");
        }
        format!("<{canonical}{attrs}>")
    }

    fn rewrite_src_attr(&mut self, attrs: &str) -> String {
        SRC_RE
            .replace(attrs, |caps: &Captures<'_>| {
                let (quote, value) = match caps.get(1) {
                    Some(m) => ('"', m.as_str()),
                    None => ('\'', caps.get(2).map_or("", |m| m.as_str())),
                };
                match self.resolve(value) {
                    Some(public) => format!("src={quote}{public}{quote}"),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    fn resolve(&mut self, reference: &str) -> Option<String> {
        let (original, canonical) = self.store.resolve_reference(reference)?;
        self.usages.push(ImageUsage {
            original_name: original,
            hash_path: format!("{}/{canonical}", config::IMAGE_DIR),
        });
        Some(config::image_web_path(&canonical))
    }
}

// ==================== pass B: hoist ====================

/// Recursively hoist block-level elements out of paragraphs.
fn hoist_blocks(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            Node::Paragraph(children) => hoist_paragraph(children, &mut out),
            Node::Blockquote(content) => out.push(Node::Blockquote(hoist_blocks(content))),
            Node::Post { left, images } => out.push(Node::Post {
                left: hoist_blocks(left),
                images,
            }),
            Node::List { ordered, items } => out.push(Node::List {
                ordered,
                items: items.into_iter().map(hoist_blocks).collect(),
            }),
            other => out.push(other),
        }
    }
    out
}

fn hoist_paragraph(children: Vec<Node>, out: &mut Vec<Node>) {
    let mut rest: VecDeque<Node> = children.into();
    let mut pending: Vec<Node> = Vec::new();
    while !rest.is_empty() {
        match hoistable_group_len(&rest) {
            Some(len) => {
                flush_fragment(&mut pending, out);
                out.extend(rest.drain(..len));
            }
            None => {
                if let Some(node) = rest.pop_front() {
                    pending.push(node);
                }
            }
        }
    }
    flush_fragment(&mut pending, out);
}

/// Length of the block-level group at the front of the queue, if any.
/// A compiled image is a group of one; a raw block element spans from its
/// open tag to the matching close at the same depth.
fn hoistable_group_len(children: &VecDeque<Node>) -> Option<usize> {
    match children.front()? {
        Node::Image { .. } => Some(1),
        Node::Raw(_) => raw_group_len(children),
        _ => None,
    }
}

fn raw_group_len(children: &VecDeque<Node>) -> Option<usize> {
    let Some(Node::Raw(first)) = children.front() else {
        return None;
    };
    let (name, closing) = markup::leading_tag(first)?;
    if closing || !markup::is_block_tag(name) {
        return None;
    }
    let close_marker = format!("</{name}>");
    if is_self_contained(first, &close_marker) {
        return Some(1);
    }
    let mut depth = 0usize;
    for (idx, node) in children.iter().enumerate() {
        let Node::Raw(raw) = node else { continue };
        let Some((tag, is_close)) = markup::leading_tag(raw) else {
            continue;
        };
        if !tag.eq_ignore_ascii_case(name) {
            continue;
        }
        if is_close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(idx + 1);
            }
        } else if !is_self_contained(raw, &close_marker) {
            depth += 1;
        }
    }
    None
}

/// A fragment that carries its own close (like an expanded void element)
/// does not open a span.
fn is_self_contained(raw: &str, close_marker: &str) -> bool {
    raw.trim_end().ends_with(close_marker)
}

fn flush_fragment(pending: &mut Vec<Node>, out: &mut Vec<Node>) {
    if pending.is_empty() {
        return;
    }
    let only_blank = pending
        .iter()
        .all(|n| matches!(n, Node::Text(t) if t.trim().is_empty()));
    if only_blank {
        pending.clear();
        return;
    }
    out.push(Node::Paragraph(std::mem::take(pending)));
}

// ==================== metadata ====================

/// Insert the PageMeta element after the first top-level H1, or at the very
/// top when the document has none. Attributes with empty values are treated
/// as absent; a document with none of them gets no element at all.
fn inject_meta(nodes: &mut Vec<Node>, front: &FrontMatter) {
    let published = front.get_non_empty("created_at").map(str::to_string);
    let updated = front.get_non_empty("last_updated_at").map(str::to_string);
    let author = front.get_non_empty("author").map(str::to_string);
    if published.is_none() && updated.is_none() && author.is_none() {
        return;
    }
    let meta = Node::Meta {
        published,
        updated,
        author,
    };
    match nodes
        .iter()
        .position(|n| matches!(n, Node::Heading { level: 1, .. }))
    {
        Some(i) => nodes.insert(i + 1, meta),
        None => nodes.insert(0, meta),
    }
}
