//! Page markup model: the node tree and its component serialization.
//!
//! Compilation produces a tree of [`Node`]s, not strings. The serializer in
//! this module is the only place that turns nodes into component markup, so
//! escaping and attribute layout live in exactly one spot.
//!
//! ## Tag vocabulary
//!
//! Every emitted element is a component tag: capitalized, carrying the `vel`
//! suffix. `# Title` becomes `<H1vel>`, a paragraph `<Pvel>`, a fenced code
//! block `<Blockcodevel>`. Raw tags written by authors are canonicalized the
//! same way (`<div>` → `<Divvel>`), which keeps the page renderable by one
//! fixed component set.
//!
//! Two names skip the suffix rule because they address fixed page chrome
//! rather than content: `PageMeta` (publication dates) and `EditSource`
//! (the source link in the page template).
//!
//! ## Asset indirection
//!
//! Code content never appears inline. [`Node::CodeBlock`] and
//! [`Node::InlineCode`] carry only the content hash of a stored snippet;
//! the component loads `velcode/<hash>.txt` at render time.

/// Suffix appended to every canonicalized content tag.
pub const TAG_SUFFIX: &str = "vel";

/// HTML void elements. Raw occurrences are expanded to open/close pairs
/// during canonicalization so the output stays well-formed component markup.
pub const VOID_TAGS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Canonical tags that render as block-level components. Paragraphs must not
/// contain them; the normalizer hoists them out.
pub const BLOCK_TAGS: [&str; 13] = [
    "Imgvel",
    "Ulvel",
    "Olvel",
    "Blockcodevel",
    "Blockmathvel",
    "Blockquotevel",
    "Infovel",
    "Warningvel",
    "Successvel",
    "Postvel",
    "Lftvel",
    "Rtvel",
    "Divvel",
];

/// True when `name` is a block-level component tag, compared without case.
pub fn is_block_tag(name: &str) -> bool {
    BLOCK_TAGS.iter().any(|t| t.eq_ignore_ascii_case(name))
}

/// Canonical component name for a tag: lowercased, capitalized, suffixed.
/// Names already ending in the suffix are only re-capitalized, so authored
/// `<imgvel>` and generated `Imgvel` converge on the same spelling.
pub fn canonical_tag(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    let mut canonical = String::with_capacity(lower.len() + TAG_SUFFIX.len());
    let mut chars = lower.chars();
    if let Some(first) = chars.next() {
        canonical.extend(first.to_uppercase());
        canonical.push_str(chars.as_str());
    }
    if !lower.ends_with(TAG_SUFFIX) {
        canonical.push_str(TAG_SUFFIX);
    }
    canonical
}

/// Parse the leading tag of a raw fragment: `(name, is_closing)`.
/// Returns `None` when the fragment does not start with a tag.
pub fn leading_tag(raw: &str) -> Option<(&str, bool)> {
    let rest = raw.trim_start().strip_prefix('<')?;
    let (rest, closing) = match rest.strip_prefix('/') {
        Some(rest) => (rest, true),
        None => (rest, false),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some((&rest[..end], closing))
}

/// Admonition box flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxKind {
    Info,
    Warning,
    Success,
}

impl BoxKind {
    /// Tag authors write in source documents.
    pub fn source_tag(self) -> &'static str {
        match self {
            BoxKind::Info => "info",
            BoxKind::Warning => "warning",
            BoxKind::Success => "success",
        }
    }

    /// Canonical component tag.
    pub fn component_tag(self) -> &'static str {
        match self {
            BoxKind::Info => "Infovel",
            BoxKind::Warning => "Warningvel",
            BoxKind::Success => "Successvel",
        }
    }
}

/// One node of compiled page markup.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Heading { level: u8, content: Vec<Node> },
    Paragraph(Vec<Node>),
    List { ordered: bool, items: Vec<Vec<Node>> },
    Blockquote(Vec<Node>),
    /// Fenced code block, stored out of line. `language` defaults to "text".
    CodeBlock { language: String, hash: String },
    /// Inline code span, stored out of line.
    InlineCode { hash: String },
    BlockMath { formula: String },
    InlineMath { formula: String },
    Image { src: String, alt: String, title: Option<String> },
    SmallImage { src: String, alt: String },
    Bold(Vec<Node>),
    Italic(Vec<Node>),
    /// Triple-emphasis text, kept verbatim rather than re-parsed.
    BoldItalic(String),
    Strike(Vec<Node>),
    Link { href: String, title: Option<String>, content: Vec<Node> },
    Box { kind: BoxKind, content: Vec<Node> },
    /// Split layout: block content on the left, an image rail on the right.
    Post { left: Vec<Node>, images: Vec<Node> },
    /// Hard line break (two trailing spaces before a newline).
    Break,
    Text(String),
    /// Passthrough tag text, canonicalized by the normalizer.
    Raw(String),
    /// Publication metadata chrome, injected after the first `H1vel`.
    Meta {
        published: Option<String>,
        updated: Option<String>,
        author: Option<String>,
    },
}

/// Escape text for element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize a node sequence to component markup.
pub fn render_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        render_node(node, &mut out);
    }
    out
}

fn render_children(nodes: &[Node], out: &mut String) {
    for node in nodes {
        render_node(node, out);
    }
}

fn render_node(node: &Node, out: &mut String) {
    match node {
        Node::Heading { level, content } => {
            let tag = format!("H{level}{TAG_SUFFIX}");
            out.push_str(&format!("<{tag}>"));
            render_children(content, out);
            out.push_str(&format!("</{tag}>\n"));
        }
        Node::Paragraph(content) => {
            out.push_str("<Pvel>");
            render_children(content, out);
            out.push_str("</Pvel>\n");
        }
        Node::List { ordered, items } => {
            let tag = if *ordered { "Olvel" } else { "Ulvel" };
            out.push_str(&format!("<{tag}>"));
            for item in items {
                out.push_str("<Livel>");
                render_children(item, out);
                out.push_str("</Livel>\n");
            }
            out.push_str(&format!("</{tag}>\n"));
        }
        Node::Blockquote(content) => {
            out.push_str("<Blockquotevel>\n");
            render_children(content, out);
            out.push_str("</Blockquotevel>\n");
        }
        Node::CodeBlock { language, hash } => {
            out.push_str(&format!(
                "<Blockcodevel language=\"{}\" filePath=\"{}\"></Blockcodevel>\n",
                escape(language),
                hash
            ));
        }
        Node::InlineCode { hash } => {
            out.push_str(&format!("<Inlinecodevel filePath=\"{hash}\"></Inlinecodevel>"));
        }
        Node::BlockMath { formula } => {
            out.push_str(&format!(
                "<Blockmathvel formula=\"{}\"></Blockmathvel>",
                escape(formula)
            ));
        }
        Node::InlineMath { formula } => {
            out.push_str(&format!(
                "<Inlinemathvel formula=\"{}\"></Inlinemathvel>",
                escape(formula)
            ));
        }
        Node::Image { src, alt, title } => {
            out.push_str(&format!("<Imgvel src=\"{src}\""));
            if !alt.is_empty() {
                out.push_str(&format!(" alt=\"{}\"", escape(alt)));
            }
            if let Some(title) = title {
                out.push_str(&format!(" title=\"{}\"", escape(title)));
            }
            out.push_str("></Imgvel>");
        }
        Node::SmallImage { src, alt } => {
            out.push_str(&format!(
                "<Smallimgvel src=\"{src}\" alt=\"{}\"></Smallimgvel>",
                escape(alt)
            ));
        }
        Node::Bold(content) => {
            out.push_str("<Boldvel>");
            render_children(content, out);
            out.push_str("</Boldvel>");
        }
        Node::Italic(content) => {
            out.push_str("<Italicvel>");
            render_children(content, out);
            out.push_str("</Italicvel>");
        }
        Node::BoldItalic(text) => {
            out.push_str(&format!("<Bolditvel>{}</Bolditvel>", escape(text)));
        }
        Node::Strike(content) => {
            out.push_str("<Strikevel>");
            render_children(content, out);
            out.push_str("</Strikevel>");
        }
        Node::Link {
            href,
            title,
            content,
        } => {
            out.push_str(&format!("<Avel href=\"{href}\""));
            if let Some(title) = title {
                out.push_str(&format!(" title=\"{}\"", escape(title)));
            }
            out.push('>');
            render_children(content, out);
            out.push_str("</Avel>");
        }
        Node::Box { kind, content } => {
            let tag = kind.component_tag();
            out.push_str(&format!("<{tag}>"));
            render_children(content, out);
            out.push_str(&format!("</{tag}>\n"));
        }
        Node::Post { left, images } => {
            out.push_str("<Postvel>\n<Lftvel>\n");
            render_children(left, out);
            out.push_str("</Lftvel>\n<Rtvel>\n");
            render_children(images, out);
            out.push_str("</Rtvel>\n</Postvel>\n");
        }
        Node::Break => out.push_str("<Brvel></Brvel>"),
        Node::Text(text) => out.push_str(&escape(text)),
        Node::Raw(raw) => out.push_str(raw),
        Node::Meta {
            published,
            updated,
            author,
        } => {
            out.push_str("<PageMeta");
            if let Some(published) = published {
                out.push_str(&format!(" publishedAt=\"{}\"", escape(published)));
            }
            if let Some(updated) = updated {
                out.push_str(&format!(" updatedAt=\"{}\"", escape(updated)));
            }
            if let Some(author) = author {
                out.push_str(&format!(" author=\"{}\"", escape(author)));
            }
            out.push_str(" />\n");
        }
    }
}
