//! Document compiler: extended-markdown text to a [`Node`] tree.
//!
//! The grammar is deliberately explicit. Two ordered rule tables drive the
//! scan, one per nesting level:
//!
//! ```text
//! block:   admonition boxes, post layout, display math, fenced code,
//!          heading, blockquote, list, then paragraph assembly (fallback)
//! inline:  small image, bold-italic, inline math, raw tag, image, link,
//!          bold, italic, code span, strike, hard break, then plain text
//! ```
//!
//! At every position the first matching rule wins and reports how many bytes
//! it consumed. Container rules recurse: a box compiles its body at inline
//! level, a post's left rail and blockquotes compile at block level, emphasis
//! recurses at inline level. That mutual recursion replaces any notion of a
//! token stream; the tree is built directly.
//!
//! ## Code and image side effects
//!
//! Code spans and fenced blocks never keep their text in the tree. The
//! compiler stores the snippet through [`AssetStore::store_code`] and records
//! the generated file name, so the page references `velcode/<hash>.txt`.
//! Image references that resolve against the store are rewritten to the
//! public `velimage/` path and recorded as usages for the manifest.
//!
//! ## Failure policy
//!
//! Only structural grammar violations fail a document: a `<post>` without
//! both rails, or non-image content in its `<rt>` rail. Everything else
//! degrades to plainer output (an unclosed box compiles as raw text).

use thiserror::Error;

use crate::assets::AssetStore;
use crate::config;
use crate::markup::{BoxKind, Node, is_block_tag, leading_tag};
use crate::types::ImageUsage;

#[derive(Error, Debug)]
pub enum CompileError {
    /// A structural construct was used in a way that has no sensible output.
    #[error("{0}")]
    Grammar(String),
}

/// Result of compiling one document body.
#[derive(Debug)]
pub struct CompiledDocument {
    pub nodes: Vec<Node>,
    /// Snippet file names generated for this document, first-reference order.
    pub code_assets: Vec<String>,
    /// Image references that resolved against the asset store.
    pub image_usages: Vec<ImageUsage>,
}

type BlockMatch = Option<(Vec<Node>, usize)>;
type BlockRule = fn(&mut Compiler<'_>, &str) -> Result<BlockMatch, CompileError>;
type InlineMatch = Option<(Node, usize)>;
type InlineRule = fn(&mut Compiler<'_>, &str) -> InlineMatch;

/// Block rules, tried in order at every block position. Paragraph assembly
/// is not listed: it is the unconditional fallback.
const BLOCK_RULES: &[(&str, BlockRule)] = &[
    ("info-box", |c, s| c.box_rule(s, BoxKind::Info)),
    ("warning-box", |c, s| c.box_rule(s, BoxKind::Warning)),
    ("success-box", |c, s| c.box_rule(s, BoxKind::Success)),
    ("post", |c, s| c.post_rule(s)),
    ("display-math", |c, s| c.math_block_rule(s)),
    ("fenced-code", |c, s| c.fence_rule(s)),
    ("heading", |c, s| c.heading_rule(s)),
    ("blockquote", |c, s| c.quote_rule(s)),
    ("list", |c, s| c.list_rule(s)),
];

/// Inline rules, tried in order at every inline position. Unmatched input
/// accumulates as plain text, with backslash escapes honored.
const INLINE_RULES: &[(&str, InlineRule)] = &[
    ("small-image", |c, s| c.smallimg_rule(s)),
    ("bold-italic", |c, s| c.bold_italic_rule(s)),
    ("inline-math", |c, s| c.inline_math_rule(s)),
    ("raw-tag", |c, s| c.raw_tag_rule(s)),
    ("image", |c, s| c.image_rule(s)),
    ("link", |c, s| c.link_rule(s)),
    ("bold", |c, s| c.bold_rule(s)),
    ("italic", |c, s| c.italic_rule(s)),
    ("code-span", |c, s| c.code_span_rule(s)),
    ("strike", |c, s| c.strike_rule(s)),
    ("hard-break", |c, s| c.break_rule(s)),
];

/// Single-document compiler. Create one per document; it accumulates the
/// document's code assets and image usages while it runs.
pub struct Compiler<'a> {
    store: &'a mut AssetStore,
    code_assets: Vec<String>,
    image_usages: Vec<ImageUsage>,
}

impl<'a> Compiler<'a> {
    pub fn new(store: &'a mut AssetStore) -> Self {
        Self {
            store,
            code_assets: Vec::new(),
            image_usages: Vec::new(),
        }
    }

    /// Compile a document body (front matter already removed).
    pub fn compile(mut self, body: &str) -> Result<CompiledDocument, CompileError> {
        let nodes = self.compile_blocks(body)?;
        Ok(CompiledDocument {
            nodes,
            code_assets: self.code_assets,
            image_usages: self.image_usages,
        })
    }

    // ==================== block level ====================

    fn compile_blocks(&mut self, src: &str) -> Result<Vec<Node>, CompileError> {
        let mut nodes = Vec::new();
        let mut rest = src;
        'scan: while !rest.is_empty() {
            let blank = leading_blank_len(rest);
            if blank > 0 {
                rest = &rest[blank..];
                continue;
            }
            for (_, rule) in BLOCK_RULES {
                if let Some((mut produced, consumed)) = rule(self, rest)? {
                    nodes.append(&mut produced);
                    rest = &rest[consumed..];
                    continue 'scan;
                }
            }
            let (mut produced, consumed) = self.paragraph(rest);
            nodes.append(&mut produced);
            rest = &rest[consumed..];
        }
        Ok(nodes)
    }

    /// `<info>`, `<warning>`, `<success>`: same-tag occurrences nest, so the
    /// scan counts depth until the matching close. No close means no match,
    /// and the text falls through to the generic rules.
    fn box_rule(&mut self, src: &str, kind: BoxKind) -> Result<BlockMatch, CompileError> {
        let open = format!("<{}>", kind.source_tag());
        if !src.starts_with(&open) {
            return Ok(None);
        }
        let close = format!("</{}>", kind.source_tag());
        let Some(end) = balanced_end(src, &open, &close) else {
            return Ok(None);
        };
        let content = &src[open.len()..end - close.len()];
        let inner = self.compile_inline(content.trim());
        Ok(Some((vec![Node::Box { kind, content: inner }], end)))
    }

    /// `<post>` split layout. The left rail compiles at block level; the
    /// right rail may contain only images, each with alt text.
    fn post_rule(&mut self, src: &str) -> Result<BlockMatch, CompileError> {
        if !src.starts_with("<post>") {
            return Ok(None);
        }
        let Some(close_at) = src.find("</post>") else {
            return Ok(None);
        };
        let consumed = close_at + "</post>".len();
        let body = &src["<post>".len()..close_at];

        let (Some(left_src), Some(right_src)) = (tag_region(body, "lft"), tag_region(body, "rt"))
        else {
            return Err(CompileError::Grammar(
                "Post block must contain both <lft> and <rt> tags.".to_string(),
            ));
        };
        let left = self.compile_blocks(left_src.trim())?;
        let images = self.post_rail_images(right_src.trim())?;
        Ok(Some((vec![Node::Post { left, images }], consumed)))
    }

    fn post_rail_images(&mut self, rail: &str) -> Result<Vec<Node>, CompileError> {
        let mut images = Vec::new();
        let mut rest = rail;
        while let Some(found) = find_image_ref(rest) {
            let lead = rest[..found.start].trim();
            if !lead.is_empty() {
                return Err(CompileError::Grammar(format!(
                    "Post <rt> allows only images. Found text: '{lead}'"
                )));
            }
            if found.alt.is_empty() {
                return Err(CompileError::Grammar(
                    "Post <rt> images must have alt text.".to_string(),
                ));
            }
            let node = self.image_node(found.alt, found.target);
            images.push(node);
            rest = &rest[found.end..];
        }
        let trailing = rest.trim();
        if !trailing.is_empty() {
            return Err(CompileError::Grammar(format!(
                "Post <rt> allows only images. Found text at end: '{trailing}'"
            )));
        }
        if images.is_empty() {
            return Err(CompileError::Grammar(
                "Post <rt> must contain at least one image.".to_string(),
            ));
        }
        Ok(images)
    }

    /// `$$ ... $$`, formula kept verbatim apart from edge trimming.
    fn math_block_rule(&mut self, src: &str) -> Result<BlockMatch, CompileError> {
        let Some(body) = src.strip_prefix("$$") else {
            return Ok(None);
        };
        let Some(close) = body.find("$$") else {
            return Ok(None);
        };
        if close == 0 {
            return Ok(None);
        }
        let formula = body[..close].trim().to_string();
        Ok(Some((vec![Node::BlockMath { formula }], 2 + close + 2)))
    }

    /// ```` ```lang ```` fenced code. The text is stored out of line; an
    /// unterminated fence runs to the end of input.
    fn fence_rule(&mut self, src: &str) -> Result<BlockMatch, CompileError> {
        if !src.starts_with("```") {
            return Ok(None);
        }
        let Some(line_end) = src.find('\n') else {
            return Ok(None);
        };
        let info = src[3..line_end].trim();
        let language = info.split_whitespace().next().unwrap_or("");

        let body_start = line_end + 1;
        let body = &src[body_start..];
        let mut offset = 0;
        let mut content_end = None;
        let mut consumed = src.len();
        for line in body.split_inclusive('\n') {
            if line.trim_end_matches(['\r', '\n']).trim() == "```" {
                content_end = Some(offset);
                consumed = body_start + offset + line.len();
                break;
            }
            offset += line.len();
        }
        let content = match content_end {
            Some(end) => &body[..end],
            None => body,
        };
        let text = content.strip_suffix('\n').unwrap_or(content);
        let text = text.strip_suffix('\r').unwrap_or(text);

        let hash = self.store.store_code(text);
        self.record_code(&hash);
        let language = if language.is_empty() { "text" } else { language };
        Ok(Some((
            vec![Node::CodeBlock {
                language: language.to_string(),
                hash,
            }],
            consumed,
        )))
    }

    fn heading_rule(&mut self, src: &str) -> Result<BlockMatch, CompileError> {
        let level = src.chars().take_while(|c| *c == '#').count();
        if !(1..=6).contains(&level) {
            return Ok(None);
        }
        if !matches!(src.as_bytes().get(level), Some(b' ') | Some(b'\t')) {
            return Ok(None);
        }
        let (line, consumed) = first_line(src);
        let text = line[level..].trim();
        // A closing hash run only counts when whitespace separates it, so
        // titles like "C#" keep their hash.
        let stripped = text.trim_end_matches('#');
        let text = if stripped.len() < text.len() && stripped.ends_with([' ', '\t']) {
            stripped.trim_end()
        } else {
            text
        };
        let content = self.compile_inline(text);
        Ok(Some((
            vec![Node::Heading {
                level: level as u8,
                content,
            }],
            consumed,
        )))
    }

    fn quote_rule(&mut self, src: &str) -> Result<BlockMatch, CompileError> {
        if !src.starts_with('>') {
            return Ok(None);
        }
        let mut inner = String::new();
        let mut consumed = 0;
        for line in src.split_inclusive('\n') {
            let stripped = line.trim_end_matches(['\n', '\r']);
            let Some(rest) = stripped.strip_prefix('>') else {
                break;
            };
            inner.push_str(rest.strip_prefix(' ').unwrap_or(rest));
            inner.push('\n');
            consumed += line.len();
        }
        let content = self.compile_blocks(&inner)?;
        Ok(Some((vec![Node::Blockquote(content)], consumed)))
    }

    /// Tight lists only: a blank line ends the list. Items compile at block
    /// level (indented continuations are dedented first) and single
    /// paragraphs unwrap so plain items stay plain.
    fn list_rule(&mut self, src: &str) -> Result<BlockMatch, CompileError> {
        let Some(first) = list_marker(first_line(src).0) else {
            return Ok(None);
        };
        let base_indent = first.indent;
        let base_width = first.content_offset;

        let mut consumed = 0;
        let mut items: Vec<Vec<String>> = Vec::new();
        for line in src.split_inclusive('\n') {
            let stripped = line.trim_end_matches(['\n', '\r']);
            if stripped.trim().is_empty() {
                break;
            }
            match list_marker(stripped) {
                Some(m) if m.indent <= base_indent => {
                    items.push(vec![stripped[m.content_offset..].to_string()]);
                }
                _ => {
                    if !stripped.starts_with("  ") {
                        break;
                    }
                    let Some(item) = items.last_mut() else {
                        break;
                    };
                    item.push(dedent(stripped, base_width).to_string());
                }
            }
            consumed += line.len();
        }
        if items.is_empty() {
            return Ok(None);
        }

        let mut compiled = Vec::new();
        for lines in items {
            let blocks = self.compile_blocks(&lines.join("\n"))?;
            compiled.push(flatten_tight(blocks));
        }
        Ok(Some((
            vec![Node::List {
                ordered: first.ordered,
                items: compiled,
            }],
            consumed,
        )))
    }

    /// Fallback: gather lines until a blank line or a block construct, then
    /// compile the text at inline level. A paragraph whose first real child
    /// is block-level content is emitted unwrapped.
    fn paragraph(&mut self, src: &str) -> (Vec<Node>, usize) {
        let mut consumed = 0;
        let mut text = String::new();
        let mut first = true;
        for line in src.split_inclusive('\n') {
            let stripped = line.trim_end_matches(['\n', '\r']);
            if stripped.trim().is_empty() {
                break;
            }
            if !first && interrupts_paragraph(stripped) {
                break;
            }
            // Boxes and display math may open mid-line; the paragraph stops
            // right before them.
            if let Some(cut) = midline_block_start(stripped) {
                text.push_str(&stripped[..cut]);
                consumed += cut;
                break;
            }
            text.push_str(stripped);
            text.push('\n');
            consumed += line.len();
            first = false;
        }
        let inline = self.compile_inline(text.trim_end());
        if paragraph_unwraps(&inline) {
            (inline, consumed)
        } else {
            (vec![Node::Paragraph(inline)], consumed)
        }
    }

    // ==================== inline level ====================

    fn compile_inline(&mut self, src: &str) -> Vec<Node> {
        let mut nodes: Vec<Node> = Vec::new();
        let mut text = String::new();
        let mut rest = src;
        'scan: while !rest.is_empty() {
            for (_, rule) in INLINE_RULES {
                if let Some((node, consumed)) = rule(self, rest) {
                    flush_text(&mut text, &mut nodes);
                    nodes.push(node);
                    rest = &rest[consumed..];
                    continue 'scan;
                }
            }
            let Some(c) = rest.chars().next() else {
                break;
            };
            if c == '\\' {
                if let Some(next) = rest[1..].chars().next() {
                    if next.is_ascii_punctuation() {
                        text.push(next);
                        rest = &rest[1 + next.len_utf8()..];
                        continue;
                    }
                }
            }
            text.push(c);
            rest = &rest[c.len_utf8()..];
        }
        flush_text(&mut text, &mut nodes);
        nodes
    }

    /// `<smallimg> ![alt](href) </smallimg>`. The closing tag may be written
    /// with or without the slash. No title attribute exists for this form.
    fn smallimg_rule(&mut self, src: &str) -> InlineMatch {
        let rest = src.strip_prefix("<smallimg>")?;
        let after_open = rest.trim_start();
        let ws_open = rest.len() - after_open.len();
        let (img_len, alt, target) = parse_image_at(after_open)?;
        let after_img = &after_open[img_len..];
        let after_ws = after_img.trim_start();
        let ws_close = after_img.len() - after_ws.len();
        let close_len = if after_ws.starts_with("</smallimg>") {
            "</smallimg>".len()
        } else if after_ws.starts_with("<smallimg>") {
            "<smallimg>".len()
        } else {
            return None;
        };
        let consumed = "<smallimg>".len() + ws_open + img_len + ws_close + close_len;
        let alt = alt.to_string();
        let src_attr = self
            .resolve_image(target)
            .unwrap_or_else(|| target.to_string());
        Some((
            Node::SmallImage {
                src: src_attr,
                alt,
            },
            consumed,
        ))
    }

    /// `***text***`: combined emphasis. The inner text must start and end
    /// with non-whitespace (so at least two characters) and the closing run
    /// must not be followed by another `*`. The text is kept verbatim, not
    /// re-parsed.
    fn bold_italic_rule(&mut self, src: &str) -> InlineMatch {
        let body = src.strip_prefix("***")?;
        if body.chars().next()?.is_whitespace() {
            return None;
        }
        let mut from = 0;
        while let Some(found) = body[from..].find("***") {
            let at = from + found;
            if at >= 2 {
                let content = &body[..at];
                let followed_by_star = matches!(body[at + 3..].chars().next(), Some('*'));
                if !followed_by_star && !content.ends_with(char::is_whitespace) {
                    return Some((Node::BoldItalic(content.to_string()), 3 + at + 3));
                }
            }
            from = at + 1;
        }
        None
    }

    /// `$formula$` on a single line, `$` not allowed inside.
    fn inline_math_rule(&mut self, src: &str) -> InlineMatch {
        let body = src.strip_prefix('$')?;
        let close = body.find('$')?;
        if close == 0 {
            return None;
        }
        let span = &body[..close];
        if span.contains('\n') {
            return None;
        }
        Some((
            Node::InlineMath {
                formula: span.trim().to_string(),
            },
            1 + close + 1,
        ))
    }

    /// Any tag-shaped run passes through as raw text for the normalizer to
    /// canonicalize.
    fn raw_tag_rule(&mut self, src: &str) -> InlineMatch {
        let after = src.strip_prefix('<')?;
        let name_part = after.strip_prefix('/').unwrap_or(after);
        if !name_part.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return None;
        }
        let close = src.find('>')?;
        Some((Node::Raw(src[..close + 1].to_string()), close + 1))
    }

    /// `![alt](href "title")`. Resolvable references are rewritten to the
    /// stored image path and recorded for the manifest.
    fn image_rule(&mut self, src: &str) -> InlineMatch {
        if !src.starts_with("![") {
            return None;
        }
        let (len, alt, target) = parse_image_at(src)?;
        let alt = alt.to_string();
        let node = self.image_node(&alt, target);
        Some((node, len))
    }

    /// `[label](href "title")`, label compiled at inline level.
    fn link_rule(&mut self, src: &str) -> InlineMatch {
        let body = src.strip_prefix('[')?;
        let close_bracket = body.find(']')?;
        let label = &body[..close_bracket];
        let after = &body[close_bracket + 1..];
        let target_body = after.strip_prefix('(')?;
        let close_paren = target_body.find(')')?;
        let target = &target_body[..close_paren];
        let (href, title) = split_link_title(target);
        let href = href.to_string();
        let title = title.map(str::to_string);
        let label = label.to_string();
        let content = self.compile_inline(&label);
        let consumed = 1 + close_bracket + 1 + 1 + close_paren + 1;
        Some((
            Node::Link {
                href,
                title,
                content,
            },
            consumed,
        ))
    }

    /// `**bold**` or `__bold__`, recursive.
    fn bold_rule(&mut self, src: &str) -> InlineMatch {
        for delim in ["**", "__"] {
            if let Some((content_len, total)) = delimited_span(src, delim) {
                let content = src[delim.len()..delim.len() + content_len].to_string();
                return Some((Node::Bold(self.compile_inline(&content)), total));
            }
        }
        None
    }

    /// `*italic*`, recursive. Single underscores are left alone so
    /// snake_case identifiers survive in prose.
    fn italic_rule(&mut self, src: &str) -> InlineMatch {
        let (content_len, total) = delimited_span(src, "*")?;
        let content = src[1..1 + content_len].to_string();
        Some((Node::Italic(self.compile_inline(&content)), total))
    }

    /// Backtick code span. The matching close uses the same run length; the
    /// span text is stored out of line like fenced blocks.
    fn code_span_rule(&mut self, src: &str) -> InlineMatch {
        let ticks = src.chars().take_while(|c| *c == '`').count();
        if ticks == 0 {
            return None;
        }
        let fence = &src[..ticks];
        let body = &src[ticks..];
        let mut from = 0;
        while let Some(found) = body[from..].find(fence) {
            let at = from + found;
            let after = &body[at + ticks..];
            if after.starts_with('`') {
                let run = after.chars().take_while(|c| *c == '`').count();
                from = at + ticks + run;
                continue;
            }
            let text = trim_code_span(&body[..at]);
            let hash = self.store.store_code(text);
            self.record_code(&hash);
            return Some((Node::InlineCode { hash }, ticks + at + ticks));
        }
        None
    }

    /// `~~strike~~`, recursive.
    fn strike_rule(&mut self, src: &str) -> InlineMatch {
        let (content_len, total) = delimited_span(src, "~~")?;
        let content = src[2..2 + content_len].to_string();
        Some((Node::Strike(self.compile_inline(&content)), total))
    }

    /// Two or more trailing spaces before a newline, except at the very end
    /// of the inline run.
    fn break_rule(&mut self, src: &str) -> InlineMatch {
        let spaces = src.chars().take_while(|c| *c == ' ').count();
        if spaces < 2 {
            return None;
        }
        let rest = src[spaces..].strip_prefix('\n')?;
        if rest.trim().is_empty() {
            return None;
        }
        Some((Node::Break, spaces + 1))
    }

    // ==================== shared helpers ====================

    /// Build an image node from alt text and a link target, splitting an
    /// optional quoted title and resolving the reference.
    fn image_node(&mut self, alt: &str, target: &str) -> Node {
        let (href, title) = split_link_title(target);
        let src = self
            .resolve_image(href)
            .unwrap_or_else(|| href.to_string());
        Node::Image {
            src,
            alt: alt.to_string(),
            title: title.map(str::to_string),
        }
    }

    fn resolve_image(&mut self, href: &str) -> Option<String> {
        let (original, canonical) = self.store.resolve_reference(href)?;
        self.image_usages.push(ImageUsage {
            original_name: original,
            hash_path: format!("{}/{canonical}", config::IMAGE_DIR),
        });
        Some(config::image_web_path(&canonical))
    }

    fn record_code(&mut self, hash: &str) {
        let name = format!("{hash}.txt");
        if !self.code_assets.contains(&name) {
            self.code_assets.push(name);
        }
    }
}

// ==================== free helpers ====================

fn flush_text(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::Text(std::mem::take(text)));
    }
}

fn leading_blank_len(src: &str) -> usize {
    let mut consumed = 0;
    for line in src.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        consumed += line.len();
    }
    consumed
}

fn first_line(src: &str) -> (&str, usize) {
    match src.find('\n') {
        Some(i) => (src[..i].trim_end_matches('\r'), i + 1),
        None => (src, src.len()),
    }
}

/// Scan for the close of a depth-balanced pair. The caller guarantees `src`
/// starts with `open`. Returns the index just past the matching close.
fn balanced_end(src: &str, open: &str, close: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = 0;
    while i < src.len() {
        let rest = &src[i..];
        if rest.starts_with(open) {
            depth += 1;
            i += open.len();
        } else if rest.starts_with(close) {
            depth -= 1;
            i += close.len();
            if depth == 0 {
                return Some(i);
            }
        } else {
            i += rest.chars().next().map_or(1, char::len_utf8);
        }
    }
    None
}

/// First `<name> ... </name>` region inside `body`.
fn tag_region<'s>(body: &'s str, name: &str) -> Option<&'s str> {
    let open = format!("<{name}>");
    let close = format!("</{name}>");
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(&body[start..end])
}

struct ImageRef<'s> {
    start: usize,
    end: usize,
    alt: &'s str,
    target: &'s str,
}

/// Next `![alt](target)` occurrence; alt and target stay on one line.
fn find_image_ref(s: &str) -> Option<ImageRef<'_>> {
    let mut from = 0;
    while let Some(found) = s[from..].find("![") {
        let start = from + found;
        if let Some((len, alt, target)) = parse_image_at(&s[start..]) {
            return Some(ImageRef {
                start,
                end: start + len,
                alt,
                target,
            });
        }
        from = start + 2;
    }
    None
}

/// Parse `![alt](target)` at the start of `s`.
fn parse_image_at(s: &str) -> Option<(usize, &str, &str)> {
    let after = s.strip_prefix("![")?;
    let close_bracket = after.find(']')?;
    let alt = &after[..close_bracket];
    if alt.contains('\n') {
        return None;
    }
    let target_body = after[close_bracket + 1..].strip_prefix('(')?;
    let close_paren = target_body.find(')')?;
    let target = &target_body[..close_paren];
    if target.contains('\n') {
        return None;
    }
    Some((2 + close_bracket + 2 + close_paren + 1, alt, target))
}

/// Split `href "title"` into parts. Without a fully quoted trailer the whole
/// target is the href.
fn split_link_title(target: &str) -> (&str, Option<&str>) {
    if let Some(ws) = target.find(char::is_whitespace) {
        let href = &target[..ws];
        let rest = target[ws..].trim_start();
        if !href.is_empty() && rest.len() >= 2 && rest.starts_with('"') && rest.ends_with('"') {
            return (href, Some(&rest[1..rest.len() - 1]));
        }
        return (target, None);
    }
    (target, None)
}

/// Generic delimiter scan for emphasis spans: content must be non-empty and
/// must not start or end with whitespace. Returns (content length, total
/// consumed length).
fn delimited_span(src: &str, delim: &str) -> Option<(usize, usize)> {
    let body = src.strip_prefix(delim)?;
    if body.chars().next()?.is_whitespace() {
        return None;
    }
    let mut from = 0;
    while let Some(found) = body[from..].find(delim) {
        let at = from + found;
        if at == 0 {
            return None;
        }
        if !body[..at].ends_with(char::is_whitespace) {
            return Some((at, delim.len() + at + delim.len()));
        }
        from = at + 1;
    }
    None
}

/// Strip one framing space pair from a code span, as long as the content is
/// not all spaces.
fn trim_code_span(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if raw.len() >= 2
        && bytes[0] == b' '
        && bytes[raw.len() - 1] == b' '
        && raw.chars().any(|c| c != ' ')
    {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

struct ListMarker {
    indent: usize,
    ordered: bool,
    content_offset: usize,
}

fn list_marker(line: &str) -> Option<ListMarker> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    let rest = &line[indent..];
    for bullet in ["- ", "* ", "+ "] {
        if rest.starts_with(bullet) {
            return Some(ListMarker {
                indent,
                ordered: false,
                content_offset: indent + bullet.len(),
            });
        }
    }
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && rest[digits..].starts_with(". ") {
        return Some(ListMarker {
            indent,
            ordered: true,
            content_offset: indent + digits + 2,
        });
    }
    None
}

fn dedent(line: &str, width: usize) -> &str {
    let bytes = line.as_bytes();
    let mut n = 0;
    while n < width && n < line.len() && bytes[n] == b' ' {
        n += 1;
    }
    &line[n..]
}

/// Unwrap top-level paragraphs inside a tight list item.
fn flatten_tight(blocks: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::new();
    for block in blocks {
        match block {
            Node::Paragraph(children) => out.extend(children),
            other => out.push(other),
        }
    }
    out
}

fn interrupts_paragraph(line: &str) -> bool {
    line.starts_with("<info>")
        || line.starts_with("<warning>")
        || line.starts_with("<success>")
        || line.starts_with("<post>")
        || line.starts_with("$$")
        || line.starts_with("```")
        || line.starts_with('>')
        || heading_prefix(line)
        || list_marker(line).is_some()
}

fn heading_prefix(line: &str) -> bool {
    let level = line.chars().take_while(|c| *c == '#').count();
    (1..=6).contains(&level) && matches!(line.as_bytes().get(level), Some(b' ') | Some(b'\t'))
}

/// Earliest mid-line occurrence of a construct that clips the paragraph.
/// Position 0 is excluded: a construct at line start either matched as a
/// block already or failed to close, and then it reads as plain text.
fn midline_block_start(line: &str) -> Option<usize> {
    let mut best: Option<usize> = None;
    for pattern in ["<info>", "<warning>", "<success>", "$$"] {
        if let Some(i) = line.find(pattern) {
            if i > 0 {
                best = Some(best.map_or(i, |b| b.min(i)));
            }
        }
    }
    best
}

/// A paragraph whose first non-blank child is a block-level element is
/// emitted without the paragraph wrapper.
fn paragraph_unwraps(children: &[Node]) -> bool {
    for child in children {
        match child {
            Node::Text(t) if t.trim().is_empty() => continue,
            Node::Image { .. } => return true,
            Node::Raw(raw) => {
                return leading_tag(raw)
                    .is_some_and(|(name, closing)| !closing && is_block_tag(name));
            }
            _ => return false,
        }
    }
    false
}
