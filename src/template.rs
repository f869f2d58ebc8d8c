//! Page unit rendering.
//!
//! Every compiled document becomes one `page.tsx` file: a fixed component
//! shell with the compiled markup spliced in. The shell lives in
//! `static/page.tsx` and is embedded at build time, so the binary carries
//! its own template.
//!
//! Two placeholders are filled per page:
//!
//! ```text
//! {{BODY}}      the compiled markup, trimmed
//! {{EDIT_URL}}  the page's edit link, or empty when none is configured
//! ```
//!
//! Authored passthrough tags may carry `class` attributes; those are
//! rewritten to `className` so the output is valid component markup.

pub const PAGE_TEMPLATE: &str = include_str!("../static/page.tsx");

/// Splice a compiled body and edit link into the page shell.
pub fn render_page(body: &str, edit_url: &str) -> String {
    let body = body.trim().replace("class=\"", "className=\"");
    PAGE_TEMPLATE
        .replace("{{BODY}}", &body)
        .replace("{{EDIT_URL}}", edit_url)
}
