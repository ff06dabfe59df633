//! scrivo-renderer: the pure rendering boundary of the editor.
//!
//! Everything here takes a source slice and returns markup. Nothing in this
//! crate returns an error to its caller: malformed input is rendered as an
//! escaped fallback so a bad formula or table never interrupts editing.

pub mod math;
pub mod table;

pub use math::{MathResult, render_math};
pub use table::{directive_to_markdown, render_directive_table, render_pipe_table};

use pulldown_cmark_escape::{escape_href, escape_html};

/// Markdown options used when rendering table widgets.
pub fn default_md_options() -> pulldown_cmark::Options {
    pulldown_cmark::Options::ENABLE_TABLES
        | pulldown_cmark::Options::ENABLE_STRIKETHROUGH
        | pulldown_cmark::Options::ENABLE_TASKLISTS
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing to a String can't fail.
    let _ = escape_html(&mut out, text);
    out
}

/// Escape a URL or path for use in an `href`/`src` attribute.
pub fn escape_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    let _ = escape_href(&mut out, url);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_text("<b>&"), "&lt;b&gt;&amp;");
    }

    #[test]
    fn escapes_urls() {
        assert_eq!(escape_url("a b.png"), "a%20b.png");
    }
}
