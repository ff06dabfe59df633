//! Formula widgets: LaTeX to MathML through pulldown-latex.
//!
//! Input is whatever the user typed between the dollar signs, so any
//! failure, including a panic inside the LaTeX parser, ends up as the
//! escaped source in an `md-math-error` span.

use std::panic::{self, AssertUnwindSafe};

use pulldown_latex::config::{DisplayMode, RenderConfig};
use pulldown_latex::{Parser, Storage, mathml::push_mathml};

use crate::escape_text;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathResult {
    html: String,
    failure: Option<String>,
}

impl MathResult {
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }

    pub fn is_error(&self) -> bool {
        self.failure.is_some()
    }

    /// Why the formula fell back to its source.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }
}

/// Render a formula key (the expression without its delimiters) to MathML.
pub fn render_math(expr: &str, display: bool) -> MathResult {
    let rendered = panic::catch_unwind(AssertUnwindSafe(|| to_mathml(expr, display)))
        .unwrap_or_else(|_| Err("latex parser panicked".to_string()));
    match rendered {
        Ok(html) => MathResult {
            html,
            failure: None,
        },
        Err(reason) => {
            tracing::trace!(target: "scrivo::render", %reason, "math fell back to source");
            MathResult {
                html: source_fallback(expr, &reason, display),
                failure: Some(reason),
            }
        }
    }
}

fn to_mathml(expr: &str, display: bool) -> Result<String, String> {
    let storage = Storage::new();
    let events: Vec<_> = Parser::new(expr, &storage).collect();
    if let Some(err) = events.iter().find_map(|e| e.as_ref().err()) {
        return Err(err.to_string());
    }
    let config = RenderConfig {
        display_mode: if display {
            DisplayMode::Block
        } else {
            DisplayMode::Inline
        },
        ..Default::default()
    };
    let mut html = String::new();
    push_mathml(&mut html, events.into_iter(), config).map_err(|e| e.to_string())?;
    Ok(html)
}

fn source_fallback(expr: &str, reason: &str, display: bool) -> String {
    let variant = if display { "display" } else { "inline" };
    format!(
        r#"<code class="md-math-error md-math-{variant}-error" title="{}">{}</code>"#,
        escape_text(reason),
        escape_text(expr)
    )
}
