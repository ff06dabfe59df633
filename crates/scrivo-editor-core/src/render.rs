//! Rendering boundary for math and table widgets.
//!
//! Renderers are pure and infallible from the caller's point of view: a
//! malformed formula or table comes back as fallback markup.

use std::rc::Rc;

use crate::widget::TableSyntax;

pub trait MathRenderer {
    fn render_math(&self, expr: &str, display: bool) -> String;
}

pub trait TableRenderer {
    fn render_table(&self, source: &str, syntax: TableSyntax) -> String;
}

/// Renders through `scrivo-renderer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRenderer;

impl MathRenderer for DefaultRenderer {
    fn render_math(&self, expr: &str, display: bool) -> String {
        let result = scrivo_renderer::render_math(expr, display);
        if let Some(reason) = result.failure() {
            tracing::trace!(target: "scrivo::widget", %reason, "math render fell back to source");
        }
        result.into_html()
    }
}

impl TableRenderer for DefaultRenderer {
    fn render_table(&self, source: &str, syntax: TableSyntax) -> String {
        match syntax {
            TableSyntax::Pipe => scrivo_renderer::render_pipe_table(source),
            TableSyntax::Directive => scrivo_renderer::render_directive_table(source),
        }
    }
}

#[derive(Clone)]
pub struct Renderers {
    pub math: Rc<dyn MathRenderer>,
    pub tables: Rc<dyn TableRenderer>,
}

impl Default for Renderers {
    fn default() -> Self {
        Self {
            math: Rc::new(DefaultRenderer),
            tables: Rc::new(DefaultRenderer),
        }
    }
}

impl std::fmt::Debug for Renderers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderers").finish_non_exhaustive()
    }
}
