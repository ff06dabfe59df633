//! Frontmatter block at the top of the document.

use super::{DecorateContext, line_starts};
use crate::decoration::{DecorationBuilder, DecorationSet};
use crate::syntax::NodeKind;

pub fn decorations(cx: &DecorateContext) -> DecorationSet {
    let mut out = DecorationBuilder::new();
    // Only ever the first top-level block.
    if let Some(node) = cx.tree.root().children.first()
        && node.kind == NodeKind::Frontmatter
    {
        for start in line_starts(cx.text(), node.range()) {
            out.line(start, "md-frontmatter");
        }
    }
    out.finish()
}
