//! Images.
//!
//! Inactive images are replaced by an image widget. While the selection
//! touches one, its raw syntax stays and a preview follows it; the preview
//! tracks its position when the caret is inside the path so the picker
//! overlay can anchor to it. Only the viewport (plus a line margin) is
//! decorated.

use std::ops::Range;

use smol_str::SmolStr;

use super::DecorateContext;
use crate::active;
use crate::decoration::{Decoration, DecorationBuilder, DecorationSet, Side};
use crate::syntax::{NodeKind, SyntaxNode, Walk};
use crate::widget::Widget;

/// Viewport widened by the configured number of lines each way.
pub fn scan_range(cx: &DecorateContext) -> Range<usize> {
    let viewport = cx.viewport.clamp(cx.doc.len());
    let margin = cx.config.viewport_margin_lines;
    let first = cx.doc.line_at(viewport.from).number.saturating_sub(margin).max(1);
    let last = cx.doc.line_at(viewport.to).number + margin;
    let from = cx.doc.line(first).map(|l| l.from).unwrap_or(0);
    let to = cx
        .doc
        .line(last.min(cx.doc.lines_count()))
        .map(|l| l.to)
        .unwrap_or(cx.doc.len());
    from..to
}

pub fn decorations(cx: &DecorateContext) -> DecorationSet {
    let mut out = DecorationBuilder::new();
    cx.tree
        .iterate(scan_range(cx), &mut |node: &SyntaxNode| match node.kind {
            // The table widget already shows its images.
            NodeKind::Table | NodeKind::DirectiveTable if !cx.is_active(node) => Walk::Skip,
            NodeKind::FencedCode | NodeKind::InlineCode | NodeKind::Frontmatter => Walk::Skip,
            NodeKind::Image => {
                let src = node
                    .child(NodeKind::Url)
                    .map(|url| SmolStr::new(cx.slice(url.range())))
                    .unwrap_or_default();
                if cx.is_active(node) {
                    let tracking = active::is_caret_in_image_path(node, cx.selection);
                    out.add(Decoration::widget(
                        node.to,
                        Widget::Image { src, tracking },
                        Side::After,
                        false,
                    ));
                } else {
                    out.add(Decoration::replace(
                        node.range(),
                        Widget::Image {
                            src,
                            tracking: false,
                        },
                        false,
                    ));
                }
                Walk::Skip
            }
            _ => Walk::Descend,
        });
    out.finish()
}
