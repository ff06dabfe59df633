//! Headings: level class on the whole heading, marker hidden while the
//! caret is elsewhere.

use smol_str::format_smolstr;

use super::DecorateContext;
use crate::decoration::{DecorationBuilder, DecorationSet};
use crate::syntax::{NodeKind, SyntaxNode, Walk};

pub fn decorations(cx: &DecorateContext) -> DecorationSet {
    let mut out = DecorationBuilder::new();
    cx.tree.iterate(cx.everything(), &mut |node: &SyntaxNode| {
        let Some(level) = node.kind.heading_level() else {
            return match node.kind {
                NodeKind::Paragraph | NodeKind::FencedCode | NodeKind::Table => Walk::Skip,
                _ => Walk::Descend,
            };
        };
        out.mark(
            node.range(),
            format_smolstr!("md-heading md-heading-{level}"),
        );
        if cx.is_active(node) {
            return Walk::Skip;
        }
        match node.kind {
            NodeKind::Heading(_) => {
                // `#`s plus the space after them.
                let end = (node.from + level as usize + 1).min(node.to);
                out.hide(node.from..end);
            }
            _ => {
                if let Some(underline) = node.child(NodeKind::HeaderMark) {
                    out.hide(underline.range());
                }
            }
        }
        Walk::Skip
    });
    out.finish()
}
