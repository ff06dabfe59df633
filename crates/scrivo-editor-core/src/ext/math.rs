//! Math expressions, rendered in place while the caret is elsewhere.

use super::DecorateContext;
use crate::decoration::{Decoration, DecorationBuilder, DecorationSet};
use crate::syntax::{NodeKind, SyntaxNode, Walk};
use crate::widget::Widget;

/// Source between the opening and closing delimiters.
fn expression<'a>(cx: &DecorateContext<'a>, node: &SyntaxNode) -> &'a str {
    let mut marks = node.children_of(NodeKind::MathMark);
    match (marks.next(), marks.last()) {
        (Some(open), Some(close)) if open.to <= close.from => cx.slice(open.to..close.from),
        _ => "",
    }
}

pub fn decorations(cx: &DecorateContext) -> DecorationSet {
    let mut out = DecorationBuilder::new();
    cx.tree
        .iterate(cx.everything(), &mut |node: &SyntaxNode| match node.kind {
            NodeKind::MathExpressionBlock | NodeKind::MathExpressionInline => {
                if !cx.is_active(node) {
                    let display = node.kind == NodeKind::MathExpressionBlock;
                    out.add(Decoration::replace(
                        node.range(),
                        Widget::math(expression(cx, node), display),
                        display,
                    ));
                }
                Walk::Skip
            }
            // Rendered tables carry their own math.
            NodeKind::Table | NodeKind::DirectiveTable if !cx.is_active(node) => Walk::Skip,
            NodeKind::FencedCode | NodeKind::InlineCode | NodeKind::Frontmatter => Walk::Skip,
            _ => Walk::Descend,
        });
    out.finish()
}
