//! Thematic breaks.

use super::DecorateContext;
use crate::decoration::{Decoration, DecorationBuilder, DecorationSet};
use crate::syntax::{NodeKind, SyntaxNode, Walk};
use crate::widget::Widget;

pub fn decorations(cx: &DecorateContext) -> DecorationSet {
    let mut out = DecorationBuilder::new();
    cx.tree
        .iterate(cx.everything(), &mut |node: &SyntaxNode| match node.kind {
            NodeKind::HorizontalRule => {
                if !cx.is_active(node) {
                    out.add(Decoration::replace(
                        node.range(),
                        Widget::HorizontalRule,
                        false,
                    ));
                }
                Walk::Skip
            }
            NodeKind::Document | NodeKind::Blockquote => Walk::Descend,
            NodeKind::BulletList | NodeKind::OrderedList | NodeKind::ListItem => Walk::Descend,
            _ => Walk::Skip,
        });
    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ext::test_util::{Fixture, listing};

    #[test]
    fn rule_replaced_until_touched() {
        let fx = Fixture::new("a\n\n***\n\nb");
        assert_eq!(
            listing(&decorations(&fx.cx(0))),
            vec!["replace 3..6 HorizontalRule"]
        );
        assert!(decorations(&fx.cx(4)).is_empty());
    }

    #[test]
    fn setext_underline_is_not_a_rule() {
        let fx = Fixture::new("Title\n---\n\nx");
        assert!(decorations(&fx.cx(12)).is_empty());
    }
}
