//! Emphasis, strong, strikethrough and links.
//!
//! Styles go on the whole node. Delimiters (and a link's destination) are
//! collected into a separate hidden layer; an active node is left alone
//! together with everything inside it.

use super::DecorateContext;
use crate::decoration::{DecorationBuilder, DecorationSet};
use crate::syntax::{NodeKind, SyntaxNode, Visitor, Walk};

struct EmphasisVisitor<'a> {
    cx: &'a DecorateContext<'a>,
    styles: DecorationBuilder,
    hidden: DecorationBuilder,
}

impl Visitor for EmphasisVisitor<'_> {
    fn enter(&mut self, node: &SyntaxNode) -> Walk {
        let class = match node.kind {
            NodeKind::Emphasis => "md-emphasis",
            NodeKind::StrongEmphasis => "md-strong",
            NodeKind::Strikethrough => "md-strikethrough",
            NodeKind::Link => "md-link",
            // Owned by other extensions, or never holds emphasis.
            NodeKind::Image
            | NodeKind::InlineCode
            | NodeKind::FencedCode
            | NodeKind::Frontmatter
            | NodeKind::MathExpressionBlock
            | NodeKind::MathExpressionInline => return Walk::Skip,
            _ => return Walk::Descend,
        };
        self.styles.mark(node.range(), class);
        if self.cx.is_active(node) {
            return Walk::Skip;
        }
        for child in &node.children {
            if matches!(
                child.kind,
                NodeKind::EmphasisMark
                    | NodeKind::StrikethroughMark
                    | NodeKind::LinkMark
                    | NodeKind::Url
            ) {
                self.hidden.hide(child.range());
            }
        }
        Walk::Descend
    }
}

pub fn decorations(cx: &DecorateContext) -> DecorationSet {
    let mut visitor = EmphasisVisitor {
        cx,
        styles: DecorationBuilder::new(),
        hidden: DecorationBuilder::new(),
    };
    cx.tree.iterate(cx.everything(), &mut visitor);
    DecorationSet::merge([&visitor.styles.finish(), &visitor.hidden.finish()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ext::test_util::{Fixture, listing};

    #[test]
    fn inactive_emphasis_hides_delimiters() {
        let fx = Fixture::new("a *b* **c**");
        insta::assert_debug_snapshot!(listing(&decorations(&fx.cx(0))), @r#"
        [
            "hide 2..3",
            "mark 2..5 md-emphasis",
            "hide 4..5",
            "hide 6..8",
            "mark 6..11 md-strong",
            "hide 9..11",
        ]
        "#);
    }

    #[test]
    fn active_node_shows_delimiters_and_stops_descent() {
        let fx = Fixture::new("***a*** x");
        // Caret on the inner text: both nodes are active.
        let set = decorations(&fx.cx(3));
        assert_eq!(listing(&set), vec!["mark 0..7 md-emphasis"]);
    }

    #[test]
    fn links_hide_brackets_and_destination() {
        let fx = Fixture::new("[go](http://x) y");
        let set = decorations(&fx.cx(16));
        assert_eq!(
            listing(&set),
            vec![
                "hide 0..1",
                "mark 0..14 md-link",
                "hide 3..4",
                "hide 4..5",
                "hide 5..13",
                "hide 13..14",
            ]
        );
    }

    #[test]
    fn strikethrough_and_images_left_to_their_owners() {
        let fx = Fixture::new("~~no~~ ![*a*](p.png)");
        let set = decorations(&fx.cx(20));
        assert_eq!(
            listing(&set),
            vec!["hide 0..2", "mark 0..6 md-strikethrough", "hide 4..6"]
        );
    }
}
