//! Blockquotes. Nothing is hidden; the body and its `>` markers switch to
//! an active class variant while the caret is inside.

use super::DecorateContext;
use crate::decoration::{DecorationBuilder, DecorationSet};
use crate::syntax::{NodeKind, SyntaxNode, Visitor, Walk};

struct QuoteVisitor<'a> {
    cx: &'a DecorateContext<'a>,
    out: DecorationBuilder,
    /// Active state of each enclosing blockquote.
    stack: Vec<bool>,
}

impl Visitor for QuoteVisitor<'_> {
    fn enter(&mut self, node: &SyntaxNode) -> Walk {
        match node.kind {
            NodeKind::Blockquote => {
                let active = self.cx.is_active(node);
                self.stack.push(active);
                let class = if active {
                    "md-blockquote md-blockquote-active"
                } else {
                    "md-blockquote"
                };
                self.out.mark(node.range(), class);
                Walk::Descend
            }
            NodeKind::QuoteMark => {
                let class = match self.stack.last() {
                    Some(true) => "md-quote-mark md-quote-mark-active",
                    _ => "md-quote-mark",
                };
                self.out.mark(node.range(), class);
                Walk::Skip
            }
            NodeKind::FencedCode | NodeKind::Frontmatter if self.stack.is_empty() => Walk::Skip,
            _ => Walk::Descend,
        }
    }

    fn leave(&mut self, node: &SyntaxNode) {
        if node.kind == NodeKind::Blockquote {
            self.stack.pop();
        }
    }
}

pub fn decorations(cx: &DecorateContext) -> DecorationSet {
    let mut visitor = QuoteVisitor {
        cx,
        out: DecorationBuilder::new(),
        stack: Vec::new(),
    };
    cx.tree.iterate(cx.everything(), &mut visitor);
    visitor.out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ext::test_util::{Fixture, listing};

    #[test]
    fn marks_body_and_markers() {
        let fx = Fixture::new("> a\n> b\n\nx");
        insta::assert_debug_snapshot!(listing(&decorations(&fx.cx(10))), @r#"
        [
            "mark 0..7 md-blockquote",
            "mark 0..1 md-quote-mark",
            "mark 4..5 md-quote-mark",
        ]
        "#);
    }

    #[test]
    fn nested_markers_follow_their_own_quote() {
        let fx = Fixture::new("> a\n>\n> > b\n\nx");
        // Caret in the outer quote's first line only.
        let set = decorations(&fx.cx(2));
        let listed = listing(&set);
        assert_eq!(listed[0], "mark 0..11 md-blockquote md-blockquote-active");
        assert!(listed.contains(&"mark 0..1 md-quote-mark md-quote-mark-active".to_string()));
        assert!(listed.contains(&"mark 8..11 md-blockquote".to_string()));
        assert!(listed.contains(&"mark 8..9 md-quote-mark".to_string()));
    }
}
