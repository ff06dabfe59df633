//! Pipe and directive tables, replaced by rendered HTML while inactive.

use smol_str::SmolStr;

use super::DecorateContext;
use crate::decoration::{Decoration, DecorationBuilder, DecorationSet};
use crate::syntax::{NodeKind, SyntaxNode, Walk};
use crate::widget::{TableSyntax, Widget};

pub fn decorations(cx: &DecorateContext) -> DecorationSet {
    let mut out = DecorationBuilder::new();
    cx.tree
        .iterate(cx.everything(), &mut |node: &SyntaxNode| {
            let syntax = match node.kind {
                NodeKind::Table => TableSyntax::Pipe,
                NodeKind::DirectiveTable => TableSyntax::Directive,
                NodeKind::Document
                | NodeKind::Blockquote
                | NodeKind::BulletList
                | NodeKind::OrderedList
                | NodeKind::ListItem => return Walk::Descend,
                _ => return Walk::Skip,
            };
            if !cx.is_active(node) {
                out.add(Decoration::replace(
                    node.range(),
                    Widget::Table {
                        source: SmolStr::new(cx.slice(node.range())),
                        syntax,
                    },
                    true,
                ));
            }
            Walk::Skip
        });
    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ext::test_util::{Fixture, listing};

    const DOC: &str = "| a |\n|---|\n| 1 |\n\n:::table\nx | y\n:::\n\nend";

    #[test]
    fn both_syntaxes_render_when_inactive() {
        let fx = Fixture::new(DOC);
        let set = decorations(&fx.cx(DOC.len()));
        assert_eq!(
            listing(&set),
            vec!["replace 0..17 Table(Pipe)", "replace 19..37 Table(Directive)"]
        );
        let (_, first) = set.widgets().next().unwrap();
        assert_eq!(
            first,
            &Widget::Table {
                source: "| a |\n|---|\n| 1 |".into(),
                syntax: TableSyntax::Pipe,
            }
        );
    }

    #[test]
    fn active_table_reverts_to_source() {
        let fx = Fixture::new(DOC);
        assert_eq!(
            listing(&decorations(&fx.cx(25))),
            vec!["replace 0..17 Table(Pipe)"]
        );
    }
}
