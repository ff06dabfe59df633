//! Task list checkboxes.
//!
//! An inactive `[ ]` / `[x]` marker is replaced by a checkbox bound to the
//! marker's byte range. Clicking it produces [`toggle_edit`], which rewrites
//! those three bytes and nothing else.

use super::DecorateContext;
use crate::decoration::{Decoration, DecorationBuilder, DecorationSet};
use crate::syntax::{NodeKind, SyntaxNode, Walk};
use crate::types::Edit;
use crate::widget::Widget;

const WIDTH: usize = 3;

pub fn is_checked(marker: &str) -> bool {
    matches!(marker, "[x]" | "[X]")
}

pub fn decorations(cx: &DecorateContext) -> DecorationSet {
    let mut out = DecorationBuilder::new();
    cx.tree
        .iterate(cx.everything(), &mut |node: &SyntaxNode| match node.kind {
            NodeKind::TaskMarker => {
                if !cx.is_active(node) {
                    let checked = is_checked(cx.slice(node.range()));
                    out.add(Decoration::replace(
                        node.range(),
                        Widget::Checkbox {
                            from: node.from,
                            to: node.to,
                            checked,
                        },
                        false,
                    ));
                }
                Walk::Skip
            }
            NodeKind::Document
            | NodeKind::Blockquote
            | NodeKind::BulletList
            | NodeKind::OrderedList
            | NodeKind::ListItem
            | NodeKind::Task => Walk::Descend,
            _ => Walk::Skip,
        });
    out.finish()
}

/// The edit that flips the marker starting at `from`, if there is one.
pub fn toggle_edit(text: &str, from: usize) -> Option<Edit> {
    let marker = text.get(from..from + WIDTH)?;
    let replacement = match marker {
        "[ ]" => "[x]",
        "[x]" | "[X]" => "[ ]",
        _ => return None,
    };
    Some(Edit::replace(from..from + WIDTH, replacement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ext::test_util::{Fixture, listing};

    #[test]
    fn markers_become_checkboxes() {
        let fx = Fixture::new("- [ ] open\n- [x] done\n\nend");
        let set = decorations(&fx.cx(24));
        assert_eq!(
            listing(&set),
            vec!["replace 2..5 Checkbox", "replace 13..16 Checkbox"]
        );
        let boxes: Vec<_> = set.widgets().map(|(_, w)| w.clone()).collect();
        assert_eq!(
            boxes,
            vec![
                Widget::Checkbox {
                    from: 2,
                    to: 5,
                    checked: false
                },
                Widget::Checkbox {
                    from: 13,
                    to: 16,
                    checked: true
                },
            ]
        );
    }

    #[test]
    fn caret_on_marker_shows_source() {
        let fx = Fixture::new("- [ ] open\n- [x] done\n\nend");
        assert_eq!(
            listing(&decorations(&fx.cx(3))),
            vec!["replace 13..16 Checkbox"]
        );
    }

    #[test]
    fn toggle_flips_three_bytes() {
        let text = "- [ ] a\n- [X] b";
        assert_eq!(toggle_edit(text, 2), Some(Edit::replace(2..5, "[x]")));
        assert_eq!(toggle_edit(text, 10), Some(Edit::replace(10..13, "[ ]")));
        assert_eq!(toggle_edit(text, 0), None);
        assert_eq!(toggle_edit(text, 14), None);
    }
}
