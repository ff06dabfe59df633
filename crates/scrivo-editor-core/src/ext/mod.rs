//! Decoration extensions.
//!
//! Each extension is a pure function from a [`DecorateContext`] to a
//! [`DecorationSet`](crate::DecorationSet). Extensions walk the tree with a
//! visitor that accumulates into a builder; none of them keep state between
//! runs.

pub mod blockquote;
pub mod code;
pub mod emphasis;
pub mod frontmatter;
pub mod gutter;
pub mod heading;
pub mod hr;
pub mod image;
pub mod math;
pub mod table;
pub mod task;

use std::ops::Range;

use crate::active;
use crate::config::ExtensionConfig;
use crate::document::Document;
use crate::syntax::{SyntaxNode, SyntaxTree};
use crate::types::{Selection, Viewport};

/// Inputs shared by every extension.
#[derive(Debug, Clone, Copy)]
pub struct DecorateContext<'a> {
    pub tree: &'a SyntaxTree,
    pub doc: &'a Document,
    pub selection: Selection,
    pub viewport: Viewport,
    pub config: &'a ExtensionConfig,
}

impl<'a> DecorateContext<'a> {
    pub fn text(&self) -> &'a str {
        self.doc.text()
    }

    pub fn slice(&self, range: Range<usize>) -> &'a str {
        self.doc.text().get(range).unwrap_or_default()
    }

    pub fn is_active(&self, node: &SyntaxNode) -> bool {
        active::node_is_active(node, self.selection)
    }

    /// The whole document, for extensions that are not viewport scoped.
    pub fn everything(&self) -> Range<usize> {
        0..self.doc.len()
    }
}

/// Start offsets of the lines `range` spans.
pub(crate) fn line_starts(text: &str, range: Range<usize>) -> Vec<usize> {
    let mut starts = vec![range.start];
    let Some(slice) = text.get(range.clone()) else {
        return starts;
    };
    starts.extend(
        slice
            .match_indices('\n')
            .map(|(off, _)| range.start + off + 1)
            .filter(|&start| start <= range.end),
    );
    starts
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use crate::decoration::{DecorationKind, DecorationSet};

    pub(crate) struct Fixture {
        pub doc: Document,
        pub tree: SyntaxTree,
        pub config: ExtensionConfig,
    }

    impl Fixture {
        pub fn new(text: &str) -> Self {
            Self {
                doc: Document::new(text),
                tree: SyntaxTree::parse(text),
                config: ExtensionConfig::default(),
            }
        }

        pub fn cx(&self, caret: usize) -> DecorateContext<'_> {
            self.cx_sel(Selection::collapsed(caret))
        }

        pub fn cx_sel(&self, selection: Selection) -> DecorateContext<'_> {
            DecorateContext {
                tree: &self.tree,
                doc: &self.doc,
                selection,
                viewport: Viewport::whole(self.doc.len()),
                config: &self.config,
            }
        }
    }

    /// Compact one-line-per-decoration listing for snapshots.
    pub(crate) fn listing(set: &DecorationSet) -> Vec<String> {
        set.iter()
            .map(|d| match &d.kind {
                DecorationKind::Mark { class } => format!("mark {}..{} {class}", d.from, d.to),
                DecorationKind::Line { class } => format!("line {} {class}", d.from),
                DecorationKind::Widget { widget, side, .. } => {
                    format!("widget {} {side:?} {:?}", d.from, widget.id().kind)
                }
                DecorationKind::Replace { widget: None, .. } => {
                    format!("hide {}..{}", d.from, d.to)
                }
                DecorationKind::Replace {
                    widget: Some(widget),
                    ..
                } => format!("replace {}..{} {:?}", d.from, d.to, widget.id().kind),
            })
            .collect()
    }
}
