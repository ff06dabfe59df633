//! Active-range policy.
//!
//! A node is *active* when the selection touches it; active nodes show their
//! raw markup. Every extension asks through these predicates so they agree
//! on boundaries.

use std::ops::Range;

use smol_str::SmolStr;

use crate::syntax::{NodeKind, SyntaxNode, SyntaxTree};
use crate::types::Selection;

/// The selection intersects `range`, boundaries inclusive.
pub fn is_active(range: Range<usize>, selection: Selection) -> bool {
    selection.start() <= range.end && selection.end() >= range.start
}

/// The selection lies within `range` shrunk by `marker_width` on both sides.
pub fn is_caret_inside(range: Range<usize>, selection: Selection, marker_width: usize) -> bool {
    selection.start() >= range.start + marker_width
        && selection.end() + marker_width <= range.end
}

pub fn node_is_active(node: &SyntaxNode, selection: Selection) -> bool {
    is_active(node.range(), selection)
}

/// The editable path text of an image, between `(` and `)`.
pub fn image_path_range(image: &SyntaxNode) -> Option<Range<usize>> {
    image.child(NodeKind::Url).map(SyntaxNode::range)
}

/// The caret sits in the image's path, not on its brackets.
pub fn is_caret_in_image_path(image: &SyntaxNode, selection: Selection) -> bool {
    match image_path_range(image) {
        // Widen to the parens so a caret at either end of the path counts.
        Some(path) => is_caret_inside(path.start.saturating_sub(1)..path.end + 1, selection, 1),
        None => false,
    }
}

/// What the overlay needs to know about the image around the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFocus {
    pub image: Range<usize>,
    pub path: Range<usize>,
    pub src: SmolStr,
    pub caret_in_path: bool,
}

/// Innermost image node containing the selection, over the whole document.
pub fn image_at(tree: &SyntaxTree, text: &str, selection: Selection) -> Option<ImageFocus> {
    let image = tree.enclosing(selection.to_range(), |kind| kind == NodeKind::Image)?;
    let path = image_path_range(image)?;
    Some(ImageFocus {
        image: image.range(),
        src: SmolStr::new(text.get(path.clone()).unwrap_or_default()),
        path,
        caret_in_path: is_caret_in_image_path(image, selection),
    })
}
