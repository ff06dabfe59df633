//! Line numbers for the inside of fenced code blocks.

use std::collections::BTreeMap;

use super::line_starts;
use crate::syntax::{NodeKind, SyntaxNode, SyntaxTree};

/// Map from the start offset of each interior code line to its 1-based
/// index within its block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeLineNumbers {
    lines: BTreeMap<usize, usize>,
}

impl CodeLineNumbers {
    pub fn compute(tree: &SyntaxTree, text: &str) -> Self {
        let mut lines = BTreeMap::new();
        for block in tree.nodes_of(NodeKind::FencedCode) {
            let starts = line_starts(text, block.range());
            let end = if is_closed(block) {
                starts.len() - 1
            } else {
                starts.len()
            };
            let interior = starts.get(1..end).unwrap_or_default();
            for (index, &start) in interior.iter().enumerate() {
                lines.insert(start, index + 1);
            }
        }
        Self { lines }
    }

    /// Number to show for the line starting at `line_from`.
    pub fn marker_at(&self, line_from: usize) -> Option<usize> {
        self.lines.get(&line_from).copied()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn is_closed(block: &SyntaxNode) -> bool {
    block.children_of(NodeKind::CodeMark).count() >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_lines_numbered_from_one() {
        let text = "intro\n\n```\na\nb\nc\n```\n\n```\nd\n```";
        let tree = SyntaxTree::parse(text);
        let numbers = CodeLineNumbers::compute(&tree, text);
        assert_eq!(numbers.marker_at(0), None);
        assert_eq!(numbers.marker_at(7), None);
        assert_eq!(numbers.marker_at(11), Some(1));
        assert_eq!(numbers.marker_at(13), Some(2));
        assert_eq!(numbers.marker_at(15), Some(3));
        assert_eq!(numbers.marker_at(17), None);
        assert_eq!(numbers.marker_at(26), Some(1));
        assert_eq!(numbers.len(), 4);
    }

    #[test]
    fn unclosed_block_numbers_to_the_end() {
        let text = "```\na\nb";
        let tree = SyntaxTree::parse(text);
        let numbers = CodeLineNumbers::compute(&tree, text);
        assert_eq!(numbers.marker_at(4), Some(1));
        assert_eq!(numbers.marker_at(6), Some(2));
        assert_eq!(numbers.len(), 2);
    }
}
