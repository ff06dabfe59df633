//! Syntax tree provider.
//!
//! A hand-written markdown parser producing a concrete, range-addressed tree
//! with the extensions the editor decorates: math (`$$...$$`, `$...$`),
//! frontmatter, pipe tables and `:::table` directive tables.
//!
//! Parsing never fails. Unterminated constructs degrade to paragraph text.
//! [`SyntaxTree::update`] reuses the leading top-level blocks an edit cannot
//! have influenced and reparses the rest, so the result always equals a full
//! parse of the new text.

mod block;
mod inline;

use std::ops::Range;

use crate::document::ChangeSet;

/// Node types produced by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Paragraph,
    /// ATX heading, level 1-6.
    Heading(u8),
    /// Underlined heading, level 1 (`===`) or 2 (`---`).
    SetextHeading(u8),
    HeaderMark,
    Blockquote,
    QuoteMark,
    FencedCode,
    CodeMark,
    CodeInfo,
    CodeText,
    BulletList,
    OrderedList,
    ListItem,
    ListMark,
    Task,
    TaskMarker,
    HorizontalRule,
    Table,
    TableHeader,
    TableDelimiter,
    TableRow,
    DirectiveTable,
    MathExpressionBlock,
    MathExpressionInline,
    MathMark,
    Frontmatter,
    Emphasis,
    StrongEmphasis,
    EmphasisMark,
    Strikethrough,
    StrikethroughMark,
    InlineCode,
    Image,
    Link,
    LinkMark,
    Url,
}

impl NodeKind {
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            NodeKind::Heading(level) | NodeKind::SetextHeading(level) => Some(*level),
            _ => None,
        }
    }

    pub fn is_heading(&self) -> bool {
        self.heading_level().is_some()
    }

    pub fn is_table(&self) -> bool {
        matches!(self, NodeKind::Table | NodeKind::DirectiveTable)
    }

    /// Leaf tokens: markers and raw text spans that never hold children.
    pub fn is_token(&self) -> bool {
        matches!(
            self,
            NodeKind::HeaderMark
                | NodeKind::QuoteMark
                | NodeKind::CodeMark
                | NodeKind::CodeInfo
                | NodeKind::CodeText
                | NodeKind::ListMark
                | NodeKind::TaskMarker
                | NodeKind::HorizontalRule
                | NodeKind::TableDelimiter
                | NodeKind::MathMark
                | NodeKind::EmphasisMark
                | NodeKind::StrikethroughMark
                | NodeKind::LinkMark
                | NodeKind::Url
        )
    }

    pub fn is_math(&self) -> bool {
        matches!(
            self,
            NodeKind::MathExpressionBlock | NodeKind::MathExpressionInline
        )
    }
}

/// A typed, range-addressed element of the tree.
///
/// Child ranges are contained in the parent range and siblings never
/// overlap; children are sorted by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub from: usize,
    pub to: usize,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, from: usize, to: usize, children: Vec<SyntaxNode>) -> Self {
        Self {
            kind,
            from,
            to,
            children,
        }
    }

    pub fn leaf(kind: NodeKind, from: usize, to: usize) -> Self {
        Self::new(kind, from, to, Vec::new())
    }

    pub fn range(&self) -> Range<usize> {
        self.from..self.to
    }

    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    /// First direct child of the given kind.
    pub fn child(&self, kind: NodeKind) -> Option<&SyntaxNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// Direct children of the given kind.
    pub fn children_of(&self, kind: NodeKind) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    fn walk<V: Visitor + ?Sized>(&self, range: &Range<usize>, visitor: &mut V) {
        if self.to < range.start || self.from > range.end {
            return;
        }
        if visitor.enter(self) == Walk::Descend {
            for child in &self.children {
                child.walk(range, visitor);
            }
        }
        visitor.leave(self);
    }
}

/// Whether a visitor wants to see a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Descend,
    Skip,
}

/// Pre-order tree visitor.
///
/// `leave` runs after a node's subtree, whether or not it was descended.
pub trait Visitor {
    fn enter(&mut self, node: &SyntaxNode) -> Walk;

    fn leave(&mut self, _node: &SyntaxNode) {}
}

impl<F> Visitor for F
where
    F: FnMut(&SyntaxNode) -> Walk,
{
    fn enter(&mut self, node: &SyntaxNode) -> Walk {
        self(node)
    }
}

/// Per top-level block bookkeeping for incremental reparses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BlockMeta {
    /// Furthest offset whose content influenced how this block parsed.
    pub lookahead: usize,
    /// Start of the line following the block.
    pub next_line: usize,
}

/// Syntax tree over one document version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    root: SyntaxNode,
    blocks: Vec<BlockMeta>,
    reused: usize,
}

impl SyntaxTree {
    /// Parse a whole document.
    pub fn parse(text: &str) -> Self {
        let parsed = block::parse_blocks(text, 0);
        Self::assemble(text, Vec::new(), Vec::new(), parsed, 0)
    }

    /// Produce the tree for `text`, the result of applying `changes` to the
    /// document this tree was parsed from.
    pub fn update(&self, text: &str, changes: &ChangeSet) -> Self {
        let Some(touched) = changes.touched_a() else {
            return self.clone();
        };
        let edit_from = touched.start;
        let reuse = self
            .blocks
            .iter()
            .take_while(|meta| meta.lookahead < edit_from)
            .count();
        let resume = match reuse {
            0 => 0,
            n => self.blocks[n - 1].next_line,
        };

        let parsed = block::parse_blocks(text, resume);
        tracing::debug!(
            target: "scrivo::syntax",
            reused = reuse,
            reparsed = parsed.len(),
            resume,
            "incremental parse"
        );
        Self::assemble(
            text,
            self.root.children[..reuse].to_vec(),
            self.blocks[..reuse].to_vec(),
            parsed,
            reuse,
        )
    }

    fn assemble(
        text: &str,
        mut children: Vec<SyntaxNode>,
        mut blocks: Vec<BlockMeta>,
        parsed: Vec<block::ParsedBlock>,
        reused: usize,
    ) -> Self {
        for block in parsed {
            children.push(block.node);
            blocks.push(block.meta);
        }
        Self {
            root: SyntaxNode::new(NodeKind::Document, 0, text.len(), children),
            blocks,
            reused,
        }
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.root.to
    }

    pub fn is_empty(&self) -> bool {
        self.root.to == 0
    }

    /// Number of top-level blocks carried over by the last [`update`](Self::update).
    pub fn reused_blocks(&self) -> usize {
        self.reused
    }

    /// Visit every node touching `range` (boundaries inclusive), pre-order.
    pub fn iterate<V: Visitor + ?Sized>(&self, range: Range<usize>, visitor: &mut V) {
        self.root.walk(&range, visitor);
    }

    /// Innermost node matching `pred` that contains `range`.
    pub fn enclosing(
        &self,
        range: Range<usize>,
        pred: impl Fn(NodeKind) -> bool,
    ) -> Option<&SyntaxNode> {
        let mut found = None;
        let mut node = &self.root;
        loop {
            if pred(node.kind) {
                found = Some(node);
            }
            let next = node
                .children
                .iter()
                .find(|c| c.from <= range.start && range.end <= c.to);
            match next {
                Some(child) => node = child,
                None => return found,
            }
        }
    }

    /// All nodes of a kind, in document order.
    pub fn nodes_of(&self, kind: NodeKind) -> Vec<&SyntaxNode> {
        fn collect<'a>(node: &'a SyntaxNode, kind: NodeKind, out: &mut Vec<&'a SyntaxNode>) {
            if node.kind == kind {
                out.push(node);
            }
            for child in &node.children {
                collect(child, kind, out);
            }
        }
        let mut out = Vec::new();
        collect(&self.root, kind, &mut out);
        out
    }
}

/// Insert `node` under the deepest sibling that contains it, keeping
/// children sorted by position.
pub(crate) fn insert_node(siblings: &mut Vec<SyntaxNode>, node: SyntaxNode) {
    let container = siblings
        .iter()
        .position(|s| !s.kind.is_token() && s.from <= node.from && node.to <= s.to);
    match container {
        Some(idx) => insert_node(&mut siblings[idx].children, node),
        None => {
            let at = siblings.partition_point(|s| s.from <= node.from);
            siblings.insert(at, node);
        }
    }
}

#[cfg(test)]
mod tests;
