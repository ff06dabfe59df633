use super::*;
use crate::document::Document;
use crate::types::Edit;

fn assert_well_formed(node: &SyntaxNode) {
    let mut prev_end = node.from;
    for child in &node.children {
        assert!(
            node.from <= child.from && child.to <= node.to,
            "{:?} {:?} escapes parent {:?} {:?}",
            child.kind,
            child.range(),
            node.kind,
            node.range()
        );
        assert!(
            prev_end <= child.from,
            "{:?} {:?} overlaps previous sibling",
            child.kind,
            child.range()
        );
        prev_end = child.to;
        assert_well_formed(child);
    }
}

fn parse(text: &str) -> SyntaxTree {
    let tree = SyntaxTree::parse(text);
    assert_well_formed(tree.root());
    tree
}

fn kinds(node: &SyntaxNode) -> Vec<NodeKind> {
    node.children.iter().map(|c| c.kind).collect()
}

fn ranges(tree: &SyntaxTree, kind: NodeKind) -> Vec<Range<usize>> {
    tree.nodes_of(kind).iter().map(|n| n.range()).collect()
}

#[test]
fn unterminated_math_block_is_paragraph_text() {
    let tree = parse("$$foo\nbar");
    assert_eq!(kinds(tree.root()), vec![NodeKind::Paragraph]);
    assert_eq!(tree.root().children[0].range(), 0..9);
    assert!(tree.nodes_of(NodeKind::MathExpressionBlock).is_empty());
    assert!(tree.nodes_of(NodeKind::MathExpressionInline).is_empty());
}

#[test]
fn math_block_closes_on_later_line() {
    let tree = parse("$$\nx^2\n$$\n");
    let math = tree.nodes_of(NodeKind::MathExpressionBlock);
    assert_eq!(math.len(), 1);
    assert_eq!(math[0].range(), 0..9);
    assert_eq!(ranges(&tree, NodeKind::MathMark), vec![0..2, 7..9]);
}

#[test]
fn math_block_on_one_line() {
    let tree = parse("$$a+b$$");
    assert_eq!(ranges(&tree, NodeKind::MathExpressionBlock), vec![0..7]);
}

#[test]
fn heading_and_emphasis() {
    let tree = parse("# Title\n\nSome *em* and **strong**.");
    assert_eq!(
        kinds(tree.root()),
        vec![NodeKind::Heading(1), NodeKind::Paragraph]
    );
    assert_eq!(ranges(&tree, NodeKind::HeaderMark), vec![0..1]);
    assert_eq!(ranges(&tree, NodeKind::Emphasis), vec![14..18]);
    assert_eq!(ranges(&tree, NodeKind::StrongEmphasis), vec![23..33]);
    assert_eq!(
        ranges(&tree, NodeKind::EmphasisMark),
        vec![14..15, 17..18, 23..25, 31..33]
    );
}

#[test]
fn nested_emphasis_shares_a_delimiter_run() {
    let tree = parse("***a***");
    let em = tree.nodes_of(NodeKind::Emphasis);
    assert_eq!(em.len(), 1);
    assert_eq!(em[0].range(), 0..7);
    assert_eq!(
        kinds(em[0]),
        vec![
            NodeKind::EmphasisMark,
            NodeKind::StrongEmphasis,
            NodeKind::EmphasisMark
        ]
    );
    assert_eq!(ranges(&tree, NodeKind::StrongEmphasis), vec![1..6]);
}

#[test]
fn intraword_underscores_are_literal() {
    let tree = parse("snake_case_name and ~~gone~~");
    assert!(tree.nodes_of(NodeKind::Emphasis).is_empty());
    assert_eq!(ranges(&tree, NodeKind::Strikethrough), vec![20..28]);
}

#[test]
fn code_spans_hide_emphasis() {
    let tree = parse("`a*b*` and *c*");
    assert_eq!(ranges(&tree, NodeKind::InlineCode), vec![0..6]);
    assert_eq!(ranges(&tree, NodeKind::CodeMark), vec![0..1, 5..6]);
    assert_eq!(ranges(&tree, NodeKind::Emphasis), vec![11..14]);
}

#[test]
fn inline_math_rules() {
    let tree = parse("$x$ costs $5 and $6");
    assert_eq!(ranges(&tree, NodeKind::MathExpressionInline), vec![0..3]);
}

#[test]
fn link_text_is_parsed() {
    let tree = parse("[**bold** link](http://x)");
    assert_eq!(ranges(&tree, NodeKind::Link), vec![0..25]);
    assert_eq!(ranges(&tree, NodeKind::StrongEmphasis), vec![1..9]);
    assert_eq!(ranges(&tree, NodeKind::Url), vec![16..24]);
}

#[test]
fn blockquote_marks_nest_without_overlap() {
    let tree = parse("> a\n> b");
    let quote = tree.nodes_of(NodeKind::Blockquote);
    assert_eq!(quote.len(), 1);
    assert_eq!(quote[0].range(), 0..7);
    assert_eq!(ranges(&tree, NodeKind::QuoteMark), vec![0..1, 4..5]);
    assert_eq!(ranges(&tree, NodeKind::Paragraph), vec![2..7]);
}

#[test]
fn task_lists_and_ordered_lists() {
    let tree = parse("- [ ] todo\n- [x] done\n\n1. one\n2. two");
    assert_eq!(ranges(&tree, NodeKind::BulletList), vec![0..21]);
    assert_eq!(ranges(&tree, NodeKind::OrderedList), vec![23..36]);
    assert_eq!(tree.nodes_of(NodeKind::ListItem).len(), 4);
    assert_eq!(ranges(&tree, NodeKind::Task), vec![2..10, 13..21]);
    assert_eq!(ranges(&tree, NodeKind::TaskMarker), vec![2..5, 13..16]);
    assert_eq!(ranges(&tree, NodeKind::ListMark), vec![0..1, 11..12, 23..25, 30..32]);
}

#[test]
fn nested_list_by_indentation() {
    let tree = parse("- a\n  - b");
    assert_eq!(ranges(&tree, NodeKind::BulletList), vec![0..9, 6..9]);
    assert_eq!(ranges(&tree, NodeKind::ListItem), vec![0..9, 6..9]);
}

#[test]
fn fenced_code_parts() {
    let tree = parse("```rust\nfn main() {}\n```\n");
    let code = tree.nodes_of(NodeKind::FencedCode);
    assert_eq!(code.len(), 1);
    assert_eq!(code[0].range(), 0..24);
    assert_eq!(
        kinds(code[0]),
        vec![
            NodeKind::CodeMark,
            NodeKind::CodeInfo,
            NodeKind::CodeText,
            NodeKind::CodeMark
        ]
    );
    assert_eq!(ranges(&tree, NodeKind::CodeInfo), vec![3..7]);
    assert_eq!(ranges(&tree, NodeKind::CodeText), vec![8..20]);
}

#[test]
fn unterminated_fence_runs_to_end() {
    let tree = parse("```\ncode");
    assert_eq!(ranges(&tree, NodeKind::FencedCode), vec![0..8]);
    assert_eq!(ranges(&tree, NodeKind::CodeText), vec![4..8]);
}

#[test]
fn frontmatter_only_at_document_start() {
    let tree = parse("---\ntitle: x\n---\n# H");
    assert_eq!(
        kinds(tree.root()),
        vec![NodeKind::Frontmatter, NodeKind::Heading(1)]
    );
    assert_eq!(tree.root().children[0].range(), 0..16);

    let tree = parse("---\nno close");
    assert_eq!(
        kinds(tree.root()),
        vec![NodeKind::HorizontalRule, NodeKind::Paragraph]
    );
}

#[test]
fn pipe_table_with_image_cell() {
    let tree = parse("| a | b |\n|---|---|\n| ![x](p.png) | 2 |");
    let table = tree.nodes_of(NodeKind::Table);
    assert_eq!(table.len(), 1);
    assert_eq!(table[0].range(), 0..39);
    assert_eq!(
        kinds(table[0]),
        vec![
            NodeKind::TableHeader,
            NodeKind::TableDelimiter,
            NodeKind::TableRow
        ]
    );
    assert_eq!(ranges(&tree, NodeKind::Image), vec![22..33]);
    assert_eq!(ranges(&tree, NodeKind::Url), vec![27..32]);
}

#[test]
fn directive_table_needs_closing_fence() {
    let tree = parse(":::table\na | b\n1 | 2\n:::");
    let table = tree.nodes_of(NodeKind::DirectiveTable);
    assert_eq!(table.len(), 1);
    assert_eq!(table[0].range(), 0..24);
    assert_eq!(ranges(&tree, NodeKind::TableRow), vec![9..14, 15..20]);
    assert_eq!(ranges(&tree, NodeKind::TableDelimiter), vec![0..8, 21..24]);

    let tree = parse(":::table\na | b");
    assert!(tree.nodes_of(NodeKind::DirectiveTable).is_empty());
    assert_eq!(kinds(tree.root()), vec![NodeKind::Paragraph]);
}

#[test]
fn setext_heading() {
    let tree = parse("Title\n===");
    assert_eq!(kinds(tree.root()), vec![NodeKind::SetextHeading(1)]);
    assert_eq!(ranges(&tree, NodeKind::HeaderMark), vec![6..9]);
}

#[test]
fn iterate_prunes_outside_range() {
    let tree = parse("# A\n\n# B\n\n# C");
    let mut seen = Vec::new();
    tree.iterate(5..8, &mut |node: &SyntaxNode| {
        if node.kind.is_heading() {
            seen.push(node.from);
        }
        Walk::Descend
    });
    assert_eq!(seen, vec![5]);
}

#[test]
fn enclosing_finds_innermost_match() {
    let tree = parse("> *x* ![a](b.png)");
    let image = tree.enclosing(12..12, |k| k == NodeKind::Image);
    assert_eq!(image.map(|n| n.range()), Some(6..17));
    let quote = tree.enclosing(3..3, |k| k == NodeKind::Blockquote);
    assert_eq!(quote.map(|n| n.range()), Some(0..17));
    assert!(tree.enclosing(3..3, |k| k == NodeKind::Image).is_none());
}

#[test]
fn update_reuses_untouched_prefix() {
    let mut doc = Document::new("# One\n\npara one\n\npara two\n");
    let tree = SyntaxTree::parse(doc.text());
    let changes = doc.apply(&[Edit::insert(26, "more")]).unwrap();
    let updated = tree.update(doc.text(), &changes);
    assert_eq!(updated.reused_blocks(), 2);
    assert_eq!(updated.root(), SyntaxTree::parse(doc.text()).root());
}

#[test]
fn update_matches_full_parse_across_edits() {
    let mut doc = Document::new(
        "$$ a\n\ntext *em*\n\n- item\n  more\n\n| a |\n|---|\n\n```\ncode\n",
    );
    let mut tree = SyntaxTree::parse(doc.text());
    let len = doc.len();
    let steps = vec![
        vec![Edit::insert(len, "```\n")],
        vec![Edit::insert(0, "# ")],
        vec![Edit::insert(doc.len() + 6, "\n$$\n")],
        vec![Edit::delete(0..2)],
        vec![Edit::replace(14..16, "**")],
        vec![Edit::insert(25, "\n---\n")],
    ];
    for (i, edits) in steps.into_iter().enumerate() {
        let edits: Vec<Edit> = edits
            .into_iter()
            .map(|mut e| {
                let len = doc.len();
                e.range = e.range.start.min(len)..e.range.end.min(len);
                e
            })
            .collect();
        let changes = doc.apply(&edits).unwrap();
        tree = tree.update(doc.text(), &changes);
        let full = SyntaxTree::parse(doc.text());
        assert_eq!(tree.root(), full.root(), "step {i}: {:?}", doc.text());
        assert_well_formed(tree.root());
    }
}

#[test]
fn closing_math_far_below_reparses_from_the_top() {
    let mut doc = Document::new("$$ a\n\nplain\n\nmore\n");
    let tree = SyntaxTree::parse(doc.text());
    assert!(tree.nodes_of(NodeKind::MathExpressionBlock).is_empty());

    let len = doc.len();
    let changes = doc.apply(&[Edit::insert(len, "$$\n")]).unwrap();
    let updated = tree.update(doc.text(), &changes);
    assert_eq!(updated.reused_blocks(), 0);
    assert_eq!(updated.nodes_of(NodeKind::MathExpressionBlock).len(), 1);
    assert_eq!(updated.root(), SyntaxTree::parse(doc.text()).root());
}
