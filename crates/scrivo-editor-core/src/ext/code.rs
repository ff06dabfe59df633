//! Inline code spans and fenced code blocks.

use smol_str::SmolStr;

use super::{DecorateContext, line_starts};
use crate::decoration::{Decoration, DecorationBuilder, DecorationSet, Side};
use crate::syntax::{NodeKind, SyntaxNode, Walk};
use crate::widget::Widget;

/// Icon name for a fence's language tag.
pub fn language_icon(language: &str) -> &'static str {
    match language.to_ascii_lowercase().as_str() {
        "rust" | "rs" => "rust",
        "python" | "py" => "python",
        "javascript" | "js" | "jsx" => "javascript",
        "typescript" | "ts" | "tsx" => "typescript",
        "html" => "html",
        "css" | "scss" => "css",
        "json" => "json",
        "yaml" | "yml" | "toml" => "settings",
        "bash" | "sh" | "zsh" | "shell" | "console" => "terminal",
        "c" | "h" | "cpp" | "c++" | "cc" => "cpp",
        "go" => "go",
        "java" | "kotlin" => "java",
        "sql" => "database",
        "markdown" | "md" => "markdown",
        "latex" | "tex" => "math",
        _ => "code",
    }
}

fn fenced_block(cx: &DecorateContext, node: &SyntaxNode, out: &mut DecorationBuilder) {
    let active = cx.is_active(node);
    let starts = line_starts(cx.text(), node.range());
    let last = starts.len() - 1;
    for (i, &start) in starts.iter().enumerate() {
        let class = match (i == 0, i == last, active) {
            (true, true, true) => "md-codeblock-begin md-codeblock-end md-codeblock-active",
            (true, true, false) => "md-codeblock-begin md-codeblock-end",
            (true, false, _) => "md-codeblock-begin",
            (false, true, true) => "md-codeblock-end md-codeblock-active",
            (false, true, false) => "md-codeblock-end",
            (false, false, _) => "md-codeblock-line",
        };
        out.line(start, class);
    }

    if !active {
        let language = node
            .child(NodeKind::CodeInfo)
            .and_then(|info| cx.slice(info.range()).split_whitespace().next())
            .unwrap_or_default();
        let code = node
            .child(NodeKind::CodeText)
            .map(|text| cx.slice(text.range()))
            .unwrap_or_default();
        out.add(Decoration::widget(
            node.from,
            Widget::CodeHeader {
                language: SmolStr::new(language),
                code: SmolStr::new(code),
            },
            Side::Before,
            true,
        ));
    }
}

pub fn decorations(cx: &DecorateContext) -> DecorationSet {
    let mut out = DecorationBuilder::new();
    cx.tree
        .iterate(cx.everything(), &mut |node: &SyntaxNode| match node.kind {
            NodeKind::FencedCode => {
                fenced_block(cx, node, &mut out);
                Walk::Skip
            }
            NodeKind::InlineCode => {
                out.mark(node.range(), "md-inline-code");
                if !cx.is_active(node) {
                    for mark in node.children_of(NodeKind::CodeMark) {
                        out.hide(mark.range());
                    }
                }
                Walk::Skip
            }
            NodeKind::Image | NodeKind::Frontmatter => Walk::Skip,
            _ => Walk::Descend,
        });
    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ext::test_util::{Fixture, listing};

    const BLOCK: &str = "```rust\nlet a = 1;\nlet b = 2;\n```\n\nafter";

    #[test]
    fn inactive_block_gets_lines_and_header() {
        let fx = Fixture::new(BLOCK);
        insta::assert_debug_snapshot!(listing(&decorations(&fx.cx(40))), @r#"
        [
            "line 0 md-codeblock-begin",
            "widget 0 Before CodeHeader",
            "line 8 md-codeblock-line",
            "line 19 md-codeblock-line",
            "line 30 md-codeblock-end",
        ]
        "#);
        let set = decorations(&fx.cx(40));
        let (_, header) = set.widgets().next().unwrap();
        assert_eq!(
            header,
            &Widget::CodeHeader {
                language: "rust".into(),
                code: "let a = 1;\nlet b = 2;".into(),
            }
        );
    }

    #[test]
    fn active_block_drops_header_and_flags_end() {
        let fx = Fixture::new(BLOCK);
        let set = decorations(&fx.cx(12));
        assert_eq!(
            listing(&set),
            vec![
                "line 0 md-codeblock-begin",
                "line 8 md-codeblock-line",
                "line 19 md-codeblock-line",
                "line 30 md-codeblock-end md-codeblock-active",
            ]
        );
    }

    #[test]
    fn inline_code_hides_backticks_when_inactive() {
        let fx = Fixture::new("x `y` z");
        assert_eq!(
            listing(&decorations(&fx.cx(0))),
            vec!["hide 2..3", "mark 2..5 md-inline-code", "hide 4..5"]
        );
        assert_eq!(
            listing(&decorations(&fx.cx(3))),
            vec!["mark 2..5 md-inline-code"]
        );
    }

    #[test]
    fn icons_fall_back() {
        assert_eq!(language_icon("Rust"), "rust");
        assert_eq!(language_icon("sh"), "terminal");
        assert_eq!(language_icon("brainfuck"), "code");
        assert_eq!(language_icon(""), "code");
    }
}
