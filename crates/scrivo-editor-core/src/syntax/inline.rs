//! Inline grammar: code spans, math, links, images and emphasis.
//!
//! Atomic constructs (code, math, links, images) are matched in a single
//! left-to-right scan. Emphasis delimiter runs found outside them go through
//! the usual delimiter-stack matching afterwards.

use super::{NodeKind, SyntaxNode, insert_node};

/// Parse `src[from..to]` into inline nodes with absolute offsets.
pub(crate) fn parse_inline(src: &str, from: usize, to: usize) -> Vec<SyntaxNode> {
    let mut scanner = Scanner {
        src,
        bytes: src.as_bytes(),
        from,
        to,
        nodes: Vec::new(),
        delims: Vec::new(),
    };
    scanner.scan();
    let Scanner {
        mut nodes, delims, ..
    } = scanner;
    nodes.extend(match_emphasis(delims));

    nodes.sort_by(|a, b| a.from.cmp(&b.from).then(b.to.cmp(&a.to)));
    let mut tree = Vec::with_capacity(nodes.len());
    for node in nodes {
        insert_node(&mut tree, node);
    }
    tree
}

#[derive(Debug, Clone)]
struct Delim {
    ch: u8,
    /// Start of the unconsumed part of the run.
    pos: usize,
    count: usize,
    orig_count: usize,
    can_open: bool,
    can_close: bool,
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    from: usize,
    to: usize,
    nodes: Vec<SyntaxNode>,
    delims: Vec<Delim>,
}

impl Scanner<'_> {
    fn scan(&mut self) {
        let mut pos = self.from;
        while pos < self.to {
            pos = match self.bytes[pos] {
                b'\\' if self.is_escape(pos) => pos + 2,
                b'`' => self.code_span(pos),
                b'$' => self.math(pos),
                b'!' if self.bytes.get(pos + 1) == Some(&b'[') => self.link(pos, true),
                b'[' => self.link(pos, false),
                b'*' | b'_' | b'~' => self.delimiter_run(pos),
                _ => pos + 1,
            };
        }
    }

    fn is_escape(&self, pos: usize) -> bool {
        pos + 1 < self.to && self.bytes[pos + 1].is_ascii_punctuation()
    }

    fn run_len(&self, pos: usize, ch: u8) -> usize {
        self.bytes[pos..self.to]
            .iter()
            .take_while(|&&b| b == ch)
            .count()
    }

    fn code_span(&mut self, pos: usize) -> usize {
        let run = self.run_len(pos, b'`');
        let mut search = pos + run;
        while search < self.to {
            if self.bytes[search] != b'`' {
                search += 1;
                continue;
            }
            let close = self.run_len(search, b'`');
            if close == run {
                let end = search + close;
                self.nodes.push(SyntaxNode::new(
                    NodeKind::InlineCode,
                    pos,
                    end,
                    vec![
                        SyntaxNode::leaf(NodeKind::CodeMark, pos, pos + run),
                        SyntaxNode::leaf(NodeKind::CodeMark, search, end),
                    ],
                ));
                return end;
            }
            search += close;
        }
        // No closing run of the same length: the backticks are literal.
        pos + run
    }

    fn math(&mut self, pos: usize) -> usize {
        let run = self.run_len(pos, b'$');
        if run == 2 {
            let content = pos + 2;
            let close = self.src[content..self.to]
                .find("$$")
                .map(|off| content + off)
                .filter(|&close| close > content);
            if let Some(close) = close {
                self.push_math(pos, 2, close);
                return close + 2;
            }
            return pos + 2;
        }
        if run != 1 {
            return pos + run;
        }

        let content = pos + 1;
        if content >= self.to || self.bytes[content].is_ascii_whitespace() {
            return content;
        }
        let mut search = content;
        while search < self.to {
            match self.bytes[search] {
                b'\\' if self.is_escape(search) => search += 2,
                b'$' => {
                    let closes = search > content
                        && !self.bytes[search - 1].is_ascii_whitespace()
                        && self.bytes.get(search + 1) != Some(&b'$')
                        && !self
                            .bytes
                            .get(search + 1)
                            .is_some_and(|b| search + 1 < self.to && b.is_ascii_digit());
                    if closes {
                        self.push_math(pos, 1, search);
                        return search + 1;
                    }
                    search += self.run_len(search, b'$');
                }
                _ => search += 1,
            }
        }
        content
    }

    fn push_math(&mut self, open: usize, width: usize, close: usize) {
        self.nodes.push(SyntaxNode::new(
            NodeKind::MathExpressionInline,
            open,
            close + width,
            vec![
                SyntaxNode::leaf(NodeKind::MathMark, open, open + width),
                SyntaxNode::leaf(NodeKind::MathMark, close, close + width),
            ],
        ));
    }

    /// `[text](url)` or `![alt](url)`. Falls back to literal brackets.
    fn link(&mut self, pos: usize, image: bool) -> usize {
        let open_width = if image { 2 } else { 1 };
        let text_from = pos + open_width;
        let Some(text_to) = self.matching_bracket(text_from) else {
            return text_from;
        };
        if self.bytes.get(text_to + 1) != Some(&b'(') || text_to + 1 >= self.to {
            return text_from;
        }
        let paren = text_to + 1;
        let Some((url_from, url_to, close)) = self.destination(paren + 1) else {
            return text_from;
        };

        let mut children = vec![
            SyntaxNode::leaf(NodeKind::LinkMark, pos, text_from),
            SyntaxNode::leaf(NodeKind::LinkMark, text_to, text_to + 1),
            SyntaxNode::leaf(NodeKind::LinkMark, paren, paren + 1),
            SyntaxNode::leaf(NodeKind::Url, url_from, url_to),
            SyntaxNode::leaf(NodeKind::LinkMark, close, close + 1),
        ];
        if !image && text_from < text_to {
            children.extend(parse_inline(self.src, text_from, text_to));
            children.sort_by_key(|n| n.from);
        }
        let kind = if image {
            NodeKind::Image
        } else {
            NodeKind::Link
        };
        self.nodes
            .push(SyntaxNode::new(kind, pos, close + 1, children));
        close + 1
    }

    fn matching_bracket(&self, from: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut pos = from;
        while pos < self.to {
            match self.bytes[pos] {
                b'\\' if self.is_escape(pos) => pos += 1,
                b'[' => depth += 1,
                b']' if depth == 0 => return Some(pos),
                b']' => depth -= 1,
                _ => {}
            }
            pos += 1;
        }
        None
    }

    /// Destination and optional title inside `( ... )`, returning the url
    /// span and the offset of the closing paren.
    fn destination(&self, from: usize) -> Option<(usize, usize, usize)> {
        let mut pos = from;
        while pos < self.to && self.bytes[pos] == b' ' {
            pos += 1;
        }
        let url_from = pos;
        let mut depth = 0usize;
        while pos < self.to {
            match self.bytes[pos] {
                b'\\' if self.is_escape(pos) => pos += 1,
                b'(' => depth += 1,
                b')' if depth == 0 => break,
                b')' => depth -= 1,
                b if b.is_ascii_whitespace() => break,
                _ => {}
            }
            pos += 1;
        }
        let url_to = pos.min(self.to);

        while pos < self.to && self.bytes[pos] == b' ' {
            pos += 1;
        }
        if pos < self.to && matches!(self.bytes[pos], b'"' | b'\'') {
            let quote = self.bytes[pos];
            let end = self.bytes[pos + 1..self.to]
                .iter()
                .position(|&b| b == quote)?;
            pos += end + 2;
            while pos < self.to && self.bytes[pos] == b' ' {
                pos += 1;
            }
        }
        (pos < self.to && self.bytes[pos] == b')').then_some((url_from, url_to, pos))
    }

    fn delimiter_run(&mut self, pos: usize) -> usize {
        let ch = self.bytes[pos];
        let count = self.run_len(pos, ch);
        let end = pos + count;

        let before = self.src[self.from..pos].chars().next_back();
        let after = self.src[end..self.to].chars().next();
        let ws_before = before.is_none_or(char::is_whitespace);
        let ws_after = after.is_none_or(char::is_whitespace);
        let punct_before = before.is_some_and(|c| c.is_ascii_punctuation());
        let punct_after = after.is_some_and(|c| c.is_ascii_punctuation());

        let left = !ws_after && (!punct_after || ws_before || punct_before);
        let right = !ws_before && (!punct_before || ws_after || punct_after);
        let (can_open, can_close) = match ch {
            b'_' => (left && (!right || punct_before), right && (!left || punct_after)),
            _ => (left, right),
        };

        if can_open || can_close {
            self.delims.push(Delim {
                ch,
                pos,
                count,
                orig_count: count,
                can_open,
                can_close,
            });
        }
        end
    }
}

/// Pair delimiter runs into emphasis nodes, innermost first.
fn match_emphasis(mut delims: Vec<Delim>) -> Vec<SyntaxNode> {
    let mut out = Vec::new();
    let mut closer = 0;
    while closer < delims.len() {
        if !delims[closer].can_close || delims[closer].count == 0 {
            closer += 1;
            continue;
        }
        let opener = (0..closer).rev().find(|&o| {
            let (op, cl) = (&delims[o], &delims[closer]);
            if op.ch != cl.ch || !op.can_open || op.count == 0 {
                return false;
            }
            if op.ch == b'~' {
                return op.count >= 2 && cl.count >= 2;
            }
            // Rule of three.
            let both = op.can_close || cl.can_open;
            !both
                || (op.orig_count + cl.orig_count) % 3 != 0
                || (op.orig_count % 3 == 0 && cl.orig_count % 3 == 0)
        });

        let Some(opener) = opener else {
            if !delims[closer].can_open {
                delims[closer].count = 0;
            }
            closer += 1;
            continue;
        };

        let (op, cl) = (&delims[opener], &delims[closer]);
        let used = if op.count >= 2 && cl.count >= 2 { 2 } else { 1 };
        let (kind, mark) = match (op.ch, used) {
            (b'~', _) => (NodeKind::Strikethrough, NodeKind::StrikethroughMark),
            (_, 2) => (NodeKind::StrongEmphasis, NodeKind::EmphasisMark),
            _ => (NodeKind::Emphasis, NodeKind::EmphasisMark),
        };
        let open_from = op.pos + op.count - used;
        let close_from = cl.pos;
        out.push(SyntaxNode::new(
            kind,
            open_from,
            close_from + used,
            vec![
                SyntaxNode::leaf(mark, open_from, open_from + used),
                SyntaxNode::leaf(mark, close_from, close_from + used),
            ],
        ));

        delims[opener].count -= used;
        delims[closer].count -= used;
        delims[closer].pos += used;
        // Runs strictly between the pair can no longer match anything.
        for between in &mut delims[opener + 1..closer] {
            between.count = 0;
        }
    }
    out
}
