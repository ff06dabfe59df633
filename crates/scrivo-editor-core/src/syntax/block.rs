//! Block-level grammar.
//!
//! Works on a list of line spans. Container blocks (blockquotes, list items)
//! strip their prefixes by advancing each line's `from` and recurse over the
//! resulting lines, so nested constructs keep absolute document offsets.

use super::inline::parse_inline;
use super::{BlockMeta, NodeKind, SyntaxNode, insert_node};

pub(crate) struct ParsedBlock {
    pub node: SyntaxNode,
    pub meta: BlockMeta,
}

/// One source line as seen by a container.
#[derive(Debug, Clone, Copy)]
struct LineSpan {
    /// Raw line start in the document.
    start: usize,
    /// Content start after container prefixes.
    from: usize,
    /// Line end, excluding the line break.
    to: usize,
}

/// Parse top-level blocks starting at `start`, which must be a line start.
pub(crate) fn parse_blocks(src: &str, start: usize) -> Vec<ParsedBlock> {
    let lines = split_lines(src, start);
    let mut parser = BlockParser {
        src,
        bytes: src.as_bytes(),
        lookahead: 0,
    };

    let mut out = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if parser.is_blank(&lines[i]) {
            i += 1;
            continue;
        }
        parser.lookahead = 0;
        let allow_frontmatter = start == 0 && i == 0;
        let (node, next) = parser.block_at(&lines, i, allow_frontmatter);

        // Anything up to the next non-blank line can change where this
        // block ends (setext underlines, list continuations).
        let following = lines[next..]
            .iter()
            .find(|l| !parser.is_blank(l))
            .map(|l| l.to)
            .unwrap_or(src.len());
        let meta = BlockMeta {
            lookahead: following.max(parser.lookahead),
            next_line: lines.get(next).map(|l| l.start).unwrap_or(src.len()),
        };
        out.push(ParsedBlock { node, meta });
        i = next;
    }
    out
}

fn split_lines(src: &str, start: usize) -> Vec<LineSpan> {
    let bytes = src.as_bytes();
    let mut lines = Vec::new();
    let mut pos = start;
    while pos < src.len() {
        let end = bytes[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|off| pos + off)
            .unwrap_or(src.len());
        let to = if end > pos && bytes[end - 1] == b'\r' {
            end - 1
        } else {
            end
        };
        lines.push(LineSpan {
            start: pos,
            from: pos,
            to,
        });
        pos = end + 1;
    }
    // A trailing newline opens one more (empty) line.
    if src.len() > start && bytes[src.len() - 1] == b'\n' {
        lines.push(LineSpan {
            start: src.len(),
            from: src.len(),
            to: src.len(),
        });
    }
    lines
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListMarker {
    Bullet(u8),
    Ordered(u8),
}

struct ListItemStart {
    marker: ListMarker,
    mark_from: usize,
    mark_to: usize,
    /// Offset of item content relative to the line's content start.
    content_indent: usize,
}

struct BlockParser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    lookahead: usize,
}

impl<'a> BlockParser<'a> {
    fn text(&self, line: &LineSpan) -> &'a str {
        &self.src[line.from..line.to]
    }

    fn is_blank(&self, line: &LineSpan) -> bool {
        self.text(line).trim().is_empty()
    }

    /// Up to three spaces of indentation and the text after them.
    fn leading(&self, line: &LineSpan) -> (usize, &'a str) {
        let text = self.text(line);
        let indent = text.bytes().take(3).take_while(|&b| b == b' ').count();
        (indent, &text[indent..])
    }

    fn indent_of(&self, line: &LineSpan) -> usize {
        self.text(line).bytes().take_while(|&b| b == b' ').count()
    }

    fn note_lookahead(&mut self, offset: usize) {
        self.lookahead = self.lookahead.max(offset);
    }

    fn parse_container(&mut self, lines: &[LineSpan]) -> Vec<SyntaxNode> {
        let mut nodes = Vec::new();
        let mut i = 0;
        while i < lines.len() {
            if self.is_blank(&lines[i]) {
                i += 1;
                continue;
            }
            let (node, next) = self.block_at(lines, i, false);
            nodes.push(node);
            i = next;
        }
        nodes
    }

    /// Parse the block starting at line `i`, returning it and the index of
    /// the first line after it.
    fn block_at(
        &mut self,
        lines: &[LineSpan],
        i: usize,
        allow_frontmatter: bool,
    ) -> (SyntaxNode, usize) {
        if allow_frontmatter && let Some(found) = self.frontmatter(lines, i) {
            return found;
        }
        if let Some(found) = self.fenced_code(lines, i) {
            return found;
        }
        if let Some(found) = self.math_block(lines, i) {
            return found;
        }
        if let Some(found) = self.directive_table(lines, i) {
            return found;
        }
        if let Some(found) = self.atx_heading(lines, i) {
            return found;
        }
        if let Some(found) = self.horizontal_rule(lines, i) {
            return found;
        }
        if let Some(found) = self.blockquote(lines, i) {
            return found;
        }
        if let Some(found) = self.list(lines, i) {
            return found;
        }
        if let Some(found) = self.pipe_table(lines, i) {
            return found;
        }
        self.paragraph(lines, i)
    }

    fn frontmatter(&mut self, lines: &[LineSpan], i: usize) -> Option<(SyntaxNode, usize)> {
        let open = &lines[i];
        if open.from != 0 || self.text(open).trim_end() != "---" {
            return None;
        }
        for (j, line) in lines.iter().enumerate().skip(i + 1) {
            let text = self.text(line).trim_end();
            if text == "---" || text == "..." {
                let node = SyntaxNode::new(
                    NodeKind::Frontmatter,
                    open.from,
                    line.to,
                    vec![
                        SyntaxNode::leaf(NodeKind::CodeMark, open.from, open.from + 3),
                        SyntaxNode::leaf(NodeKind::CodeMark, line.from, line.from + 3),
                    ],
                );
                return Some((node, j + 1));
            }
        }
        self.note_lookahead(self.src.len());
        None
    }

    fn fenced_code(&mut self, lines: &[LineSpan], i: usize) -> Option<(SyntaxNode, usize)> {
        let line = &lines[i];
        let (indent, text) = self.leading(line);
        let fence = *text.as_bytes().first()?;
        if fence != b'`' && fence != b'~' {
            return None;
        }
        let run = text.bytes().take_while(|&b| b == fence).count();
        if run < 3 {
            return None;
        }
        let info = &text[run..];
        if fence == b'`' && info.contains('`') {
            return None;
        }

        let open_from = line.from + indent;
        let mut children = vec![SyntaxNode::leaf(
            NodeKind::CodeMark,
            open_from,
            open_from + run,
        )];
        let info_trimmed = info.trim();
        if !info_trimmed.is_empty() {
            let info_from = open_from + run + (info.len() - info.trim_start().len());
            children.push(SyntaxNode::leaf(
                NodeKind::CodeInfo,
                info_from,
                info_from + info_trimmed.len(),
            ));
        }

        let close = lines.iter().enumerate().skip(i + 1).find_map(|(j, l)| {
            let (ind, t) = self.leading(l);
            let close_run = t.bytes().take_while(|&b| b == fence).count();
            (close_run >= run && t[close_run..].trim().is_empty())
                .then_some((j, l.from + ind, close_run))
        });

        let (to, next) = match close {
            Some((j, close_from, close_run)) => {
                push_code_text(&mut children, lines, i + 1, j);
                children.push(SyntaxNode::leaf(
                    NodeKind::CodeMark,
                    close_from,
                    close_from + close_run,
                ));
                (lines[j].to, j + 1)
            }
            None => {
                // Unclosed fences run to the end of the container.
                let last = lines.len() - 1;
                self.note_lookahead(lines[last].to);
                push_code_text(&mut children, lines, i + 1, lines.len());
                (lines[last].to, lines.len())
            }
        };
        Some((
            SyntaxNode::new(NodeKind::FencedCode, open_from, to, children),
            next,
        ))
    }

    fn math_block(&mut self, lines: &[LineSpan], i: usize) -> Option<(SyntaxNode, usize)> {
        let line = &lines[i];
        let (indent, text) = self.leading(line);
        if !text.starts_with("$$") {
            return None;
        }
        let open_from = line.from + indent;
        let open = SyntaxNode::leaf(NodeKind::MathMark, open_from, open_from + 2);

        // `$$ x $$` on one line.
        let rest = text[2..].trim_end();
        if rest.len() >= 2 && rest.ends_with("$$") {
            let close_to = open_from + 2 + rest.len();
            let close = SyntaxNode::leaf(NodeKind::MathMark, close_to - 2, close_to);
            return Some((
                SyntaxNode::new(
                    NodeKind::MathExpressionBlock,
                    open_from,
                    close_to,
                    vec![open, close],
                ),
                i + 1,
            ));
        }

        for (j, l) in lines.iter().enumerate().skip(i + 1) {
            let t = self.text(l).trim_end();
            if t.ends_with("$$") {
                let close_to = l.from + t.len();
                let close = SyntaxNode::leaf(NodeKind::MathMark, close_to - 2, close_to);
                return Some((
                    SyntaxNode::new(
                        NodeKind::MathExpressionBlock,
                        open_from,
                        close_to,
                        vec![open, close],
                    ),
                    j + 1,
                ));
            }
        }

        // No closing delimiter before the end: plain text. A `$$` typed
        // anywhere later would change that, so this depends on everything.
        self.note_lookahead(self.src.len());
        None
    }

    fn directive_table(&mut self, lines: &[LineSpan], i: usize) -> Option<(SyntaxNode, usize)> {
        let line = &lines[i];
        let (indent, text) = self.leading(line);
        let head = text.trim_end();
        let after = head.strip_prefix(":::")?.trim_start();
        if after != "table" && !after.starts_with("table ") {
            return None;
        }
        let open_from = line.from + indent;

        let close = lines
            .iter()
            .enumerate()
            .skip(i + 1)
            .find(|(_, l)| self.text(l).trim() == ":::");
        let Some((j, close_line)) = close else {
            self.note_lookahead(self.src.len());
            return None;
        };

        let mut children = vec![SyntaxNode::leaf(
            NodeKind::TableDelimiter,
            open_from,
            line.to,
        )];
        for row in &lines[i + 1..j] {
            if self.is_blank(row) {
                continue;
            }
            let (ind, t) = self.leading(row);
            let from = row.from + ind;
            let to = from + t.trim_end().len();
            children.push(SyntaxNode::new(
                NodeKind::TableRow,
                from,
                to,
                parse_inline(self.src, from, to),
            ));
        }
        let close_from = close_line.from + self.indent_of(close_line);
        children.push(SyntaxNode::leaf(
            NodeKind::TableDelimiter,
            close_from,
            close_from + 3,
        ));
        Some((
            SyntaxNode::new(NodeKind::DirectiveTable, open_from, close_line.to, children),
            j + 1,
        ))
    }

    fn atx_heading(&mut self, lines: &[LineSpan], i: usize) -> Option<(SyntaxNode, usize)> {
        let line = &lines[i];
        let (indent, text) = self.leading(line);
        let level = text.bytes().take_while(|&b| b == b'#').count();
        if level == 0 || level > 6 {
            return None;
        }
        match text.as_bytes().get(level) {
            None | Some(b' ') | Some(b'\t') => {}
            _ => return None,
        }
        let from = line.from + indent;
        let mut children = vec![SyntaxNode::leaf(NodeKind::HeaderMark, from, from + level)];
        let content = &text[level..];
        let content_from = from + level + (content.len() - content.trim_start().len());
        let content_to = from + level + content.trim_end().len();
        if content_from < content_to {
            children.extend(parse_inline(self.src, content_from, content_to));
        }
        Some((
            SyntaxNode::new(NodeKind::Heading(level as u8), from, line.to, children),
            i + 1,
        ))
    }

    fn is_hr(&self, line: &LineSpan) -> bool {
        let (_, text) = self.leading(line);
        let Some(&first) = text.as_bytes().first() else {
            return false;
        };
        if !matches!(first, b'-' | b'*' | b'_') {
            return false;
        }
        let mut count = 0;
        for b in text.bytes() {
            if b == first {
                count += 1;
            } else if b != b' ' && b != b'\t' {
                return false;
            }
        }
        count >= 3
    }

    fn horizontal_rule(&mut self, lines: &[LineSpan], i: usize) -> Option<(SyntaxNode, usize)> {
        let line = &lines[i];
        if !self.is_hr(line) {
            return None;
        }
        let (indent, _) = self.leading(line);
        Some((
            SyntaxNode::leaf(NodeKind::HorizontalRule, line.from + indent, line.to),
            i + 1,
        ))
    }

    fn quote_marker(&self, line: &LineSpan) -> Option<usize> {
        let (indent, text) = self.leading(line);
        text.starts_with('>').then_some(line.from + indent)
    }

    fn blockquote(&mut self, lines: &[LineSpan], i: usize) -> Option<(SyntaxNode, usize)> {
        let first_mark = self.quote_marker(&lines[i])?;
        let mut marks = Vec::new();
        let mut inner = Vec::new();
        let mut j = i;
        while j < lines.len() {
            let Some(mark) = self.quote_marker(&lines[j]) else {
                break;
            };
            marks.push(SyntaxNode::leaf(NodeKind::QuoteMark, mark, mark + 1));
            let mut from = mark + 1;
            if from < lines[j].to && self.bytes[from] == b' ' {
                from += 1;
            }
            inner.push(LineSpan {
                start: lines[j].start,
                from,
                to: lines[j].to,
            });
            j += 1;
        }

        let mut children = self.parse_container(&inner);
        for mark in marks {
            insert_node(&mut children, mark);
        }
        Some((
            SyntaxNode::new(NodeKind::Blockquote, first_mark, lines[j - 1].to, children),
            j,
        ))
    }

    fn list_item_start(&self, line: &LineSpan) -> Option<ListItemStart> {
        let (indent, text) = self.leading(line);
        let bytes = text.as_bytes();
        let (marker, width) = match bytes.first()? {
            b @ (b'-' | b'*' | b'+') => (ListMarker::Bullet(*b), 1),
            b'0'..=b'9' => {
                let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
                match bytes.get(digits) {
                    Some(d @ (b'.' | b')')) if digits <= 9 => (ListMarker::Ordered(*d), digits + 1),
                    _ => return None,
                }
            }
            _ => return None,
        };
        let spaces = match bytes.get(width) {
            None => 0,
            Some(b' ') | Some(b'\t') => {
                let n = bytes[width..]
                    .iter()
                    .take_while(|&&b| b == b' ' || b == b'\t')
                    .count();
                // Content that is only whitespace, or indented code after
                // the marker, starts one space in.
                if n > 4 || width + n == bytes.len() { 1 } else { n }
            }
            _ => return None,
        };
        let mark_from = line.from + indent;
        Some(ListItemStart {
            marker,
            mark_from,
            mark_to: mark_from + width,
            content_indent: indent + width + spaces,
        })
    }

    fn list(&mut self, lines: &[LineSpan], i: usize) -> Option<(SyntaxNode, usize)> {
        let first = self.list_item_start(&lines[i])?;
        // `---` and `* * *` are rules, not empty items.
        if self.is_hr(&lines[i]) {
            return None;
        }
        let marker = first.marker;
        let list_from = first.mark_from;
        let mut items = Vec::new();
        let mut j = i;
        let mut start = Some(first);

        while let Some(item) = start.take() {
            let (node, end) = self.list_item(lines, j, item);
            items.push(node);
            j = end;

            let next = (j..lines.len()).find(|&k| !self.is_blank(&lines[k]));
            if let Some(k) = next
                && !self.is_hr(&lines[k])
                && let Some(candidate) = self.list_item_start(&lines[k])
                && candidate.marker == marker
            {
                j = k;
                start = Some(candidate);
            }
        }

        let kind = match marker {
            ListMarker::Bullet(_) => NodeKind::BulletList,
            ListMarker::Ordered(_) => NodeKind::OrderedList,
        };
        let to = items.last().map(|n| n.to).unwrap_or(list_from);
        Some((SyntaxNode::new(kind, list_from, to, items), j))
    }

    fn list_item(
        &mut self,
        lines: &[LineSpan],
        i: usize,
        item: ListItemStart,
    ) -> (SyntaxNode, usize) {
        let first = &lines[i];
        let content_from = (first.from + item.content_indent).min(first.to);
        let mut inner = vec![LineSpan {
            start: first.start,
            from: content_from,
            to: first.to,
        }];
        let mut last_content = i;
        let mut j = i + 1;
        while j < lines.len() {
            let line = &lines[j];
            if self.is_blank(line) {
                let next = (j..lines.len()).find(|&k| !self.is_blank(&lines[k]));
                match next {
                    Some(k) if self.indent_of(&lines[k]) >= item.content_indent => {
                        for blank in &lines[j..k] {
                            inner.push(LineSpan {
                                start: blank.start,
                                from: blank.to.min(blank.from + item.content_indent),
                                to: blank.to,
                            });
                        }
                        j = k;
                        continue;
                    }
                    _ => break,
                }
            }
            if self.indent_of(line) >= item.content_indent {
                inner.push(LineSpan {
                    start: line.start,
                    from: line.from + item.content_indent,
                    to: line.to,
                });
            } else if self.list_item_start(line).is_some() {
                break;
            } else if last_content == j - 1 && self.is_lazy_continuation(lines, j, &inner) {
                inner.push(*line);
            } else {
                break;
            }
            last_content = j;
            j += 1;
        }
        inner.truncate(last_content - i + 1);

        let mut children = self.parse_container(&inner);
        if let Some(first_child) = children.first_mut()
            && first_child.kind == NodeKind::Paragraph
            && first_child.from == content_from
            && is_task_marker(&self.src[content_from..first.to])
        {
            first_child.kind = NodeKind::Task;
            insert_node(
                &mut first_child.children,
                SyntaxNode::leaf(NodeKind::TaskMarker, content_from, content_from + 3),
            );
        }
        children.insert(
            0,
            SyntaxNode::leaf(NodeKind::ListMark, item.mark_from, item.mark_to),
        );
        let to = lines[last_content].to;
        (
            SyntaxNode::new(NodeKind::ListItem, item.mark_from, to, children),
            last_content + 1,
        )
    }

    /// A non-indented line continues an item's trailing paragraph unless it
    /// starts a block of its own.
    fn is_lazy_continuation(&mut self, lines: &[LineSpan], j: usize, inner: &[LineSpan]) -> bool {
        let Some(prev) = inner.last() else {
            return false;
        };
        if self.is_blank(prev) || self.interrupts_paragraph(lines, j) {
            return false;
        }
        // Only paragraph text continues lazily; a fence or heading on the
        // previous line doesn't.
        let (_, prev_text) = self.leading(prev);
        !(prev_text.starts_with("```")
            || prev_text.starts_with("~~~")
            || prev_text.starts_with('#')
            || prev_text.starts_with("$$"))
    }

    fn split_row(&self, line: &LineSpan) -> Vec<&'a str> {
        let text = self.text(line).trim();
        let text = text.strip_prefix('|').unwrap_or(text);
        let text = text.strip_suffix('|').unwrap_or(text);
        text.split('|').map(str::trim).collect()
    }

    fn is_delimiter_row(&self, line: &LineSpan) -> bool {
        let text = self.text(line);
        if !text.contains('-') {
            return false;
        }
        self.split_row(line).iter().all(|cell| {
            let cell = cell.strip_prefix(':').unwrap_or(cell);
            let cell = cell.strip_suffix(':').unwrap_or(cell);
            !cell.is_empty() && cell.bytes().all(|b| b == b'-')
        })
    }

    fn table_row(&self, kind: NodeKind, line: &LineSpan) -> SyntaxNode {
        let (ind, t) = self.leading(line);
        let from = line.from + ind;
        let to = from + t.trim_end().len();
        let children = match kind {
            NodeKind::TableDelimiter => Vec::new(),
            _ => parse_inline(self.src, from, to),
        };
        SyntaxNode::new(kind, from, to, children)
    }

    fn pipe_table(&mut self, lines: &[LineSpan], i: usize) -> Option<(SyntaxNode, usize)> {
        let header = &lines[i];
        if !self.text(header).contains('|') {
            return None;
        }
        let delimiter = lines.get(i + 1)?;
        if !self.is_delimiter_row(delimiter) {
            return None;
        }
        if self.split_row(header).len() != self.split_row(delimiter).len() {
            return None;
        }

        let mut children = vec![
            self.table_row(NodeKind::TableHeader, header),
            self.table_row(NodeKind::TableDelimiter, delimiter),
        ];
        let mut j = i + 2;
        while j < lines.len() {
            let line = &lines[j];
            if self.is_blank(line) || !self.text(line).contains('|') {
                break;
            }
            children.push(self.table_row(NodeKind::TableRow, line));
            j += 1;
        }
        let from = children[0].from;
        let to = children.last().map(|n| n.to).unwrap_or(from);
        Some((SyntaxNode::new(NodeKind::Table, from, to, children), j))
    }

    fn setext_level(&self, line: &LineSpan) -> Option<u8> {
        let (_, text) = self.leading(line);
        let text = text.trim_end();
        let first = *text.as_bytes().first()?;
        if !text.bytes().all(|b| b == first) {
            return None;
        }
        match first {
            b'=' => Some(1),
            b'-' => Some(2),
            _ => None,
        }
    }

    fn interrupts_paragraph(&mut self, lines: &[LineSpan], j: usize) -> bool {
        let line = &lines[j];
        let (_, text) = self.leading(line);
        if text.starts_with("```") || text.starts_with("~~~") || text.starts_with('>') {
            return true;
        }
        if self.is_hr(line) {
            return true;
        }
        let level = text.bytes().take_while(|&b| b == b'#').count();
        if (1..=6).contains(&level) && matches!(text.as_bytes().get(level), None | Some(b' ')) {
            return true;
        }
        if let Some(item) = self.list_item_start(line)
            && line.from + item.content_indent < line.to
        {
            return true;
        }
        // Math and directive tables only interrupt when they actually close,
        // so the paragraph depends on the closing line too.
        if text.starts_with("$$") || text.starts_with(":::") {
            let closed = self
                .math_block(lines, j)
                .or_else(|| self.directive_table(lines, j));
            if let Some((node, _)) = closed {
                self.note_lookahead(node.to);
                return true;
            }
        }
        false
    }

    fn paragraph(&mut self, lines: &[LineSpan], i: usize) -> (SyntaxNode, usize) {
        let mut j = i + 1;
        let mut setext = None;
        while j < lines.len() {
            if self.is_blank(&lines[j]) {
                break;
            }
            if let Some(level) = self.setext_level(&lines[j]) {
                setext = Some(level);
                break;
            }
            if self.interrupts_paragraph(lines, j) {
                break;
            }
            j += 1;
        }

        let mut children = Vec::new();
        for line in &lines[i..j] {
            let text = self.text(line);
            let from = line.from + (text.len() - text.trim_start().len());
            let to = line.from + text.trim_end().len();
            if from < to {
                children.extend(parse_inline(self.src, from, to));
            }
        }
        let first_text = self.text(&lines[i]);
        let from = lines[i].from + (first_text.len() - first_text.trim_start().len());

        match setext {
            Some(level) => {
                let underline = &lines[j];
                let (ind, t) = self.leading(underline);
                let mark_from = underline.from + ind;
                children.push(SyntaxNode::leaf(
                    NodeKind::HeaderMark,
                    mark_from,
                    mark_from + t.trim_end().len(),
                ));
                (
                    SyntaxNode::new(NodeKind::SetextHeading(level), from, underline.to, children),
                    j + 1,
                )
            }
            None => (
                SyntaxNode::new(NodeKind::Paragraph, from, lines[j - 1].to, children),
                j,
            ),
        }
    }
}

fn push_code_text(
    children: &mut Vec<SyntaxNode>,
    lines: &[LineSpan],
    first: usize,
    end: usize,
) {
    if first < end {
        children.push(SyntaxNode::leaf(
            NodeKind::CodeText,
            lines[first].from,
            lines[end - 1].to,
        ));
    }
}

fn is_task_marker(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 3
        && bytes[0] == b'['
        && matches!(bytes[1], b' ' | b'x' | b'X')
        && bytes[2] == b']'
        && matches!(bytes.get(3), None | Some(b' ') | Some(b'\t'))
}
