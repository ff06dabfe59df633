//! Table rendering for both table syntaxes.
//!
//! Pipe tables go straight through pulldown-cmark. Directive tables
//! (`:::table` ... `:::`) are rewritten into an equivalent pipe table first,
//! so both end up with identical markup.

use pulldown_cmark::{Parser, html};

use crate::default_md_options;

/// Render a GFM pipe table source slice to HTML.
pub fn render_pipe_table(source: &str) -> String {
    let parser = Parser::new_ext(source, default_md_options());
    let mut out = String::with_capacity(source.len() * 2);
    html::push_html(&mut out, parser);
    out
}

/// Render a directive table source slice (including its fences) to HTML.
pub fn render_directive_table(source: &str) -> String {
    render_pipe_table(&directive_to_markdown(source))
}

/// Rewrite a directive table into pipe table markdown.
///
/// The first body row is the header. Rows with fewer cells than the widest
/// row are padded with empty cells. A directive with no body rows produces
/// an empty string.
pub fn directive_to_markdown(source: &str) -> String {
    let rows: Vec<Vec<&str>> = source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(":::"))
        .map(split_cells)
        .collect();

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let mut out = String::new();
    for (idx, row) in rows.iter().enumerate() {
        push_row(&mut out, row, columns);
        if idx == 0 {
            out.push('|');
            for _ in 0..columns {
                out.push_str(" --- |");
            }
            out.push('\n');
        }
    }
    out
}

fn split_cells(line: &str) -> Vec<&str> {
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(str::trim).collect()
}

fn push_row(out: &mut String, row: &[&str], columns: usize) {
    out.push('|');
    for idx in 0..columns {
        out.push(' ');
        out.push_str(row.get(idx).copied().unwrap_or(""));
        out.push_str(" |");
    }
    out.push('\n');
}
