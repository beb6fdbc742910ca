use std::fmt::Write as _;

use super::engine::DiffOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Unchanged,
    Removed,
    Added,
}

impl RowKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            RowKind::Unchanged => "unchanged",
            RowKind::Removed => "removed",
            RowKind::Added => "added",
        }
    }
}

/// One before/after row. Cell text is already escaped for markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRow {
    pub kind: RowKind,
    pub left: Option<String>,
    pub right: Option<String>,
}

/// Maps each edit-script step to one row, in script order.
pub fn render_side_by_side(ops: &[DiffOp]) -> Vec<DiffRow> {
    ops.iter()
        .map(|op| {
            let escaped = escape_html(op.line());
            match op {
                DiffOp::Unchanged(_) => DiffRow {
                    kind: RowKind::Unchanged,
                    left: Some(escaped.clone()),
                    right: Some(escaped),
                },
                DiffOp::Removed(_) => DiffRow {
                    kind: RowKind::Removed,
                    left: Some(escaped),
                    right: None,
                },
                DiffOp::Added(_) => DiffRow {
                    kind: RowKind::Added,
                    left: None,
                    right: Some(escaped),
                },
            }
        })
        .collect()
}

/// Two-column diff table wrapped in the `diff-container` div that report
/// viewers expect.
pub fn render_table_html(rows: &[DiffRow]) -> String {
    let mut html = String::from(
        "<div class=\"diff-container\">\n\
         <table class=\"diff-table\">\n\
         <tr><th>Before</th><th>After</th></tr>\n",
    );
    for row in rows {
        let left = cell(row.left.as_deref(), row.kind == RowKind::Removed, "diff-remove");
        let right = cell(row.right.as_deref(), row.kind == RowKind::Added, "diff-add");
        let _ = writeln!(
            html,
            "<tr class=\"{}\"><td class=\"left\">{}</td><td class=\"right\">{}</td></tr>",
            row.kind.css_class(),
            left,
            right
        );
    }
    html.push_str("</table>\n</div>");
    html
}

fn cell(text: Option<&str>, highlighted: bool, span_class: &str) -> String {
    match text {
        Some(text) if highlighted => format!("<span class=\"{span_class}\">{text}</span>"),
        Some(text) => text.to_string(),
        None => "&nbsp;".to_string(),
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
