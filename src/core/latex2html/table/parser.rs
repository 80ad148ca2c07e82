//! State-aware table grid parser

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::Write;

use super::super::placeholder::AMP_MARKER;
use super::super::utils::{find_unescaped, parse_braced, skip_ws};
use super::cell::{is_span_directive, parse_span_directive, CellKind, TableCell};
use super::column::{Alignment, ColumnSpec};
use crate::html::escape_html;

lazy_static! {
    /// Horizontal rule markers: `\hline`, booktabs rules, partial rules.
    static ref RULE_MARKER: Regex = Regex::new(
        r"\\(?:hline|toprule|midrule|bottomrule)\b|\\cline\s*\{[^}]*\}|\\cmidrule\s*(?:\([^)]*\))?\s*\{[^}]*\}"
    )
    .unwrap();
    /// Optional spacing after a row separator, e.g. `\\[2pt]`.
    static ref ROW_SPACING: Regex = Regex::new(r"^\s*\[\s*-?[0-9.]+\s*[a-z]{2}\s*\]").unwrap();
}

/// Represents a parsed table row
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct TableRow {
    /// Cells in this row
    pub cells: Vec<TableCell>,
    /// A horizontal rule precedes this row
    pub has_rule_above: bool,
}

/// Recoverable problems found while parsing a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableIssue {
    /// A span directive that does not have the `{n}{format}{content}` form
    MalformedSpan { row: usize, raw: String },
    /// Cells beyond the declared column count
    ExcessCells { row: usize, dropped: usize },
}

/// A parsed tabular.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Table {
    pub columns: ColumnSpec,
    pub rows: Vec<TableRow>,
    /// A rule follows the last row
    pub has_rule_below: bool,
    #[serde(skip)]
    pub issues: Vec<TableIssue>,
}

/// State-aware table grid parser
///
/// Tracks the logical column of every cell so that spanning cells shift the
/// alignment of the cells that follow them.
pub struct TableGridParser {
    columns: ColumnSpec,
    rows: Vec<TableRow>,
    /// Rule seen on a row that had no cells; attaches to the next row
    pending_rule: bool,
    issues: Vec<TableIssue>,
}

impl TableGridParser {
    /// Create a new parser for the given column spec
    pub fn new(columns: ColumnSpec) -> Self {
        TableGridParser {
            columns,
            rows: Vec::new(),
            pending_rule: false,
            issues: Vec::new(),
        }
    }

    /// Record a horizontal rule before the next row
    pub fn add_rule(&mut self) {
        self.pending_rule = true;
    }

    /// Process a row of raw cells
    pub fn process_row(&mut self, raw_cells: Vec<String>) {
        let row_index = self.rows.len();
        let declared = self.columns.len();
        let mut row = TableRow {
            cells: Vec::with_capacity(raw_cells.len()),
            has_rule_above: std::mem::take(&mut self.pending_rule),
        };

        let mut current_col = 0usize;
        let mut raw_iter = raw_cells.into_iter();

        for raw in raw_iter.by_ref() {
            if declared > 0 && current_col >= declared {
                let dropped = usize::from(!raw.trim().is_empty());
                self.record_excess(row_index, dropped);
                break;
            }

            let mut cell = if is_span_directive(&raw) {
                match parse_span_directive(&raw) {
                    Some(directive) => TableCell::spanning(directive),
                    None => {
                        self.issues.push(TableIssue::MalformedSpan {
                            row: row_index,
                            raw: raw.trim().to_string(),
                        });
                        TableCell::plain(&raw, Alignment::Center)
                    }
                }
            } else {
                let alignment = self.columns.alignment_at(current_col).unwrap_or_default();
                TableCell::plain(&raw, alignment)
            };

            cell.border_before = self.columns.border_before(current_col);
            current_col = current_col.saturating_add(cell.column_span);
            cell.border_after = self.columns.border_after && declared > 0 && current_col >= declared;
            row.cells.push(cell);
        }

        let dropped = raw_iter.filter(|raw| !raw.trim().is_empty()).count();
        if dropped > 0 {
            self.record_excess(row_index, dropped);
        }

        if !row.cells.is_empty() {
            self.rows.push(row);
        }
    }

    fn record_excess(&mut self, row: usize, dropped: usize) {
        if dropped == 0 {
            return;
        }
        match self.issues.last_mut() {
            Some(TableIssue::ExcessCells { row: r, dropped: d }) if *r == row => *d += dropped,
            _ => self.issues.push(TableIssue::ExcessCells { row, dropped }),
        }
    }

    /// Finish parsing
    pub fn finish(self) -> Table {
        Table {
            columns: self.columns,
            rows: self.rows,
            has_rule_below: self.pending_rule,
            issues: self.issues,
        }
    }
}

/// Parse tabular content into rows and cells.
pub fn parse_table(content: &str, columns: ColumnSpec) -> Table {
    let mut parser = TableGridParser::new(columns);

    for row_str in split_rows(content) {
        let row_str = ROW_SPACING.replace(row_str, "");

        let has_rule = RULE_MARKER.is_match(&row_str);
        if has_rule {
            parser.add_rule();
        }
        let clean_row = RULE_MARKER.replace_all(&row_str, "");
        if clean_row.trim().is_empty() {
            continue;
        }

        let protected = protect_span_ampersands(&clean_row);
        let raw_cells: Vec<String> = split_cells(&protected)
            .into_iter()
            .map(|cell| cell.replace(AMP_MARKER, "&"))
            .collect();

        parser.process_row(raw_cells);
    }

    parser.finish()
}

/// Split on the row separator `\\`. Other escapes (`\&`) are skipped over.
pub fn split_rows(content: &str) -> Vec<&str> {
    let bytes = content.as_bytes();
    let mut rows = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if i + 1 < bytes.len() && bytes[i + 1] == b'\\' {
                rows.push(&content[start..i]);
                start = i + 2;
            }
            i += 2;
            continue;
        }
        i += 1;
    }
    rows.push(&content[start.min(content.len())..]);
    rows
}

/// Split a row on unescaped `&`.
pub fn split_cells(row: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut start = 0usize;
    while let Some(at) = find_unescaped(row, start, b'&') {
        cells.push(row[start..at].to_string());
        start = at + 1;
    }
    cells.push(row[start..].to_string());
    cells
}

/// Replace `&` inside the content group of every span directive with a
/// marker, so the cell split cannot cut the spanning cell apart.
pub fn protect_span_ampersands(row: &str) -> String {
    const DIRECTIVE: &str = "\\multicolumn";
    let mut out = String::with_capacity(row.len());
    let mut i = 0usize;

    while let Some(rel) = row[i..].find(DIRECTIVE) {
        let at = i + rel;
        out.push_str(&row[i..at]);

        let groups = parse_braced(row, skip_ws(row, at + DIRECTIVE.len()))
            .and_then(|(_, n)| parse_braced(row, skip_ws(row, n)))
            .and_then(|(_, n)| {
                let content_start = skip_ws(row, n);
                parse_braced(row, content_start).map(|(_, end)| (content_start, end))
            });

        match groups {
            Some((content_start, end)) => {
                out.push_str(&row[at..content_start]);
                out.push_str(&row[content_start..end].replace('&', &AMP_MARKER.to_string()));
                i = end;
            }
            None => {
                out.push_str(DIRECTIVE);
                i = at + DIRECTIVE.len();
            }
        }
    }
    out.push_str(&row[i..]);
    out
}

impl Table {
    /// Generate the HTML table.
    ///
    /// `render_text` turns text-cell content into HTML (inline commands,
    /// escaping); formula cells are emitted with their `$..$` delimiters for
    /// the segment splitter.
    pub fn to_html(&self, render_text: &mut dyn FnMut(&str) -> String) -> String {
        let mut output = String::new();

        let mut classes = vec!["latex-tabular"];
        if self.columns.has_borders() {
            classes.push("latex-tabular-bordered");
        }
        if self.has_rule_below {
            classes.push("with-bottom-hline");
        }
        let _ = write!(output, "<table class=\"{}\">", classes.join(" "));

        for row in &self.rows {
            if row.has_rule_above {
                output.push_str("<tr class=\"with-hline\">");
            } else {
                output.push_str("<tr>");
            }
            for cell in &row.cells {
                write_cell(&mut output, cell, render_text);
            }
            output.push_str("</tr>");
        }

        output.push_str("</table>");
        output
    }
}

fn write_cell(output: &mut String, cell: &TableCell, render_text: &mut dyn FnMut(&str) -> String) {
    let mut classes = vec!["tabular-cell"];
    if cell.spanning {
        classes.push("multicolumn-cell");
    }
    if cell.border_before {
        classes.push("border-left");
    }
    if cell.border_after {
        classes.push("border-right");
    }

    let _ = write!(output, "<td class=\"{}\"", classes.join(" "));
    if cell.column_span > 1 {
        let _ = write!(output, " colspan=\"{}\"", cell.column_span);
    }
    let _ = write!(output, " style=\"text-align: {}\">", cell.alignment.as_css());

    match cell.kind() {
        CellKind::Label { class, text } => {
            let _ = write!(output, "<span class=\"{}\">{}</span>", class, escape_html(&text));
        }
        CellKind::Math(formula) => output.push_str(&formula),
        CellKind::Text(text) => output.push_str(&render_text(&text)),
    }

    output.push_str("</td>");
}
