//! Column specification parsing (`{l|c|r}`)

use super::super::utils::{parse_braced, skip_ws};

/// Upper bound on declared columns and on the span of a single cell.
pub const MAX_COLUMNS: usize = 1024;

/// Horizontal alignment of a column or cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    pub fn from_spec_char(c: char) -> Option<Self> {
        match c {
            'l' => Some(Alignment::Left),
            'c' => Some(Alignment::Center),
            'r' => Some(Alignment::Right),
            _ => None,
        }
    }

    /// CSS `text-align` value
    pub fn as_css(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

/// One declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Column {
    pub alignment: Alignment,
    /// A `|` immediately precedes this column
    pub border_before: bool,
}

/// Parsed column specification of a tabular.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ColumnSpec {
    pub columns: Vec<Column>,
    /// A `|` follows the last column
    pub border_after: bool,
    /// Columns past [`MAX_COLUMNS`] were dropped
    pub truncated: bool,
}

impl ColumnSpec {
    /// Parse a column spec such as `l|c|r`, `|p{2cm}|c|` or `*{3}{c}`.
    ///
    /// Outer braces are accepted and stripped. `l`, `c` and `r` declare
    /// columns; `p{..}`, `m{..}`, `b{..}` and `X` declare left-aligned ones;
    /// `*{n}{spec}` repeats; `>{..}`, `<{..}`, `@{..}` and `!{..}` are skipped
    /// together with their argument. Any other character is ignored.
    /// At most [`MAX_COLUMNS`] columns are kept.
    pub fn parse(spec: &str) -> Self {
        let trimmed = spec.trim();
        let inner = match parse_braced(trimmed, 0) {
            Some((inner, next)) if next == trimmed.len() => inner,
            _ => trimmed,
        };
        let mut out = ColumnSpec::default();
        let mut pending_border = false;
        out.truncated = !parse_into(inner, &mut out.columns, &mut pending_border);
        out.border_after = pending_border;
        if out.truncated {
            log::debug!("column spec truncated at {} columns", MAX_COLUMNS);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Alignment of the column at `index`, if it is declared.
    pub fn alignment_at(&self, index: usize) -> Option<Alignment> {
        self.columns.get(index).map(|c| c.alignment)
    }

    pub fn border_before(&self, index: usize) -> bool {
        self.columns.get(index).map(|c| c.border_before).unwrap_or(false)
    }

    /// True when any vertical rule is declared.
    pub fn has_borders(&self) -> bool {
        self.border_after || self.columns.iter().any(|c| c.border_before)
    }
}

/// Returns false once the column limit stops the parse.
fn parse_into(spec: &str, columns: &mut Vec<Column>, pending_border: &mut bool) -> bool {
    let bytes = spec.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if columns.len() >= MAX_COLUMNS && matches!(c, 'l' | 'c' | 'r' | 'p' | 'm' | 'b' | 'X' | '*') {
            return false;
        }
        match c {
            'l' | 'c' | 'r' => {
                push_column(columns, pending_border, Alignment::from_spec_char(c).unwrap_or_default());
                i += 1;
            }
            'p' | 'm' | 'b' => {
                i = skip_ws(spec, i + 1);
                if let Some((_, next)) = parse_braced(spec, i) {
                    i = next;
                }
                push_column(columns, pending_border, Alignment::Left);
            }
            'X' => {
                push_column(columns, pending_border, Alignment::Left);
                i += 1;
            }
            '*' => {
                i = skip_ws(spec, i + 1);
                let (count, next) = match parse_braced(spec, i) {
                    Some((count, next)) => (count.trim().parse::<usize>().unwrap_or(1), next),
                    None => break,
                };
                i = skip_ws(spec, next);
                match parse_braced(spec, i) {
                    Some((repeated, next)) => {
                        for _ in 0..count {
                            let before = columns.len();
                            if !parse_into(repeated, columns, pending_border) {
                                return false;
                            }
                            // a body without columns repeats to no effect
                            if columns.len() == before {
                                break;
                            }
                        }
                        i = next;
                    }
                    None => break,
                }
            }
            '>' | '<' | '@' | '!' => {
                i = skip_ws(spec, i + 1);
                if let Some((_, next)) = parse_braced(spec, i) {
                    i = next;
                }
            }
            '|' => {
                *pending_border = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }
    true
}

fn push_column(columns: &mut Vec<Column>, pending_border: &mut bool, alignment: Alignment) {
    columns.push(Column {
        alignment,
        border_before: *pending_border,
    });
    *pending_border = false;
}
