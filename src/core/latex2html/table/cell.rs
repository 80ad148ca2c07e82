//! Table cells: span directives and content classification

use lazy_static::lazy_static;
use regex::Regex;

use super::super::placeholder::TEXT_MARKER;
use super::super::utils::{collapse_whitespace, is_escaped, parse_braced, read_command, skip_ws};
use super::column::{Alignment, MAX_COLUMNS};
use crate::data::constants::TEXT_COMMANDS;

lazy_static! {
    static ref ROMAN_LABEL: Regex = Regex::new(r"^\([IVX]+\)$").unwrap();
    static ref LETTER_LABEL: Regex = Regex::new(r"^\([A-Za-z]\)$").unwrap();
}

const SPAN_DIRECTIVE: &str = "\\multicolumn";

/// One cell of a parsed table row.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TableCell {
    /// Cell source, with span directive unwrapped and math delimiters added
    pub content: String,
    pub column_span: usize,
    pub alignment: Alignment,
    pub has_math_content: bool,
    /// The column this cell starts in has a `|` before it
    pub border_before: bool,
    /// The cell ends at the last column and the spec has a trailing `|`
    pub border_after: bool,
    /// The cell came from a span directive
    pub spanning: bool,
}

impl TableCell {
    /// A regular cell in a declared column.
    pub fn plain(content: &str, alignment: Alignment) -> Self {
        let content = content.trim().to_string();
        TableCell {
            has_math_content: has_math(&content),
            content,
            column_span: 1,
            alignment,
            border_before: false,
            border_after: false,
            spanning: false,
        }
    }

    /// A cell built from a parsed span directive.
    pub fn spanning(directive: SpanDirective) -> Self {
        let content = if is_math_indicative(&directive.content) && !directive.content.contains('$') {
            wrap_math(&directive.content)
        } else {
            directive.content.trim().to_string()
        };
        TableCell {
            has_math_content: has_math(&content),
            content,
            column_span: directive.span,
            alignment: directive.alignment,
            border_before: false,
            border_after: false,
            spanning: true,
        }
    }

    /// How the cell content should be rendered.
    pub fn kind(&self) -> CellKind {
        classify_cell(&self.content)
    }
}

/// `\multicolumn{span}{format}{content}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanDirective {
    pub span: usize,
    pub format: String,
    pub alignment: Alignment,
    pub content: String,
}

/// True when `raw` is written as a span directive (well-formed or not).
pub fn is_span_directive(raw: &str) -> bool {
    raw.trim_start().starts_with(SPAN_DIRECTIVE)
}

/// Parse a span directive. Returns `None` when the three-part form does not
/// match or the span count is not a positive integer. Spans above
/// [`MAX_COLUMNS`] are capped.
pub fn parse_span_directive(raw: &str) -> Option<SpanDirective> {
    let raw = raw.trim();
    let rest = raw.strip_prefix(SPAN_DIRECTIVE)?;
    let base = raw.len() - rest.len();

    let (count, next) = parse_braced(raw, skip_ws(raw, base))?;
    let (format, next) = parse_braced(raw, skip_ws(raw, next))?;
    let (content, next) = parse_braced(raw, skip_ws(raw, next))?;
    if !raw[next..].trim().is_empty() {
        return None;
    }

    let span = count.trim().parse::<usize>().ok().filter(|n| *n >= 1)?.min(MAX_COLUMNS);
    Some(SpanDirective {
        span,
        format: format.to_string(),
        alignment: format_alignment(format),
        content: content.to_string(),
    })
}

/// Alignment of a span format: centered unless `l` or `r` appears, `r` wins.
fn format_alignment(format: &str) -> Alignment {
    if format.contains('r') {
        Alignment::Right
    } else if format.contains('l') {
        Alignment::Left
    } else {
        Alignment::Center
    }
}

/// Characters that mark span-directive content as a formula.
fn is_math_indicative(content: &str) -> bool {
    content
        .chars()
        .any(|c| matches!(c, '\\' | '_' | '^' | '$' | '+' | '=' | '<' | '>'))
}

/// A cell contains math when it has a dollar sign, a backslash command or
/// a sub/superscript marker.
pub fn has_math(content: &str) -> bool {
    content.contains('$') || content.contains('_') || content.contains('^') || has_command(content, |_| true)
}

fn has_command(content: &str, mut pred: impl FnMut(&str) -> bool) -> bool {
    let mut i = 0usize;
    while let Some(rel) = content[i..].find('\\') {
        let at = i + rel;
        if let Some((name, next)) = read_command(content, at) {
            if pred(name) {
                return true;
            }
            i = next;
        } else {
            i = at + 1;
        }
    }
    false
}

/// How a cell's content is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellKind {
    /// A parenthesised label such as `(IV)` or `(P)`, kept out of math
    Label { class: &'static str, text: String },
    /// A bare formula, emitted wrapped in `$..$`
    Math(String),
    /// Text, possibly with inline `$..$` spans, for the inline processor
    Text(String),
}

/// Classify cell content.
pub fn classify_cell(content: &str) -> CellKind {
    let trimmed = content.trim();

    if is_single_formula(trimmed) {
        return CellKind::Math(trimmed.to_string());
    }
    if ROMAN_LABEL.is_match(trimmed) {
        return CellKind::Label {
            class: "roman-numeral",
            text: trimmed.to_string(),
        };
    }
    if LETTER_LABEL.is_match(trimmed) {
        return CellKind::Label {
            class: "label-notation",
            text: trimmed.to_string(),
        };
    }
    if trimmed.contains('$') {
        return CellKind::Text(trimmed.to_string());
    }

    let math_command = has_command(trimmed, |name| !TEXT_COMMANDS.contains(name.trim_end_matches('*')));
    if math_command || trimmed.contains('_') || trimmed.contains('^') {
        return CellKind::Math(wrap_math(trimmed));
    }
    CellKind::Text(trimmed.to_string())
}

/// `$..$` around the whole cell with no other dollar inside.
fn is_single_formula(s: &str) -> bool {
    s.len() > 2
        && s.starts_with('$')
        && s.ends_with('$')
        && !s[1..s.len() - 1].contains('$')
}

/// Normalize a bare formula and wrap it in `$..$`.
///
/// `\text{..}` spans are set aside first and restored verbatim afterwards,
/// so their words are not touched by the normalization.
pub fn wrap_math(content: &str) -> String {
    let (protected, texts) = protect_text_spans(content.trim());
    let normalized = normalize_math(&protected);
    format!("${}$", restore_text_spans(&normalized, &texts))
}

fn protect_text_spans(content: &str) -> (String, Vec<String>) {
    let mut out = String::with_capacity(content.len());
    let mut texts = Vec::new();
    let mut i = 0usize;
    while let Some(rel) = content[i..].find("\\text") {
        let at = i + rel;
        let span = read_command(content, at)
            .filter(|(name, _)| *name == "text")
            .and_then(|(_, next)| parse_braced(content, skip_ws(content, next)));
        match span {
            Some((_, end)) => {
                out.push_str(&content[i..at]);
                out.push(TEXT_MARKER);
                out.push_str(&texts.len().to_string());
                out.push(TEXT_MARKER);
                texts.push(content[at..end].to_string());
                i = end;
            }
            None => {
                let next = at + "\\text".len();
                out.push_str(&content[i..next]);
                i = next;
            }
        }
    }
    out.push_str(&content[i..]);
    (out, texts)
}

fn restore_text_spans(content: &str, texts: &[String]) -> String {
    let mut out = String::with_capacity(content.len());
    let mut parts = content.split(TEXT_MARKER);
    if let Some(first) = parts.next() {
        out.push_str(first);
    }
    // Split yields index, text, index, text... after the first piece.
    while let (Some(index), Some(after)) = (parts.next(), parts.next()) {
        match index.parse::<usize>().ok().and_then(|i| texts.get(i)) {
            Some(text) => out.push_str(text),
            None => out.push_str(index),
        }
        out.push_str(after);
    }
    out
}

/// Collapse whitespace and escape characters that are special in math mode
/// but meant literally in a cell (`&`, `%`, `#`).
fn normalize_math(content: &str) -> String {
    let collapsed = collapse_whitespace(content);
    let mut out = String::with_capacity(collapsed.len());
    for (idx, ch) in collapsed.char_indices() {
        if matches!(ch, '&' | '%' | '#') && !is_escaped(&collapsed, idx) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
