//! Segment splitter
//!
//! Cuts resolved text into plain-text, structural and math segments in source
//! order. Math is recognised in the forms `$$..$$`, `$..$`, `\[..\]`, `\(..\)`
//! and bare math environments; `\$` is never a delimiter.

use serde::Serialize;

use super::placeholder::{BLOCK_CLOSE, BLOCK_OPEN};
use super::utils::{is_escaped, parse_braced};
use crate::data::constants::is_math_environment;
use crate::html::SafeHtml;

/// One unit of converted output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum Segment {
    /// Escaped text, possibly with inline formatting tags
    PlainText(SafeHtml),
    /// Raw formula for inline typesetting
    InlineMath(String),
    /// Raw formula for display typesetting
    DisplayMath(String),
    /// Markup produced by a structural environment
    StructuralBlock(SafeHtml),
}

impl Segment {
    pub fn is_math(&self) -> bool {
        matches!(self, Segment::InlineMath(_) | Segment::DisplayMath(_))
    }

    /// The formula carried by a math segment.
    pub fn formula(&self) -> Option<&str> {
        match self {
            Segment::InlineMath(f) | Segment::DisplayMath(f) => Some(f),
            _ => None,
        }
    }
}

/// One output line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Line {
    pub segments: Vec<Segment>,
}

impl Line {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// A converted document: lines of segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    pub lines: Vec<Line>,
}

impl Document {
    /// All segments in document order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.lines.iter().flat_map(|l| l.segments.iter())
    }

    /// Number of math segments.
    pub fn formula_count(&self) -> usize {
        self.segments().filter(|s| s.is_math()).count()
    }
}

// =============================================================================
// Math span scanning
// =============================================================================

/// A delimited formula found in text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathSpan {
    /// Byte offset of the opening delimiter
    pub start: usize,
    /// Byte offset just past the closing delimiter
    pub end: usize,
    /// Range of the formula passed to the renderer
    pub content_start: usize,
    pub content_end: usize,
    pub display: bool,
}

impl MathSpan {
    pub fn content<'a>(&self, text: &'a str) -> &'a str {
        &text[self.content_start..self.content_end]
    }
}

/// Find every math span in `text`, left to right, without overlap.
///
/// The first opening delimiter wins; an opener with no closer is literal text
/// and scanning resumes right after it.
pub fn find_math_spans(text: &str) -> Vec<MathSpan> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                if let Some(span) = scan_backslash_math(text, i) {
                    i = span.end;
                    spans.push(span);
                } else {
                    // Skip the escaped character (`\$`, `\\`, ...)
                    i += 2;
                }
            }
            b'$' => {
                if let Some(span) = scan_dollar_math(text, i) {
                    i = span.end;
                    spans.push(span);
                } else if bytes.get(i + 1) == Some(&b'$') {
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    spans
}

fn scan_dollar_math(text: &str, at: usize) -> Option<MathSpan> {
    let bytes = text.as_bytes();
    if bytes.get(at + 1) == Some(&b'$') {
        let content_start = at + 2;
        let close = find_unescaped_str(text, content_start, "$$")?;
        return Some(MathSpan {
            start: at,
            end: close + 2,
            content_start,
            content_end: close,
            display: true,
        });
    }

    let content_start = at + 1;
    let close = find_unescaped_str(text, content_start, "$")?;
    if close == content_start {
        return None;
    }
    Some(MathSpan {
        start: at,
        end: close + 1,
        content_start,
        content_end: close,
        display: false,
    })
}

fn scan_backslash_math(text: &str, at: usize) -> Option<MathSpan> {
    let rest = &text[at..];
    let (closer, display) = if rest.starts_with("\\(") {
        ("\\)", false)
    } else if rest.starts_with("\\[") {
        ("\\]", true)
    } else if rest.starts_with("\\begin{") {
        return scan_math_environment(text, at);
    } else {
        return None;
    };

    let content_start = at + 2;
    let close = find_unescaped_str(text, content_start, closer)?;
    Some(MathSpan {
        start: at,
        end: close + closer.len(),
        content_start,
        content_end: close,
        display,
    })
}

/// A bare `\begin{equation}..\end{equation}` block; the renderer gets the
/// whole block, delimiters included.
fn scan_math_environment(text: &str, at: usize) -> Option<MathSpan> {
    let (name, _) = parse_braced(text, at + "\\begin".len())?;
    if !is_math_environment(name) {
        return None;
    }
    let marker = format!("\\end{{{}}}", name);
    let close = find_unescaped_str(text, at, &marker)?;
    let end = close + marker.len();
    Some(MathSpan {
        start: at,
        end,
        content_start: at,
        content_end: end,
        display: true,
    })
}

fn find_unescaped_str(text: &str, from: usize, needle: &str) -> Option<usize> {
    let mut search = from;
    while search <= text.len() {
        let at = search + text[search..].find(needle)?;
        if !is_escaped(text, at) {
            return Some(at);
        }
        search = at + needle.len();
    }
    None
}

// =============================================================================
// Splitting
// =============================================================================

/// Split one line of raw source into segments.
///
/// Text outside math is escaped. This is the standalone form; converted
/// output goes through [`split_resolved`].
pub fn split_segments(line: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    push_pieces(line, &mut segments, |text| Segment::PlainText(SafeHtml::escape(text)));
    segments
}

/// Split converted text into segments.
///
/// Text outside math is already markup. Regions bracketed by the structural
/// sentinels become [`Segment::StructuralBlock`]; everything else at the top
/// level is [`Segment::PlainText`]. The sentinels themselves are dropped.
pub(crate) fn split_resolved(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for (in_block, region) in block_regions(text) {
        if in_block {
            push_pieces(&region, &mut segments, |t| Segment::StructuralBlock(SafeHtml::trusted(t)));
        } else {
            push_pieces(&region, &mut segments, |t| Segment::PlainText(SafeHtml::trusted(t)));
        }
    }
    segments
}

fn push_pieces(text: &str, segments: &mut Vec<Segment>, mut plain: impl FnMut(&str) -> Segment) {
    let mut cursor = 0usize;
    for span in find_math_spans(text) {
        if span.start > cursor {
            segments.push(plain(&text[cursor..span.start]));
        }
        let formula = span.content(text).to_string();
        segments.push(if span.display {
            Segment::DisplayMath(formula)
        } else {
            Segment::InlineMath(formula)
        });
        cursor = span.end;
    }
    if cursor < text.len() {
        segments.push(plain(&text[cursor..]));
    }
}

/// Partition text into maximal runs inside and outside structural sentinels.
fn block_regions(text: &str) -> Vec<(bool, String)> {
    let mut regions: Vec<(bool, String)> = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    for ch in text.chars() {
        match ch {
            BLOCK_OPEN => {
                flush(depth > 0, &mut current, &mut regions);
                depth += 1;
            }
            BLOCK_CLOSE => {
                flush(depth > 0, &mut current, &mut regions);
                depth = depth.saturating_sub(1);
            }
            _ => current.push(ch),
        }
    }
    flush(depth > 0, &mut current, &mut regions);
    regions
}

fn flush(in_block: bool, current: &mut String, regions: &mut Vec<(bool, String)>) {
    if current.is_empty() {
        return;
    }
    match regions.last_mut() {
        Some((kind, buf)) if *kind == in_block => buf.push_str(current),
        _ => regions.push((in_block, std::mem::take(current))),
    }
    current.clear();
}

/// Split top-level text into lines on `\\` and on blank lines, never inside
/// a math span. Whitespace-only lines are dropped.
pub fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let spans = find_math_spans(text);
    let mut spans_iter = spans.iter().peekable();
    let mut lines = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if let Some(span) = spans_iter.peek() {
            if i == span.start {
                i = span.end;
                spans_iter.next();
                continue;
            }
        }
        match bytes[i] {
            b'\\' if bytes.get(i + 1) == Some(&b'\\') => {
                lines.push(&text[start..i]);
                i += 2;
                start = i;
            }
            b'\\' => i += 2,
            b'\n' => {
                if let Some(next) = blank_line_end(bytes, i) {
                    lines.push(&text[start..i]);
                    i = next;
                    start = i;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines.retain(|l| !l.trim().is_empty());
    lines
}

/// If a newline at `i` starts a blank line (newline, optional spaces,
/// newline), return the index after the last newline of the run.
fn blank_line_end(bytes: &[u8], i: usize) -> Option<usize> {
    let mut j = i + 1;
    let mut end = None;
    while j < bytes.len() {
        match bytes[j] {
            b' ' | b'\t' | b'\r' => j += 1,
            b'\n' => {
                j += 1;
                end = Some(j);
            }
            _ => break,
        }
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plain(s: &str) -> Segment {
        Segment::PlainText(SafeHtml::escape(s))
    }

    #[test]
    fn test_inline_math_split() {
        assert_eq!(
            split_segments("The value is $x^2$ today."),
            vec![
                plain("The value is "),
                Segment::InlineMath("x^2".to_string()),
                plain(" today."),
            ]
        );
    }

    #[test]
    fn test_no_delimiters_single_segment() {
        assert_eq!(split_segments("just text"), vec![plain("just text")]);
    }

    #[test]
    fn test_display_math_first_delimiter_wins() {
        assert_eq!(
            split_segments("a $$x$$ b $y$"),
            vec![
                plain("a "),
                Segment::DisplayMath("x".to_string()),
                plain(" b "),
                Segment::InlineMath("y".to_string()),
            ]
        );
    }

    #[test]
    fn test_adjacent_inline_spans() {
        assert_eq!(
            split_segments("$a$$b$"),
            vec![
                Segment::InlineMath("a".to_string()),
                Segment::InlineMath("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_bracket_delimiters() {
        assert_eq!(
            split_segments(r"see \(a+b\) and \[c\]"),
            vec![
                plain("see "),
                Segment::InlineMath("a+b".to_string()),
                plain(" and "),
                Segment::DisplayMath("c".to_string()),
            ]
        );
    }

    #[test]
    fn test_escaped_dollar_is_text() {
        let segs = split_segments(r"costs \$5 and \$6");
        assert_eq!(segs.len(), 1);
        assert!(!segs[0].is_math());
    }

    #[test]
    fn test_unclosed_dollar_is_text() {
        assert_eq!(split_segments("a $ b"), vec![plain("a $ b")]);
    }

    #[test]
    fn test_bare_math_environment() {
        let src = r"x \begin{equation}E=mc^2\end{equation} y";
        let segs = split_segments(src);
        assert_eq!(
            segs[1],
            Segment::DisplayMath(r"\begin{equation}E=mc^2\end{equation}".to_string())
        );
    }

    #[test]
    fn test_plain_text_is_escaped() {
        assert_eq!(
            split_segments("a < b"),
            vec![Segment::PlainText(SafeHtml::escape("a < b"))]
        );
    }

    #[test]
    fn test_split_resolved_blocks() {
        let text = format!("intro {}<ul><li>$x$</li></ul>{} tail", BLOCK_OPEN, BLOCK_CLOSE);
        let segs = split_resolved(&text);
        assert_eq!(
            segs,
            vec![
                Segment::PlainText(SafeHtml::trusted("intro ")),
                Segment::StructuralBlock(SafeHtml::trusted("<ul><li>")),
                Segment::InlineMath("x".to_string()),
                Segment::StructuralBlock(SafeHtml::trusted("</li></ul>")),
                Segment::PlainText(SafeHtml::trusted(" tail")),
            ]
        );
    }

    #[test]
    fn test_nested_blocks_merge() {
        let text = format!("{}<div>{}<p></p>{}</div>{}", BLOCK_OPEN, BLOCK_OPEN, BLOCK_CLOSE, BLOCK_CLOSE);
        assert_eq!(
            split_resolved(&text),
            vec![Segment::StructuralBlock(SafeHtml::trusted("<div><p></p></div>"))]
        );
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines(r"one \\ two"), vec!["one ", " two"]);
        assert_eq!(split_lines("para one\n\npara two"), vec!["para one", "para two"]);
        assert_eq!(split_lines("soft\nwrap"), vec!["soft\nwrap"]);
    }

    #[test]
    fn test_split_lines_skips_math() {
        assert_eq!(
            split_lines(r"$$a \\ b$$ \\ next"),
            vec![r"$$a \\ b$$ ", " next"]
        );
        assert_eq!(split_lines(r"a \\ \\ b"), vec!["a ", " b"]);
    }

    #[test]
    fn test_segment_serializes_with_kind() {
        let json = serde_json::to_string(&Segment::InlineMath("x".to_string())).unwrap();
        assert_eq!(json, r#"{"kind":"inline_math","content":"x"}"#);
    }
}
