//! Inline command processing
//!
//! Turns text outside math into HTML: escapes it, then applies the supported
//! text commands in a fixed order. Math spans are masked while the commands
//! run and restored verbatim afterwards, so a command argument may contain
//! a formula and the segment splitter still finds it.

use super::placeholder::TEXT_MARKER;
use super::segment::find_math_spans;
use super::utils::{is_escaped, parse_braced, read_command, skip_ws};
use crate::html::escape_html;

const TRIANGLE_GLYPH: &str = "\u{25B3}";
const BULLET: &str = "\u{2022} ";

/// Convert text with embedded math into markup.
///
/// Each math span is swapped for an indexed marker, the masked text goes
/// through [`render_plain`], and the spans are put back unchanged.
pub fn process_inline(text: &str) -> String {
    let spans = find_math_spans(text);
    if spans.is_empty() {
        return render_plain(text);
    }

    let mut masked = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for (idx, span) in spans.iter().enumerate() {
        masked.push_str(&text[cursor..span.start]);
        masked.push(TEXT_MARKER);
        masked.push_str(&idx.to_string());
        masked.push(TEXT_MARKER);
        cursor = span.end;
    }
    masked.push_str(&text[cursor..]);

    let formulas: Vec<&str> = spans.iter().map(|span| &text[span.start..span.end]).collect();
    restore_math(&render_plain(&masked), &formulas)
}

fn restore_math(html: &str, formulas: &[&str]) -> String {
    let mut out = String::with_capacity(html.len() + formulas.iter().map(|f| f.len()).sum::<usize>());
    let mut parts = html.split(TEXT_MARKER);
    if let Some(first) = parts.next() {
        out.push_str(first);
    }
    // index, text, index, text...
    while let (Some(index), Some(after)) = (parts.next(), parts.next()) {
        if let Some(formula) = index.parse::<usize>().ok().and_then(|i| formulas.get(i)) {
            out.push_str(formula);
        }
        out.push_str(after);
    }
    out
}

/// Convert a run of text that contains no math.
///
/// Order: bold, italic/emphasis, `\text`, the triangle glyph, sub/superscript
/// braces, headings, stray items, then literal escapes.
pub fn render_plain(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut s = escape_html(text);
    s = replace_command(&s, &["textbf"], |inner| format!("<strong>{}</strong>", inner));
    s = replace_command(&s, &["textit", "emph"], |inner| format!("<em>{}</em>", inner));
    s = replace_command(&s, &["text"], |inner| inner.to_string());
    s = replace_triangle(&s);
    s = replace_script(&s, '_', "sub");
    s = replace_script(&s, '^', "sup");
    s = replace_command(&s, &["section", "section*"], |inner| {
        format!("<h2 class=\"latex-section\">{}</h2>", inner.trim())
    });
    s = replace_command(&s, &["subsection", "subsection*"], |inner| {
        format!("<h3 class=\"latex-subsection\">{}</h3>", inner.trim())
    });
    s = replace_stray_items(&s);
    finish_escapes(&s)
}

/// Replace `\name{arg}` for each of `names`. The argument is matched with one
/// balanced brace group and re-scanned for the same commands.
fn replace_command(text: &str, names: &[&str], wrap: impl Fn(&str) -> String + Copy) -> String {
    if !names.iter().any(|n| text.contains(&format!("\\{}", n.trim_end_matches('*')))) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut i = 0usize;
    while let Some(rel) = text[i..].find('\\') {
        let at = i + rel;
        out.push_str(&text[i..at]);

        if is_escaped(text, at) {
            out.push('\\');
            i = at + 1;
            continue;
        }

        match read_command(text, at) {
            Some((name, after)) if names.contains(&name) => {
                match parse_braced(text, skip_ws(text, after)) {
                    Some((inner, end)) => {
                        out.push_str(&wrap(&replace_command(inner, names, wrap)));
                        i = end;
                    }
                    None => {
                        out.push_str(&text[at..after]);
                        i = after;
                    }
                }
            }
            Some((_, after)) => {
                out.push_str(&text[at..after]);
                i = after;
            }
            None => {
                out.push('\\');
                i = at + 1;
            }
        }
    }
    out.push_str(&text[i..]);
    out
}

/// `\triangle` followed by whitespace or a non-letter becomes the glyph;
/// trailing whitespace is consumed.
fn replace_triangle(text: &str) -> String {
    const CMD: &str = "\\triangle";
    if !text.contains(CMD) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut i = 0usize;
    while let Some(rel) = text[i..].find(CMD) {
        let at = i + rel;
        out.push_str(&text[i..at]);
        let after = at + CMD.len();
        let next_is_letter = text[after..].chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        if is_escaped(text, at) || next_is_letter {
            out.push_str(CMD);
            i = after;
        } else {
            out.push_str(TRIANGLE_GLYPH);
            i = skip_ws(text, after);
        }
    }
    out.push_str(&text[i..]);
    out
}

/// `_{X}` / `^{X}` outside math become `<sub>` / `<sup>`.
fn replace_script(text: &str, marker: char, tag: &str) -> String {
    if !text.contains(marker) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut i = 0usize;
    while let Some(rel) = text[i..].find(marker) {
        let at = i + rel;
        out.push_str(&text[i..at]);
        let after = at + marker.len_utf8();
        match parse_braced(text, after).filter(|_| !is_escaped(text, at)) {
            Some((inner, end)) => {
                out.push_str(&format!("<{}>{}</{}>", tag, inner, tag));
                i = end;
            }
            None => {
                out.push(marker);
                i = after;
            }
        }
    }
    out.push_str(&text[i..]);
    out
}

/// An `\item` outside any list renders as a bullet.
fn replace_stray_items(text: &str) -> String {
    const CMD: &str = "\\item";
    if !text.contains(CMD) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut i = 0usize;
    while let Some(rel) = text[i..].find(CMD) {
        let at = i + rel;
        out.push_str(&text[i..at]);
        let after = at + CMD.len();
        let next_is_letter = text[after..].chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        if is_escaped(text, at) || next_is_letter {
            out.push_str(CMD);
            i = after;
        } else {
            out.push_str(BULLET);
            i = skip_ws(text, after);
        }
    }
    out.push_str(&text[i..]);
    out
}

/// Resolve `\\`, escaped specials and leftover delimiters.
///
/// Runs on escaped text, so `\&` arrives as `\&amp;`. A leftover `$`, and a
/// backslash in front of a bracket or parenthesis, become character
/// references so no later pass reads them as math delimiters.
fn finish_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        match c {
            '\\' => {
                let tail = &rest[1..];
                if let Some(after) = tail.strip_prefix('\\') {
                    out.push_str("<br>");
                    rest = after;
                } else if let Some(after) = tail.strip_prefix("&amp;") {
                    out.push_str("&amp;");
                    rest = after;
                } else if let Some(after) = tail.strip_prefix('$') {
                    out.push_str("&#36;");
                    rest = after;
                } else if let Some(ch @ ('%' | '#' | '_' | '{' | '}' | ' ')) = tail.chars().next() {
                    out.push(ch);
                    rest = &tail[1..];
                } else if tail.starts_with(['(', ')', '[', ']']) {
                    out.push_str("&#92;");
                    rest = tail;
                } else {
                    out.push('\\');
                    rest = tail;
                }
            }
            '$' => {
                out.push_str("&#36;");
                rest = &rest[1..];
            }
            _ => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}
