//! Utility functions for LaTeX to HTML conversion
//!
//! This module contains pure scanning helpers that don't depend on converter state.
//! All indices are byte offsets; every delimiter we look for is ASCII, so the
//! offsets we return always sit on character boundaries.

// =============================================================================
// Group Scanning
// =============================================================================

/// Skip ASCII whitespace starting at `i`.
pub fn skip_ws(s: &str, mut i: usize) -> usize {
    let bytes = s.as_bytes();
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Parse a balanced `{...}` group starting at `start`.
///
/// Returns the inner content and the index just past the closing brace.
/// Escaped braces (`\{`, `\}`) do not count towards the balance.
pub fn parse_braced(s: &str, start: usize) -> Option<(&str, usize)> {
    parse_group(s, start, b'{', b'}')
}

/// Parse a `[...]` group starting at `start`; braces inside are balanced so
/// `[label={a]}]` stays one group.
pub fn parse_bracketed(s: &str, start: usize) -> Option<(&str, usize)> {
    let bytes = s.as_bytes();
    if start >= bytes.len() || bytes[start] != b'[' {
        return None;
    }
    let mut brace_depth = 0i32;
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => brace_depth += 1,
            b'}' => brace_depth -= 1,
            b']' if brace_depth <= 0 => return Some((&s[start + 1..i], i + 1)),
            _ => {}
        }
        i += 1;
    }
    None
}

fn parse_group(s: &str, start: usize, open: u8, close: u8) -> Option<(&str, usize)> {
    let bytes = s.as_bytes();
    if start >= bytes.len() || bytes[start] != open {
        return None;
    }
    let mut depth = 0i32;
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' {
            i += 2;
            continue;
        }
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some((&s[start + 1..i], i + 1));
            }
        }
        i += 1;
    }
    None
}

/// Read a control word (`\name`) starting at the backslash at `start`.
///
/// Returns the name without the backslash and the index after it.
pub fn read_command(s: &str, start: usize) -> Option<(&str, usize)> {
    let bytes = s.as_bytes();
    if start >= bytes.len() || bytes[start] != b'\\' {
        return None;
    }
    let mut i = start + 1;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    if i == start + 1 {
        return None;
    }
    // A starred form such as \section* belongs to the name.
    if i < bytes.len() && bytes[i] == b'*' {
        i += 1;
    }
    Some((&s[start + 1..i], i))
}

/// True when the byte at `idx` is preceded by an odd number of backslashes.
pub fn is_escaped(s: &str, idx: usize) -> bool {
    let bytes = s.as_bytes();
    let mut count = 0usize;
    let mut i = idx;
    while i > 0 && bytes[i - 1] == b'\\' {
        count += 1;
        i -= 1;
    }
    count % 2 == 1
}

/// Find the next unescaped occurrence of `byte` at or after `from`.
pub fn find_unescaped(s: &str, from: usize, byte: u8) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == byte && !is_escaped(s, i) {
            return Some(i);
        }
        i += 1;
    }
    None
}

// =============================================================================
// Text Processing Utilities
// =============================================================================

/// Collapse runs of whitespace to a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitize an environment name for use in a CSS class.
/// Anything outside `[A-Za-z0-9-]` becomes a single hyphen.
pub fn sanitize_class_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_dash = false;
    for ch in name.chars() {
        let mapped = if ch.is_ascii_alphanumeric() || ch == '-' {
            ch
        } else {
            '-'
        };
        if mapped == '-' {
            if prev_dash {
                continue;
            }
            prev_dash = true;
        } else {
            prev_dash = false;
        }
        out.push(mapped);
    }
    let trimmed = out.trim_matches('-').to_string();
    if trimmed.is_empty() {
        "env".to_string()
    } else {
        trimmed
    }
}
