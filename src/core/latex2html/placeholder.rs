//! Placeholder store
//!
//! Extracted environment blocks are swapped for opaque tokens so that later
//! passes (line splitting, inline commands) cannot cut through them. The
//! store is owned by a single conversion pass and dropped with it.
//!
//! Tokens are built from Unicode private-use code points that are stripped
//! from the source before a pass starts, so a token can never collide with
//! user text.

use fxhash::FxHashMap;
use std::fmt;

use crate::utils::error::{ConversionError, Result};

/// Opens a placeholder token.
pub const TOKEN_OPEN: char = '\u{E000}';
/// Closes a placeholder token.
pub const TOKEN_CLOSE: char = '\u{E001}';
/// Stands in for a protected `&` inside a span directive.
pub const AMP_MARKER: char = '\u{E002}';
/// Opens a region of structural markup.
pub const BLOCK_OPEN: char = '\u{E003}';
/// Closes a region of structural markup.
pub const BLOCK_CLOSE: char = '\u{E004}';
/// Brackets a protected `\text{..}` span inside a math cell.
pub const TEXT_MARKER: char = '\u{E005}';

const TOKEN_TAG: &str = "ENV";

/// Characters the transformer reserves for its own markers.
pub const RESERVED_CHARS: [char; 6] = [
    TOKEN_OPEN,
    TOKEN_CLOSE,
    AMP_MARKER,
    BLOCK_OPEN,
    BLOCK_CLOSE,
    TEXT_MARKER,
];

/// Strip reserved marker characters from source text.
///
/// Returns the cleaned text and whether anything was removed.
pub fn strip_reserved(text: &str) -> (String, bool) {
    if !text.contains(&RESERVED_CHARS[..]) {
        return (text.to_string(), false);
    }
    let cleaned: String = text.chars().filter(|c| !RESERVED_CHARS.contains(c)).collect();
    (cleaned, true)
}

/// An opaque token standing in for one extracted block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaceholderToken {
    id: usize,
    text: String,
}

impl PlaceholderToken {
    fn new(id: usize) -> Self {
        PlaceholderToken {
            id,
            text: format!("{}{}{}{}", TOKEN_OPEN, TOKEN_TAG, id, TOKEN_CLOSE),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for PlaceholderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug)]
struct Entry {
    content: String,
    label: Option<String>,
}

/// Bijective token <-> content map for one pass.
#[derive(Debug, Default)]
pub struct PlaceholderStore {
    next_id: usize,
    entries: FxHashMap<usize, Entry>,
}

impl PlaceholderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh token for `content`.
    pub fn reserve(&mut self, content: impl Into<String>) -> PlaceholderToken {
        self.insert(content.into(), None)
    }

    /// Allocate a fresh token and remember a label (usually the environment
    /// name) for diagnostics.
    pub fn reserve_labeled(
        &mut self,
        content: impl Into<String>,
        label: impl Into<String>,
    ) -> PlaceholderToken {
        self.insert(content.into(), Some(label.into()))
    }

    fn insert(&mut self, content: String, label: Option<String>) -> PlaceholderToken {
        let token = PlaceholderToken::new(self.next_id);
        self.next_id += 1;
        self.entries.insert(token.id, Entry { content, label });
        token
    }

    /// Content currently bound to `token`.
    pub fn resolve(&self, token: &PlaceholderToken) -> Option<&str> {
        self.entries.get(&token.id).map(|e| e.content.as_str())
    }

    /// Label recorded for `token`, if any.
    pub fn label(&self, token: &PlaceholderToken) -> Option<&str> {
        self.entries.get(&token.id).and_then(|e| e.label.as_deref())
    }

    /// Replace the content bound to `token` (raw source -> transformed output).
    pub fn rebind(&mut self, token: &PlaceholderToken, content: impl Into<String>) -> bool {
        match self.entries.get_mut(&token.id) {
            Some(entry) => {
                entry.content = content.into();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace every token in `text` with its bound content.
    ///
    /// Bound content may itself contain tokens; substitution repeats until
    /// none remain. A token that is not in the store is an error, never
    /// silently dropped.
    pub fn substitute_all(&self, text: &str) -> Result<String> {
        let mut current = text.to_string();
        for _ in 0..=self.entries.len() {
            if !current.contains(TOKEN_OPEN) {
                return Ok(current);
            }
            current = self.substitute_once(&current)?;
        }
        Err(ConversionError::internal_at(
            "placeholder substitution did not converge",
            snippet_around(&current, current.find(TOKEN_OPEN).unwrap_or(0)),
        ))
    }

    fn substitute_once(&self, text: &str) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut offset = 0usize;
        while let Some(rel) = text[offset..].find(TOKEN_OPEN) {
            let pos = offset + rel;
            out.push_str(&text[offset..pos]);
            let body_start = pos + TOKEN_OPEN.len_utf8();
            let (id, consumed) = parse_token_body(&text[body_start..]).ok_or_else(|| {
                ConversionError::internal_at("malformed placeholder token", snippet_around(text, pos))
            })?;
            let entry = self.entries.get(&id).ok_or_else(|| {
                ConversionError::internal_at(
                    format!("unresolved placeholder token #{}", id),
                    snippet_around(text, pos),
                )
            })?;
            out.push_str(&entry.content);
            offset = body_start + consumed;
        }
        out.push_str(&text[offset..]);
        Ok(out)
    }
}

/// True when `text` still carries placeholder tokens.
pub fn contains_tokens(text: &str) -> bool {
    text.contains(TOKEN_OPEN)
}

fn parse_token_body(s: &str) -> Option<(usize, usize)> {
    let rest = s.strip_prefix(TOKEN_TAG)?;
    let digits = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let id = rest[..digits].parse().ok()?;
    let after = &rest[digits..];
    if !after.starts_with(TOKEN_CLOSE) {
        return None;
    }
    Some((id, TOKEN_TAG.len() + digits + TOKEN_CLOSE.len_utf8()))
}

/// A short, printable excerpt of `text` around byte `pos`.
fn snippet_around(text: &str, pos: usize) -> String {
    let start = text[..pos.min(text.len())]
        .char_indices()
        .rev()
        .nth(20)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let excerpt: String = text[start..].chars().take(48).collect();
    excerpt
        .chars()
        .map(|c| if RESERVED_CHARS.contains(&c) { '¤' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_is_unique_and_resolvable() {
        let mut store = PlaceholderStore::new();
        let a = store.reserve("alpha");
        let b = store.reserve("beta");
        assert_ne!(a, b);
        assert_eq!(store.resolve(&a), Some("alpha"));
        assert_eq!(store.resolve(&b), Some("beta"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_substitute_all_restores_content() {
        let mut store = PlaceholderStore::new();
        let a = store.reserve("<ol></ol>");
        let text = format!("before {} after {}", a, a);
        let out = store.substitute_all(&text).unwrap();
        assert_eq!(out, "before <ol></ol> after <ol></ol>");
        assert!(!contains_tokens(&out));
    }

    #[test]
    fn test_substitute_all_is_idempotent() {
        let mut store = PlaceholderStore::new();
        let a = store.reserve("x");
        let once = store.substitute_all(&format!("{}!", a)).unwrap();
        let twice = store.substitute_all(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_nested_tokens_resolve() {
        let mut store = PlaceholderStore::new();
        let inner = store.reserve("inner");
        let outer = store.reserve(format!("[{}]", inner));
        assert_eq!(store.substitute_all(outer.as_str()).unwrap(), "[inner]");
    }

    #[test]
    fn test_rebind_replaces_content() {
        let mut store = PlaceholderStore::new();
        let a = store.reserve_labeled(r"\begin{quote}x\end{quote}", "quote");
        assert!(store.rebind(&a, "<blockquote>x</blockquote>"));
        assert_eq!(store.label(&a), Some("quote"));
        assert_eq!(store.substitute_all(a.as_str()).unwrap(), "<blockquote>x</blockquote>");
    }

    #[test]
    fn test_unknown_token_is_an_error() {
        let store = PlaceholderStore::new();
        let foreign = PlaceholderToken::new(7);
        let err = store.substitute_all(&format!("a {} b", foreign)).unwrap_err();
        assert!(err.to_string().contains("unresolved placeholder token #7"));
    }

    #[test]
    fn test_strip_reserved() {
        let (clean, removed) = strip_reserved("a\u{E000}b\u{E003}c");
        assert_eq!(clean, "abc");
        assert!(removed);
        let (same, removed) = strip_reserved("plain");
        assert_eq!(same, "plain");
        assert!(!removed);
    }
}
