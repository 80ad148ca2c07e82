//! Typed HTML fragments
//!
//! Text that came from the user and markup produced by the transformer are
//! kept apart at the type level: a [`SafeHtml`] can only be built by escaping
//! untrusted text or, inside this crate, by a handler that emits structure.

use serde::Serialize;
use std::fmt;

/// An HTML fragment that is safe to interpolate into a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SafeHtml(String);

impl SafeHtml {
    /// Escape untrusted text into a fragment.
    pub fn escape(text: &str) -> Self {
        SafeHtml(escape_html(text))
    }

    /// Escape text that must stay literal: besides markup characters, `$`
    /// and `\` become character references so no math delimiter survives.
    pub fn literal(text: &str) -> Self {
        SafeHtml(escape_literal(text))
    }

    /// Wrap markup produced by the transformer itself.
    pub(crate) fn trusted(markup: impl Into<String>) -> Self {
        SafeHtml(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SafeHtml {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Escape the characters that are significant in HTML text and attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// [`escape_html`] plus `$` and `\` as character references.
pub fn escape_literal(text: &str) -> String {
    escape_html(text).replace('\\', "&#92;").replace('$', "&#36;")
}
