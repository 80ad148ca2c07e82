//! List environments: enumerate, itemize, description

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::Write;

use super::context::LatexConverter;
use super::utils::{is_escaped, parse_bracketed, skip_ws};

lazy_static! {
    /// `\setcounter{enumi}{N}` anywhere in an enumerate body
    static ref COUNTER_DIRECTIVE: Regex =
        Regex::new(r"\\setcounter\s*\{\s*enumi\s*\}\s*\{\s*(\d+)\s*\}").unwrap();
}

const ITEM_MARKER: &str = "\\item";

/// One list entry. `term` is only set for description lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ListItem {
    pub term: Option<String>,
    pub body: String,
}

/// Split list content into items.
///
/// An item runs from its `\item` to the next `\item` or the end of content.
/// Text before the first `\item` is dropped. With `with_terms`, a `[term]`
/// directly after `\item` becomes the item's term.
pub fn parse_items(content: &str, with_terms: bool) -> Vec<ListItem> {
    let markers = item_positions(content);
    let mut items = Vec::with_capacity(markers.len());

    for (idx, &at) in markers.iter().enumerate() {
        let body_end = markers.get(idx + 1).copied().unwrap_or(content.len());
        let mut body_start = at + ITEM_MARKER.len();
        let mut term = None;

        if with_terms {
            let bracket = skip_ws(content, body_start);
            if let Some((inner, next)) = parse_bracketed(content, bracket) {
                if next <= body_end {
                    let inner = inner.trim();
                    if !inner.is_empty() {
                        term = Some(inner.to_string());
                    }
                    body_start = next;
                }
            }
        }

        items.push(ListItem {
            term,
            body: content[body_start..body_end].trim().to_string(),
        });
    }
    items
}

/// Byte offsets of every `\item` command (not `\itemsep` and friends).
fn item_positions(content: &str) -> Vec<usize> {
    let bytes = content.as_bytes();
    let mut positions = Vec::new();
    let mut search = 0usize;
    while let Some(rel) = content[search..].find(ITEM_MARKER) {
        let at = search + rel;
        let after = at + ITEM_MARKER.len();
        search = after;
        if is_escaped(content, at) {
            continue;
        }
        if bytes.get(after).is_some_and(|b| b.is_ascii_alphabetic()) {
            continue;
        }
        positions.push(at);
    }
    positions
}

/// Remove the first `\setcounter{enumi}{N}` and return `N`.
pub fn take_counter_start(content: &str) -> (Option<u32>, String) {
    match COUNTER_DIRECTIVE.captures(content) {
        Some(caps) => {
            let start = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
            let stripped = COUNTER_DIRECTIVE.replace(content, "").into_owned();
            (start, stripped)
        }
        None => (None, content.to_string()),
    }
}

pub fn convert_enumerate(conv: &mut LatexConverter, content: &str) -> String {
    let (start, content) = take_counter_start(content);
    let protected = conv.protect_environments(&content);
    let items = parse_items(&protected, false);

    let mut html = String::from("<ol class=\"enumerate-list\"");
    if let Some(n) = start.filter(|n| *n > 1) {
        let _ = write!(html, " start=\"{}\"", n);
    }
    html.push('>');
    for item in &items {
        let _ = write!(html, "<li class=\"enumerate-item\">{}</li>", conv.render_inline(&item.body));
    }
    html.push_str("</ol>");
    html
}

pub fn convert_itemize(conv: &mut LatexConverter, content: &str) -> String {
    let protected = conv.protect_environments(content);
    let items = parse_items(&protected, false);

    let mut html = String::from("<ul class=\"itemize-list\">");
    for item in &items {
        let _ = write!(html, "<li class=\"itemize-item\">{}</li>", conv.render_inline(&item.body));
    }
    html.push_str("</ul>");
    html
}

pub fn convert_description(conv: &mut LatexConverter, content: &str) -> String {
    let protected = conv.protect_environments(content);
    let items = parse_items(&protected, true);

    let mut html = String::from("<dl class=\"description-list\">");
    for item in &items {
        if let Some(term) = &item.term {
            let _ = write!(html, "<dt class=\"description-term\">{}</dt>", conv.render_inline(term));
        }
        let _ = write!(html, "<dd class=\"description-item\">{}</dd>", conv.render_inline(&item.body));
    }
    html.push_str("</dl>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_items_in_order() {
        let items = parse_items(r"\item one \item two\item three", false);
        let bodies: Vec<&str> = items.iter().map(|i| i.body.as_str()).collect();
        assert_eq!(bodies, vec!["one", "two", "three"]);
        assert!(items.iter().all(|i| i.term.is_none()));
    }

    #[test]
    fn test_parse_items_skips_similar_commands() {
        let items = parse_items(r"\itemsep 2pt \item only", false);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].body, "only");
    }

    #[test]
    fn test_parse_items_without_item_is_empty() {
        assert!(parse_items("no markers here", false).is_empty());
    }

    #[test]
    fn test_description_terms() {
        let items = parse_items(r"\item[Apple] a fruit \item no term", true);
        assert_eq!(items[0].term.as_deref(), Some("Apple"));
        assert_eq!(items[0].body, "a fruit");
        assert_eq!(items[1].term, None);
        assert_eq!(items[1].body, "no term");
    }

    #[test]
    fn test_brackets_kept_without_terms() {
        let items = parse_items(r"\item [0,1] is closed", false);
        assert_eq!(items[0].body, "[0,1] is closed");
    }

    #[test]
    fn test_take_counter_start() {
        let (start, rest) = take_counter_start(r"\setcounter{enumi}{5} \item a");
        assert_eq!(start, Some(5));
        assert!(!rest.contains("setcounter"));

        let (start, rest) = take_counter_start(r"\item a");
        assert_eq!(start, None);
        assert_eq!(rest, r"\item a");
    }
}
