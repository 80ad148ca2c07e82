//! Environment extraction
//!
//! Finds `\begin{name}[options]content\end{name}` blocks in document order and
//! swaps each one for a placeholder token. The end marker search matches the
//! *same* name only and takes its first occurrence, so an environment nested
//! inside one of the identical name closes at the inner `\end`. Blocks of a
//! different name nested inside stay in the outer record's content and are
//! extracted when that content is transformed.

use std::ops::Range;

use super::placeholder::{PlaceholderStore, PlaceholderToken};
use super::utils::{is_escaped, parse_braced, parse_bracketed, skip_ws};
use crate::data::constants::{is_math_environment, takes_arguments};

const BEGIN_MARKER: &str = "\\begin";

/// One extracted `\begin{..}..\end{..}` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentRecord {
    /// Environment name as written (`align*` keeps its star)
    pub name: String,
    /// Everything between `\begin{name}` and the content, verbatim
    /// (e.g. `{l|c|r}` or `[Pythagoras]`); empty when absent
    pub raw_options: String,
    /// Content between the options and `\end{name}`
    pub raw_content: String,
    /// Byte span of the whole block in the scanned text
    pub span: Range<usize>,
}

impl EnvironmentRecord {
    /// The block exactly as it appeared in the source.
    pub fn source(&self) -> String {
        format!(
            "\\begin{{{}}}{}{}\\end{{{}}}",
            self.name, self.raw_options, self.raw_content, self.name
        )
    }

    /// The `[...]` optional argument, if one was given.
    pub fn optional_argument(&self) -> Option<&str> {
        let start = skip_ws(&self.raw_options, 0);
        parse_bracketed(&self.raw_options, start).map(|(inner, _)| inner.trim())
    }

    /// The last `{...}` argument, which carries the column spec of a tabular.
    pub fn last_braced_argument(&self) -> Option<&str> {
        let opts = &self.raw_options;
        let mut i = skip_ws(opts, 0);
        let mut last = None;
        while i < opts.len() {
            match opts.as_bytes()[i] {
                b'[' => match parse_bracketed(opts, i) {
                    Some((_, next)) => i = next,
                    None => break,
                },
                b'{' => match parse_braced(opts, i) {
                    Some((inner, next)) => {
                        last = Some(inner);
                        i = next;
                    }
                    None => break,
                },
                _ => i += 1,
            }
            i = skip_ws(opts, i);
        }
        last
    }
}

/// An extracted block together with the token that replaced it.
#[derive(Debug, Clone)]
pub struct ExtractedEnvironment {
    pub token: PlaceholderToken,
    pub record: EnvironmentRecord,
}

/// A `\begin{name}` without a matching `\end{name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnterminatedEnvironment {
    pub name: String,
    /// Byte offset of `\begin` in the source
    pub offset: usize,
    /// Byte offset of `\begin` in [`Extraction::text`]
    pub text_offset: usize,
}

/// Result of one extraction pass.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Input with every extracted block replaced by its token
    pub text: String,
    /// Extracted blocks in document order
    pub environments: Vec<ExtractedEnvironment>,
    /// Blocks left in place because they never close
    pub unterminated: Vec<UnterminatedEnvironment>,
}

/// Extract all top-level environments from `source`.
pub fn extract_environments(source: &str, store: &mut PlaceholderStore) -> Extraction {
    let mut extraction = Extraction {
        text: String::with_capacity(source.len()),
        ..Default::default()
    };
    let mut copied_to = 0usize;
    let mut search_from = 0usize;

    while let Some(rel) = source[search_from..].find(BEGIN_MARKER) {
        let begin = search_from + rel;
        let name_start = begin + BEGIN_MARKER.len();
        search_from = name_start;

        if is_escaped(source, begin) {
            continue;
        }
        let (name, after_name) = match parse_braced(source, name_start) {
            Some((name, next)) if is_valid_name(name) => (name, next),
            _ => continue,
        };

        let content_start = scan_options(source, after_name, name);
        let end_marker = format!("\\end{{{}}}", name);
        let end = match find_end_marker(source, content_start, &end_marker) {
            Some(end) => end,
            None => {
                log::debug!("unterminated environment '{}' at byte {}", name, begin);
                extraction.unterminated.push(UnterminatedEnvironment {
                    name: name.to_string(),
                    offset: begin,
                    text_offset: extraction.text.len() + (begin - copied_to),
                });
                search_from = after_name;
                continue;
            }
        };
        let block_end = end + end_marker.len();

        let record = EnvironmentRecord {
            name: name.to_string(),
            raw_options: source[after_name..content_start].to_string(),
            raw_content: source[content_start..end].to_string(),
            span: begin..block_end,
        };
        let token = store.reserve_labeled(&source[begin..block_end], name);

        extraction.text.push_str(&source[copied_to..begin]);
        extraction.text.push_str(token.as_str());
        extraction.environments.push(ExtractedEnvironment { token, record });

        copied_to = block_end;
        search_from = block_end;
    }

    extraction.text.push_str(&source[copied_to..]);
    log::debug!(
        "extracted {} environment(s), {} unterminated",
        extraction.environments.len(),
        extraction.unterminated.len()
    );
    extraction
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '*' || c == '-' || c == '_')
}

/// Consume the options that follow `\begin{name}` and return where content starts.
///
/// A `[...]` group is an option for every non-math environment (math content
/// may legitimately start with a bracket). Braced groups are options only for
/// environments that take arguments, such as `tabular`.
fn scan_options(source: &str, after_name: usize, name: &str) -> usize {
    let mut pos = after_name;

    if !is_math_environment(name) {
        let i = skip_ws(source, pos);
        if let Some((_, next)) = parse_bracketed(source, i) {
            pos = next;
        }
    }

    if takes_arguments(name) {
        loop {
            let i = skip_ws(source, pos);
            match parse_braced(source, i) {
                Some((_, next)) => pos = next,
                None => break,
            }
        }
    }

    pos
}

fn find_end_marker(source: &str, from: usize, marker: &str) -> Option<usize> {
    let mut search = from;
    while let Some(rel) = source[search..].find(marker) {
        let at = search + rel;
        if !is_escaped(source, at) {
            return Some(at);
        }
        search = at + marker.len();
    }
    None
}
