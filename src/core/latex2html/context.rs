//! Core state and options for LaTeX to HTML conversion
//!
//! This module contains the converter struct and the per-pass state.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::environment;
use super::extract::extract_environments;
use super::markup::process_inline;
use super::placeholder::{strip_reserved, PlaceholderStore};
use super::segment::{split_lines, split_resolved, Document, Line, Segment};
use super::{ConversionResult, ConversionWarning, WarningKind};
use crate::html::{escape_html, SafeHtml};
use crate::utils::error::ConversionError;

// =============================================================================
// LaTeX → HTML Conversion Options
// =============================================================================

/// Delimiters written around formulas in HTML output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathDelimiters {
    /// `\(..\)` and `\[..\]`
    #[default]
    Latex,
    /// `$..$` and `$$..$$`
    Dollar,
}

/// Options for LaTeX to HTML conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlOptions {
    /// Split top-level text into lines on `\\` and blank lines
    /// Default: true
    pub split_lines: bool,

    /// Delimiters used when formulas are written back into HTML
    /// Default: Latex
    pub math_delimiters: MathDelimiters,

    /// Maximum nesting of structural environments
    /// Default: 16
    pub max_depth: usize,

    /// Warn about environments that fall back to the generic wrapper
    /// Default: false
    pub strict: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            split_lines: true,
            math_delimiters: MathDelimiters::Latex,
            max_depth: 16,
            strict: false,
        }
    }
}

impl HtmlOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict mode options (warns on unknown environments)
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Keep the whole input on one line; `\\` becomes `<br>`
    pub fn compact() -> Self {
        Self {
            split_lines: false,
            ..Self::default()
        }
    }

    /// Parse options from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConversionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read options from a JSON file. A malformed file is reported as a
    /// parse error naming the path.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConversionError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json).map_err(|err| ConversionError::parse(format!("{}: {}", path.display(), err)))
    }
}

// =============================================================================
// Per-pass state
// =============================================================================

/// State of one conversion pass
#[derive(Debug, Default)]
pub struct ConversionState {
    /// Token map for extracted environments
    pub store: PlaceholderStore,
    /// Collected warnings
    pub warnings: Vec<ConversionWarning>,
    /// Current structural nesting depth
    pub depth: usize,
}

impl ConversionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and mirror it to the log.
    pub fn warn(&mut self, warning: ConversionWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// LaTeX to HTML converter
///
/// Every call to [`convert`](Self::convert) is an independent pass with a
/// fresh placeholder store.
pub struct LatexConverter {
    pub(crate) options: HtmlOptions,
    pub(crate) state: ConversionState,
}

impl LatexConverter {
    /// Create a new converter with default options
    pub fn new() -> Self {
        Self::with_options(HtmlOptions::default())
    }

    /// Create a new converter with custom options
    pub fn with_options(options: HtmlOptions) -> Self {
        Self {
            options,
            state: ConversionState::new(),
        }
    }

    /// Get a reference to the current options
    pub fn options(&self) -> &HtmlOptions {
        &self.options
    }

    /// Get a mutable reference to the current options
    pub fn options_mut(&mut self) -> &mut HtmlOptions {
        &mut self.options
    }

    /// Convert source text into a segment document.
    ///
    /// Never fails: a placeholder that cannot be resolved is reported as an
    /// error-severity warning and its line is emitted as escaped text.
    pub fn convert(&mut self, input: &str) -> ConversionResult {
        match self.run(input, true) {
            Ok(result) => result,
            // lenient runs report resolution failures as warnings
            Err(err) => ConversionResult {
                document: Document::default(),
                warnings: vec![ConversionWarning::new(WarningKind::UnresolvedPlaceholder, err.to_string())],
            },
        }
    }

    /// Like [`convert`](Self::convert), but a placeholder resolution failure
    /// aborts the pass with [`ConversionError::InternalError`].
    pub fn try_convert(&mut self, input: &str) -> Result<ConversionResult, ConversionError> {
        self.run(input, false)
    }

    fn run(&mut self, input: &str, lenient: bool) -> Result<ConversionResult, ConversionError> {
        self.state = ConversionState::new();

        let (source, removed) = strip_reserved(input);
        if removed {
            self.state.warn(ConversionWarning::new(
                WarningKind::ReservedCharacter,
                "private-use characters U+E000..U+E005 were removed from the input",
            ));
        }

        let protected = self.protect_environments(&source);
        let lines: Vec<&str> = if self.options.split_lines {
            split_lines(&protected)
        } else if protected.trim().is_empty() {
            Vec::new()
        } else {
            vec![protected.as_str()]
        };
        log::debug!("{} line(s), {} placeholder(s)", lines.len(), self.state.store.len());

        let mut document = Document::default();
        for line in lines {
            let html = process_inline(line.trim());
            let segments = match self.state.store.substitute_all(&html) {
                Ok(resolved) => split_resolved(&resolved),
                Err(err) if lenient => {
                    self.state.warn(ConversionWarning::new(WarningKind::UnresolvedPlaceholder, err.to_string()));
                    let (text, _) = strip_reserved(line.trim());
                    vec![Segment::PlainText(SafeHtml::literal(&text))]
                }
                Err(err) => return Err(err),
            };
            if !segments.is_empty() {
                document.lines.push(Line { segments });
            }
        }

        Ok(ConversionResult {
            document,
            warnings: std::mem::take(&mut self.state.warnings),
        })
    }

    /// Extract the environments of `content`, transform each one and bind
    /// the result to its token. Returns `content` with tokens in place.
    pub(crate) fn protect_environments(&mut self, content: &str) -> String {
        let extraction = extract_environments(content, &mut self.state.store);

        for open in &extraction.unterminated {
            self.state.warn(
                ConversionWarning::new(
                    WarningKind::UnterminatedEnvironment,
                    format!("no \\end{{{}}} found, kept as text", open.name),
                )
                .with_location(format!("byte {}", open.offset)),
            );
        }

        for env in &extraction.environments {
            let output = environment::transform(self, &env.record);
            self.state.store.rebind(&env.token, output);
        }

        // Text from the first unterminated `\begin` on stays literal
        let mut text = extraction.text;
        if let Some(open) = extraction.unterminated.first() {
            let tail = text.split_off(open.text_offset);
            let token = self.state.store.reserve_labeled(escape_html(&tail), open.name.as_str());
            text.push_str(token.as_str());
        }
        text
    }

    /// Convert the content of a structural environment: nested environments,
    /// then inline markup.
    pub(crate) fn convert_fragment(&mut self, content: &str) -> String {
        let protected = self.protect_environments(content);
        self.render_inline(&protected)
    }

    /// Inline markup for text whose environments are already protected.
    pub(crate) fn render_inline(&self, text: &str) -> String {
        process_inline(text)
    }
}

impl Default for LatexConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults_and_presets() {
        let opts = HtmlOptions::default();
        assert!(opts.split_lines);
        assert_eq!(opts.max_depth, 16);
        assert!(HtmlOptions::strict().strict);
        assert!(!HtmlOptions::compact().split_lines);
    }

    #[test]
    fn test_options_partial_json() {
        let opts = HtmlOptions::from_json(r#"{"strict": true, "math_delimiters": "dollar"}"#).unwrap();
        assert!(opts.strict);
        assert_eq!(opts.math_delimiters, MathDelimiters::Dollar);
        assert_eq!(opts.max_depth, 16);
        assert!(HtmlOptions::from_json("{not json").is_err());
    }

    #[test]
    fn test_options_file_errors_name_the_path() {
        let path = std::env::temp_dir().join(format!("texmark-options-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"max_depth": "deep"}"#).unwrap();
        let err = HtmlOptions::from_json_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(err, ConversionError::ParseError { line: None, .. }));
        assert!(err.to_string().contains(&path.display().to_string()));

        let missing = HtmlOptions::from_json_file(path.with_extension("missing")).unwrap_err();
        assert!(matches!(missing, ConversionError::IoError { .. }));
    }

    #[test]
    fn test_each_pass_starts_fresh() {
        let mut conv = LatexConverter::new();
        let first = conv.convert(r"\begin{center}a\end{center}");
        let second = conv.convert(r"\begin{center}a\end{center}");
        assert_eq!(first.document, second.document);
        assert!(second.warnings.is_empty());
    }

    #[test]
    fn test_reserved_characters_stripped() {
        let mut conv = LatexConverter::new();
        let result = conv.convert("a\u{E000}b");
        assert_eq!(result.warnings[0].kind, WarningKind::ReservedCharacter);
        assert_eq!(result.document.lines.len(), 1);
    }
}
