//! LaTeX to HTML converter
//!
//! Converts a constrained LaTeX dialect into lines of segments: escaped text,
//! structural HTML and raw formulas. Formulas are never typeset here; they
//! are handed to a rendering collaborator (see [`crate::render`]).
//!
//! A pass runs in four steps: environments are swapped for placeholder
//! tokens and transformed, the remaining text is split into lines and run
//! through the inline processor, tokens are substituted back, and each line
//! is cut into segments.

pub mod context;
mod environment;
pub mod extract;
pub mod lists;
mod markup;
pub mod placeholder;
pub mod segment;
pub mod table;
mod utils;

pub use context::{ConversionState, HtmlOptions, LatexConverter, MathDelimiters};
pub use environment::{dispatch, Dispatch};
pub use extract::{extract_environments, EnvironmentRecord, Extraction};
pub use lists::ListItem;
pub use markup::{process_inline, render_plain};
pub use placeholder::{PlaceholderStore, PlaceholderToken};
pub use segment::{find_math_spans, split_lines, split_segments, Document, Line, MathSpan, Segment};

use crate::render::{render_html_with, DelimiterRenderer};
use crate::utils::error::ConversionError;

// =============================================================================
// Warning System
// =============================================================================

/// Kind of warning generated during conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// `\begin{name}` without `\end{name}`; left as text
    UnterminatedEnvironment,
    /// Span directive without the `{n}{format}{content}` form
    MalformedSpanDirective,
    /// Cells beyond the declared column count were dropped
    ExcessCells,
    /// Environment fell back to the generic wrapper (strict mode only)
    UnknownEnvironment,
    /// A placeholder token could not be resolved
    UnresolvedPlaceholder,
    /// The rendering collaborator rejected a formula
    RenderFailure,
    /// Structural nesting exceeded the configured depth
    NestingLimit,
    /// A column spec declared more columns than are supported
    ColumnLimit,
    /// Private-use marker characters were removed from the input
    ReservedCharacter,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningKind::UnterminatedEnvironment => write!(f, "unterminated environment"),
            WarningKind::MalformedSpanDirective => write!(f, "malformed span directive"),
            WarningKind::ExcessCells => write!(f, "excess cells"),
            WarningKind::UnknownEnvironment => write!(f, "unknown environment"),
            WarningKind::UnresolvedPlaceholder => write!(f, "unresolved placeholder"),
            WarningKind::RenderFailure => write!(f, "render failure"),
            WarningKind::NestingLimit => write!(f, "nesting limit"),
            WarningKind::ColumnLimit => write!(f, "column limit"),
            WarningKind::ReservedCharacter => write!(f, "reserved character"),
        }
    }
}

/// A warning generated during conversion
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ConversionWarning {
    /// The kind of warning
    pub kind: WarningKind,
    /// Human-readable message
    pub message: String,
    /// Location context (environment name, snippet, byte offset)
    pub location: Option<String>,
}

impl ConversionWarning {
    /// Create a new warning
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        ConversionWarning {
            kind,
            message: message.into(),
            location: None,
        }
    }

    /// Add location context to the warning
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Create a render failure warning
    pub fn render_failure(formula: &str, message: impl Into<String>) -> Self {
        ConversionWarning::new(WarningKind::RenderFailure, message).with_location(formula.to_string())
    }
}

impl std::fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref loc) = self.location {
            write!(f, "[{}] {}: {}", self.kind, loc, self.message)
        } else {
            write!(f, "[{}] {}", self.kind, self.message)
        }
    }
}

impl From<ConversionWarning> for crate::utils::error::CliDiagnostic {
    fn from(warning: ConversionWarning) -> Self {
        use crate::utils::error::{CliDiagnostic, DiagnosticSeverity};

        let severity = match warning.kind {
            WarningKind::UnresolvedPlaceholder => DiagnosticSeverity::Error,
            WarningKind::UnterminatedEnvironment
            | WarningKind::MalformedSpanDirective
            | WarningKind::ExcessCells
            | WarningKind::RenderFailure
            | WarningKind::NestingLimit
            | WarningKind::ColumnLimit => DiagnosticSeverity::Warning,
            WarningKind::UnknownEnvironment | WarningKind::ReservedCharacter => DiagnosticSeverity::Info,
        };

        let mut diag = CliDiagnostic::new(severity, warning.kind.to_string(), warning.message);
        if let Some(loc) = warning.location {
            diag = diag.with_location(loc);
        }
        diag
    }
}

/// Result of conversion with diagnostics
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ConversionResult {
    /// The converted document
    pub document: Document,
    /// Warnings generated during conversion
    pub warnings: Vec<ConversionWarning>,
}

impl ConversionResult {
    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Get warnings as formatted strings
    pub fn format_warnings(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.to_string()).collect()
    }
}

/// Convert LaTeX source into a segment document
pub fn latex_to_segments(input: &str) -> ConversionResult {
    let mut converter = LatexConverter::new();
    converter.convert(input)
}

/// Convert LaTeX source into a segment document with custom options
///
/// A placeholder that cannot be resolved aborts the pass with
/// [`ConversionError::InternalError`] instead of degrading to text.
pub fn try_latex_to_segments(input: &str, options: &HtmlOptions) -> Result<ConversionResult, ConversionError> {
    let mut converter = LatexConverter::with_options(options.clone());
    converter.try_convert(input)
}

/// Convert LaTeX source into HTML with math delimiters left for a client-side
/// typesetter.
///
/// # Example
///
/// ```
/// use texmark::latex_to_html;
///
/// let html = latex_to_html(r"The value is $x^2$ today.");
/// assert!(html.contains(r"\(x^2\)"));
/// ```
pub fn latex_to_html(input: &str) -> String {
    latex_to_html_with_options(input, &HtmlOptions::default())
}

/// Convert LaTeX source into HTML with custom options
pub fn latex_to_html_with_options(input: &str, options: &HtmlOptions) -> String {
    let mut converter = LatexConverter::with_options(options.clone());
    let result = converter.convert(input);
    let renderer = DelimiterRenderer::new(options.math_delimiters);
    render_html_with(&result.document, &renderer).html
}
