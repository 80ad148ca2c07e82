//! Error handling for texmark conversions
//!
//! This module provides a unified error type and result type for all
//! conversion operations, plus the diagnostic type used by the CLI.

use std::fmt;

/// Conversion error type
#[derive(Debug, Clone)]
pub enum ConversionError {
    /// Parse error - input or configuration could not be parsed
    ParseError {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },
    /// The rendering collaborator rejected a formula
    RenderError { formula: String, message: String },
    /// IO error (for file operations)
    IoError { message: String },
    /// Internal invariant violation
    InternalError {
        message: String,
        context: Option<String>,
    },
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::ParseError {
                message,
                line,
                column,
            } => {
                if let (Some(l), Some(c)) = (line, column) {
                    write!(f, "Parse error at line {}, column {}: {}", l, c, message)
                } else if let Some(l) = line {
                    write!(f, "Parse error at line {}: {}", l, message)
                } else {
                    write!(f, "Parse error: {}", message)
                }
            }
            ConversionError::RenderError { formula, message } => {
                write!(f, "Render error in '{}': {}", formula, message)
            }
            ConversionError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
            ConversionError::InternalError { message, context } => {
                if let Some(ctx) = context {
                    write!(f, "Internal error: {} (near {})", message, ctx)
                } else {
                    write!(f, "Internal error: {}", message)
                }
            }
        }
    }
}

impl std::error::Error for ConversionError {}

impl From<std::io::Error> for ConversionError {
    fn from(err: std::io::Error) -> Self {
        ConversionError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ConversionError {
    fn from(err: serde_json::Error) -> Self {
        ConversionError::parse_at(err.to_string(), err.line(), err.column())
    }
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConversionError>;

// =============================================================================
// Unified CLI Diagnostic System
// =============================================================================

/// Severity level for CLI diagnostics (determines coloring and behavior).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// Invariant violations, e.g. a placeholder that survived to the output
    Error,
    /// Recovered problems, e.g. an unterminated environment
    Warning,
    /// Informational, e.g. an unknown environment wrapped generically
    Info,
}

/// Unified diagnostic type for CLI output.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CliDiagnostic {
    /// Severity level (for coloring and exit status)
    pub severity: DiagnosticSeverity,
    /// Warning kind as string (e.g., "unterminated environment")
    pub kind: String,
    /// Human-readable message
    pub message: String,
    /// Location context (e.g., "\\begin{itemize}", "12..40")
    pub location: Option<String>,
}

impl CliDiagnostic {
    /// Create a new diagnostic.
    pub fn new(
        severity: DiagnosticSeverity,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind: kind.into(),
            message: message.into(),
            location: None,
        }
    }

    /// Add location context.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Get ANSI color code for this diagnostic's severity.
    pub fn color_code(&self) -> &'static str {
        match self.severity {
            DiagnosticSeverity::Error => "\x1b[31m",   // red
            DiagnosticSeverity::Warning => "\x1b[33m", // yellow
            DiagnosticSeverity::Info => "\x1b[36m",    // cyan
        }
    }
}

impl fmt::Display for CliDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref loc) = self.location {
            write!(f, "[{}] {}: {}", self.kind, loc, self.message)
        } else {
            write!(f, "[{}] {}", self.kind, self.message)
        }
    }
}

// Convenience constructors for errors
impl ConversionError {
    pub fn parse(message: impl Into<String>) -> Self {
        ConversionError::ParseError {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn parse_at(message: impl Into<String>, line: usize, column: usize) -> Self {
        ConversionError::ParseError {
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    pub fn render(formula: impl Into<String>, message: impl Into<String>) -> Self {
        ConversionError::RenderError {
            formula: formula.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ConversionError::InternalError {
            message: message.into(),
            context: None,
        }
    }

    pub fn internal_at(message: impl Into<String>, context: impl Into<String>) -> Self {
        ConversionError::InternalError {
            message: message.into(),
            context: Some(context.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ConversionError::parse("unexpected token");
        assert!(err.to_string().contains("Parse error"));
        assert!(err.to_string().contains("unexpected token"));
    }

    #[test]
    fn test_json_error_keeps_location() {
        let json_err = serde_json::from_str::<serde_json::Value>("{\n  \"strict\": tru\n}").unwrap_err();
        let err = ConversionError::from(json_err);
        assert!(matches!(err, ConversionError::ParseError { line: Some(2), .. }));
        assert!(err.to_string().starts_with("Parse error at line 2, column"));
    }

    #[test]
    fn test_internal_error_context() {
        let err = ConversionError::internal_at("unresolved placeholder", "itemize");
        let msg = err.to_string();
        assert!(msg.contains("unresolved placeholder"));
        assert!(msg.contains("near itemize"));
    }

    #[test]
    fn test_render_error_names_formula() {
        let err = ConversionError::render(r"\frac{1}", "missing argument");
        assert!(err.to_string().contains(r"\frac{1}"));
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = CliDiagnostic::new(DiagnosticSeverity::Warning, "unterminated environment", "left as text")
            .with_location("itemize");
        assert_eq!(
            diag.to_string(),
            "[unterminated environment] itemize: left as text"
        );
        assert_eq!(diag.color_code(), "\x1b[33m");
    }
}
