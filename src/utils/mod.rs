//! Utility modules
//!
//! Error types and CLI diagnostics.

pub mod error;

pub use error::{CliDiagnostic, ConversionError, DiagnosticSeverity, Result};
