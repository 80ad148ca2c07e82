//! Conversion core
//!
//! - `latex2html`: LaTeX dialect to HTML segments

pub mod latex2html;
