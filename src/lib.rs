//! # texmark
//!
//! Environment-aware transformer from a constrained LaTeX dialect to HTML
//! interleaved with math segments.
//!
//! Text mode constructs (lists, tables, theorem blocks, inline formatting)
//! become HTML; math is left untouched for a rendering collaborator such as
//! KaTeX or MathJax.
//!
//! ## Quick start
//!
//! ```
//! use texmark::{latex_to_segments, Segment};
//!
//! let result = latex_to_segments(r"The value is $x^2$ today.");
//! let segments = &result.document.lines[0].segments;
//! assert_eq!(segments.len(), 3);
//! assert_eq!(segments[1], Segment::InlineMath("x^2".to_string()));
//! ```
//!
//! Rendering formulas through your own typesetter:
//!
//! ```
//! use texmark::{latex_to_segments, render_html_with, DelimiterRenderer};
//!
//! let result = latex_to_segments(r"\begin{itemize}\item $a$\end{itemize}");
//! let rendered = render_html_with(&result.document, &DelimiterRenderer::default());
//! assert!(rendered.html.contains(r#"<li class="itemize-item">"#));
//! ```

pub mod core;
pub mod data;
pub mod html;
pub mod render;
pub mod utils;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use crate::core::latex2html::{
    latex_to_html, latex_to_html_with_options, latex_to_segments, split_segments, try_latex_to_segments,
    ConversionResult, ConversionWarning, Document, HtmlOptions, LatexConverter, Line, MathDelimiters, Segment,
    WarningKind,
};
pub use html::SafeHtml;
pub use render::{render_html_with, DelimiterRenderer, MathRenderOptions, MathRenderer, RenderedHtml};
pub use utils::error::ConversionError;
