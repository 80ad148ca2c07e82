//! Rendering collaborator seam
//!
//! The converter never typesets formulas. A [`MathRenderer`] receives each
//! formula of a [`Document`] and returns HTML for it; [`render_html_with`]
//! stitches the result together. A formula the renderer rejects is replaced
//! by an inline error marker and the rest of the document still renders.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::Write;

use crate::core::latex2html::{ConversionWarning, Document, MathDelimiters, Segment};
use crate::data::macros::macro_table;
use crate::html::{escape_html, escape_literal};
use crate::utils::error::Result;

/// Settings passed to the renderer with every formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MathRenderOptions {
    /// Display (block) rather than inline typesetting
    pub display_mode: bool,
    /// Malformed formulas must not raise; the renderer shows them instead
    pub throw_on_error: bool,
    /// Command name -> expansion
    pub macros: IndexMap<String, String>,
}

impl Default for MathRenderOptions {
    fn default() -> Self {
        Self {
            display_mode: false,
            throw_on_error: false,
            macros: macro_table(),
        }
    }
}

impl MathRenderOptions {
    /// Options for inline formulas
    pub fn inline() -> Self {
        Self::default()
    }

    /// Options for display formulas
    pub fn display() -> Self {
        Self {
            display_mode: true,
            ..Self::default()
        }
    }
}

/// Turns one formula into HTML.
pub trait MathRenderer {
    fn render(&self, formula: &str, options: &MathRenderOptions) -> Result<String>;
}

/// Renderer that writes formulas back with delimiters for client-side
/// typesetting (KaTeX auto-render, MathJax).
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimiterRenderer {
    delimiters: MathDelimiters,
}

impl DelimiterRenderer {
    pub fn new(delimiters: MathDelimiters) -> Self {
        Self { delimiters }
    }
}

impl MathRenderer for DelimiterRenderer {
    fn render(&self, formula: &str, options: &MathRenderOptions) -> Result<String> {
        let escaped = escape_html(formula);
        let (open, close) = match (self.delimiters, options.display_mode) {
            (MathDelimiters::Latex, false) => ("\\(", "\\)"),
            (MathDelimiters::Latex, true) => ("\\[", "\\]"),
            (MathDelimiters::Dollar, false) => ("$", "$"),
            (MathDelimiters::Dollar, true) => ("$$", "$$"),
        };

        // A bare environment carries its own delimiters
        if escaped.starts_with("\\begin{") {
            return Ok(format!(r#"<div class="math-display">{}</div>"#, escaped));
        }
        if options.display_mode {
            Ok(format!(r#"<div class="math-display">{}{}{}</div>"#, open, escaped, close))
        } else {
            Ok(format!(r#"<span class="math-inline">{}{}{}</span>"#, open, escaped, close))
        }
    }
}

/// HTML for a whole document plus the per-formula failures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderedHtml {
    pub html: String,
    pub warnings: Vec<ConversionWarning>,
}

/// Render a document, delegating every formula to `renderer`.
pub fn render_html_with(document: &Document, renderer: &dyn MathRenderer) -> RenderedHtml {
    let inline = MathRenderOptions::inline();
    let display = MathRenderOptions::display();
    let mut rendered = RenderedHtml::default();

    rendered.html.push_str(r#"<div class="math-renderer">"#);
    for line in &document.lines {
        rendered.html.push_str(r#"<div class="math-line">"#);
        for segment in &line.segments {
            match segment {
                Segment::PlainText(html) | Segment::StructuralBlock(html) => {
                    rendered.html.push_str(html.as_str());
                }
                Segment::InlineMath(formula) => render_formula(&mut rendered, renderer, formula, &inline),
                Segment::DisplayMath(formula) => render_formula(&mut rendered, renderer, formula, &display),
            }
        }
        rendered.html.push_str("</div>");
    }
    rendered.html.push_str("</div>");
    rendered
}

fn render_formula(
    rendered: &mut RenderedHtml,
    renderer: &dyn MathRenderer,
    formula: &str,
    options: &MathRenderOptions,
) {
    match renderer.render(formula, options) {
        Ok(html) => rendered.html.push_str(&html),
        Err(err) => {
            log::warn!("formula failed to render: {}", err);
            let _ = write!(
                rendered.html,
                r#"<span class="math-error" title="{}">{}</span>"#,
                escape_html(&err.to_string()),
                escape_literal(formula)
            );
            rendered
                .warnings
                .push(ConversionWarning::render_failure(formula, err.to_string()));
        }
    }
}
