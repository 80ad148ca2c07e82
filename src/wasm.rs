//! WASM bindings for texmark
//!
//! JavaScript-accessible conversion entry points. Options are passed as JSON
//! strings; missing fields keep their defaults.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::core::latex2html::{HtmlOptions, LatexConverter};
use crate::render::{render_html_with, DelimiterRenderer, MathRenderOptions};

/// Conversion result handed back to JavaScript
#[derive(Serialize)]
pub struct ConvertResult {
    /// The converted output
    pub output: String,
    /// Whether the conversion was successful
    pub success: bool,
    /// Error message if conversion failed
    pub error: Option<String>,
    /// Warnings during conversion
    pub warnings: Vec<String>,
}

impl ConvertResult {
    fn failed(message: String) -> Self {
        Self {
            output: String::new(),
            success: false,
            error: Some(message),
            warnings: vec![],
        }
    }
}

/// Serialize a value to JsValue, returning an error object on failure.
fn to_js_value<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or_else(|e| {
        let error_obj = ConvertResult::failed(format!("Serialization error: {}", e));
        serde_wasm_bindgen::to_value(&error_obj).unwrap_or(JsValue::NULL)
    })
}

fn parse_options(options: Option<String>) -> Result<HtmlOptions, String> {
    match options {
        Some(json) if !json.trim().is_empty() => HtmlOptions::from_json(&json).map_err(|e| e.to_string()),
        _ => Ok(HtmlOptions::default()),
    }
}

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Convert LaTeX to HTML with math delimiters left for a client-side
/// typesetter.
///
/// Returns `{ output, success, error, warnings }`.
#[wasm_bindgen(js_name = "latexToHtml")]
pub fn latex_to_html_wasm(input: &str, options: Option<String>) -> JsValue {
    let options = match parse_options(options) {
        Ok(options) => options,
        Err(message) => return to_js_value(&ConvertResult::failed(message)),
    };

    let mut converter = LatexConverter::with_options(options.clone());
    let result = converter.convert(input);
    let rendered = render_html_with(&result.document, &DelimiterRenderer::new(options.math_delimiters));

    let warnings = result
        .warnings
        .iter()
        .chain(rendered.warnings.iter())
        .map(|w| w.to_string())
        .collect();

    to_js_value(&ConvertResult {
        output: rendered.html,
        success: true,
        error: None,
        warnings,
    })
}

/// Convert LaTeX to a segment document, serialized as JSON.
#[wasm_bindgen(js_name = "latexToSegmentsJson")]
pub fn latex_to_segments_json(input: &str, options: Option<String>) -> Result<String, JsValue> {
    let options = parse_options(options).map_err(|e| JsValue::from_str(&e))?;
    let mut converter = LatexConverter::with_options(options);
    let result = converter.convert(input);
    serde_json::to_string(&result).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Renderer settings (display mode flag, macro table) as JSON, for
/// configuring a JavaScript typesetter.
#[wasm_bindgen(js_name = "renderOptionsJson")]
pub fn render_options_json(display_mode: bool) -> String {
    let options = if display_mode {
        MathRenderOptions::display()
    } else {
        MathRenderOptions::inline()
    };
    serde_json::to_string(&options).unwrap_or_default()
}

/// Get the crate version
#[wasm_bindgen(js_name = "getVersion")]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
