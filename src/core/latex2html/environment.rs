//! Environment transformer registry
//!
//! Dispatch order for an extracted block:
//! 1. a structural handler from the environment table,
//! 2. pass-through for environments the math renderer understands,
//! 3. a generic `<div class="latex-{name}">` wrapper.

use std::fmt::Write;

use super::context::LatexConverter;
use super::extract::EnvironmentRecord;
use super::lists::{convert_description, convert_enumerate, convert_itemize};
use super::placeholder::{BLOCK_CLOSE, BLOCK_OPEN};
use super::table::{parse_table, ColumnSpec, TableIssue, MAX_COLUMNS};
use super::utils::sanitize_class_name;
use super::{ConversionWarning, WarningKind};
use crate::data::constants::{is_math_environment, structural_kind, EnvironmentKind};
use crate::html::escape_literal;

/// How an environment name is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Structural(EnvironmentKind),
    PassThrough,
    Generic,
}

/// Pick the handler tier for `name`.
pub fn dispatch(name: &str) -> Dispatch {
    if let Some(kind) = structural_kind(name) {
        Dispatch::Structural(kind)
    } else if is_math_environment(name) {
        Dispatch::PassThrough
    } else {
        Dispatch::Generic
    }
}

/// Transform one extracted environment into its output fragment.
///
/// Structural output is bracketed by the block sentinels; pass-through output
/// is the source block, unchanged.
pub fn transform(conv: &mut LatexConverter, record: &EnvironmentRecord) -> String {
    let tier = dispatch(&record.name);
    log::debug!("environment '{}' -> {:?}", record.name, tier);

    match tier {
        Dispatch::PassThrough => record.source(),
        Dispatch::Structural(kind) => {
            with_depth(conv, record, |conv| convert_structural(conv, record, kind))
        }
        Dispatch::Generic => {
            if conv.options().strict {
                conv.state.warn(
                    ConversionWarning::new(
                        WarningKind::UnknownEnvironment,
                        format!("no handler for environment '{}', wrapped generically", record.name),
                    )
                    .with_location(record.name.clone()),
                );
            }
            with_depth(conv, record, |conv| {
                let body = conv.convert_fragment(&record.raw_content);
                format!("<div class=\"latex-{}\">{}</div>", sanitize_class_name(&record.name), body)
            })
        }
    }
}

/// Run a structural handler one level deeper, or emit the source as literal
/// text once the nesting limit is reached.
fn with_depth(
    conv: &mut LatexConverter,
    record: &EnvironmentRecord,
    handler: impl FnOnce(&mut LatexConverter) -> String,
) -> String {
    let limit = conv.options().max_depth;
    if conv.state.depth >= limit {
        conv.state.warn(
            ConversionWarning::new(
                WarningKind::NestingLimit,
                format!("nesting deeper than {} levels, emitted as text", limit),
            )
            .with_location(record.name.clone()),
        );
        return wrap_block(&escape_literal(&record.source()));
    }

    conv.state.depth += 1;
    let html = handler(conv);
    conv.state.depth -= 1;
    wrap_block(&html)
}

fn wrap_block(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + 6);
    out.push(BLOCK_OPEN);
    out.push_str(html);
    out.push(BLOCK_CLOSE);
    out
}

fn convert_structural(conv: &mut LatexConverter, record: &EnvironmentRecord, kind: EnvironmentKind) -> String {
    let content = record.raw_content.as_str();
    match kind {
        EnvironmentKind::Enumerate => convert_enumerate(conv, content),
        EnvironmentKind::Itemize => convert_itemize(conv, content),
        EnvironmentKind::Description => convert_description(conv, content),
        EnvironmentKind::Block(class) => {
            format!("<div class=\"{}\">{}</div>", class, conv.convert_fragment(content.trim()))
        }
        EnvironmentKind::Quote(class) => {
            format!("<blockquote class=\"{}\">{}</blockquote>", class, conv.convert_fragment(content.trim()))
        }
        EnvironmentKind::Theorem(caption) => convert_theorem(conv, record, caption),
        EnvironmentKind::Verbatim => {
            let body = content.strip_prefix('\n').unwrap_or(content);
            format!("<pre class=\"latex-verbatim\">{}</pre>", escape_literal(body))
        }
        EnvironmentKind::Tabular => convert_tabular(conv, record),
    }
}

/// Theorem-like block: bold caption, optional `[Name]`, converted body.
fn convert_theorem(conv: &mut LatexConverter, record: &EnvironmentRecord, caption: &str) -> String {
    let class = sanitize_class_name(record.name.trim_end_matches('*'));
    let mut html = String::new();
    let _ = write!(html, "<div class=\"latex-{}\"><strong>{}", class, caption);
    if let Some(name) = record.optional_argument().filter(|n| !n.is_empty()) {
        let _ = write!(html, " ({})", conv.render_inline(name));
    }
    html.push_str(".</strong> ");
    html.push_str(&conv.convert_fragment(record.raw_content.trim()));
    html.push_str("</div>");
    html
}

fn convert_tabular(conv: &mut LatexConverter, record: &EnvironmentRecord) -> String {
    let columns = ColumnSpec::parse(record.last_braced_argument().unwrap_or(""));
    if columns.is_empty() {
        log::debug!("tabular without column spec, columns inferred from rows");
    }
    if columns.truncated {
        conv.state.warn(
            ConversionWarning::new(
                WarningKind::ColumnLimit,
                format!("column spec declares more than {} columns, the rest were dropped", MAX_COLUMNS),
            )
            .with_location(record.name.clone()),
        );
    }

    let content = conv.protect_environments(&record.raw_content);
    let table = parse_table(&content, columns);

    for issue in &table.issues {
        let warning = match issue {
            TableIssue::MalformedSpan { row, raw } => ConversionWarning::new(
                WarningKind::MalformedSpanDirective,
                format!("span directive in row {} is not {{n}}{{format}}{{content}}, kept as text", row + 1),
            )
            .with_location(raw.clone()),
            TableIssue::ExcessCells { row, dropped } => ConversionWarning::new(
                WarningKind::ExcessCells,
                format!(
                    "row {} has {} cell(s) beyond the {} declared column(s), dropped",
                    row + 1,
                    dropped,
                    table.columns.len()
                ),
            )
            .with_location(record.name.clone()),
        };
        conv.state.warn(warning);
    }

    let mut render = |text: &str| conv.render_inline(text);
    table.to_html(&mut render)
}
