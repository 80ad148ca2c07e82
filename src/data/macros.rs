//! Macro table handed to the rendering collaborator
//!
//! Relation shorthands, plain arrows in place of the double ones, and the
//! number sets. Identity entries are left out, the renderer already knows
//! those commands.

use indexmap::IndexMap;
use phf::phf_map;

pub static RENDERER_MACROS: phf::Map<&'static str, &'static str> = phf_map! {
    // Relations
    "\\eqcirc" => "\\stackrel{\\circ}{=}",
    "\\triangleq" => "\\triangle=",
    "\\corresponds" => "\\leftrightarrow",
    "\\approxeq" => "\\approx",
    // Arrows
    "\\Rightarrow" => "\\rightarrow",
    "\\Leftarrow" => "\\leftarrow",
    "\\Leftrightarrow" => "\\leftrightarrow",
    "\\iff" => "\\leftrightarrow",
    "\\implies" => "\\rightarrow",
    // Number sets
    "\\N" => "\\mathbb{N}",
    "\\Z" => "\\mathbb{Z}",
    "\\Q" => "\\mathbb{Q}",
    "\\R" => "\\mathbb{R}",
    "\\C" => "\\mathbb{C}",
    // Stray list markers inside formulas
    "\\item" => "\u{2022}",
};

/// The macro table as an ordered map, sorted by command name.
pub fn macro_table() -> IndexMap<String, String> {
    let mut entries: Vec<(&str, &str)> = RENDERER_MACROS.entries().map(|(k, v)| (*k, *v)).collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
