//! Environment lookup tables
//!
//! Dispatch of `\begin{name}` blocks is table driven: structural environments
//! map to an [`EnvironmentKind`], math environments are passed through to the
//! rendering collaborator untouched.

use phf::{phf_map, phf_set};

/// Structural handler selected for an environment name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentKind {
    /// Ordered list with optional `\setcounter{enumi}{N}`
    Enumerate,
    /// Unordered list
    Itemize,
    /// Term/definition list
    Description,
    /// `<div>` with the given class
    Block(&'static str),
    /// `<blockquote>` with the given class
    Quote(&'static str),
    /// Theorem-like block with a bold caption
    Theorem(&'static str),
    /// Preformatted, unprocessed text
    Verbatim,
    /// Row/cell table with a column spec
    Tabular,
}

pub static STRUCTURAL_ENVIRONMENTS: phf::Map<&'static str, EnvironmentKind> = phf_map! {
    "enumerate" => EnvironmentKind::Enumerate,
    "itemize" => EnvironmentKind::Itemize,
    "description" => EnvironmentKind::Description,
    "center" => EnvironmentKind::Block("latex-center"),
    "flushleft" => EnvironmentKind::Block("latex-flushleft"),
    "flushright" => EnvironmentKind::Block("latex-flushright"),
    "minipage" => EnvironmentKind::Block("latex-minipage"),
    "table" => EnvironmentKind::Block("latex-table"),
    "quote" => EnvironmentKind::Quote("latex-quote"),
    "quotation" => EnvironmentKind::Quote("latex-quotation"),
    "theorem" => EnvironmentKind::Theorem("Theorem"),
    "lemma" => EnvironmentKind::Theorem("Lemma"),
    "proof" => EnvironmentKind::Theorem("Proof"),
    "definition" => EnvironmentKind::Theorem("Definition"),
    "corollary" => EnvironmentKind::Theorem("Corollary"),
    "proposition" => EnvironmentKind::Theorem("Proposition"),
    "remark" => EnvironmentKind::Theorem("Remark"),
    "example" => EnvironmentKind::Theorem("Example"),
    "verbatim" => EnvironmentKind::Verbatim,
    "tabular" => EnvironmentKind::Tabular,
};

/// Environments the math renderer understands natively.
pub static MATH_ENVIRONMENTS: phf::Set<&'static str> = phf_set! {
    "equation", "equation*",
    "align", "align*",
    "aligned",
    "gather", "gather*",
    "gathered",
    "eqnarray", "eqnarray*",
    "multline", "multline*",
    "split",
    "array",
    "matrix", "pmatrix", "bmatrix", "Bmatrix", "vmatrix", "Vmatrix",
    "cases",
    "subequations",
};

/// Environments whose braced groups after `\begin{name}` are arguments,
/// not content (column specs, widths).
pub static ARGUMENT_ENVIRONMENTS: phf::Set<&'static str> = phf_set! {
    "tabular", "tabular*", "array", "minipage",
};

/// Text-formatting commands that keep a table cell in text mode.
pub static TEXT_COMMANDS: phf::Set<&'static str> = phf_set! {
    "textbf", "textit", "emph", "text", "section", "subsection",
};

/// Look up the structural handler for `name`, ignoring a trailing `*`.
pub fn structural_kind(name: &str) -> Option<EnvironmentKind> {
    STRUCTURAL_ENVIRONMENTS
        .get(name)
        .or_else(|| STRUCTURAL_ENVIRONMENTS.get(name.trim_end_matches('*')))
        .copied()
}

pub fn is_math_environment(name: &str) -> bool {
    MATH_ENVIRONMENTS.contains(name)
}

pub fn takes_arguments(name: &str) -> bool {
    ARGUMENT_ENVIRONMENTS.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starred_structural_names() {
        assert_eq!(structural_kind("theorem*"), Some(EnvironmentKind::Theorem("Theorem")));
        assert_eq!(structural_kind("table*"), Some(EnvironmentKind::Block("latex-table")));
        assert_eq!(structural_kind("equation"), None);
    }

    #[test]
    fn test_math_names_are_exact() {
        assert!(is_math_environment("align*"));
        assert!(is_math_environment("Vmatrix"));
        assert!(!is_math_environment("itemize"));
    }
}
