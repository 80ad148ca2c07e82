//! Integration tests for texmark end-to-end conversion

use pretty_assertions::assert_eq;
use texmark::core::latex2html::placeholder::{TOKEN_CLOSE, TOKEN_OPEN};
use texmark::core::latex2html::table::{parse_table, Alignment, ColumnSpec, MAX_COLUMNS};
use texmark::core::latex2html::{extract_environments, PlaceholderStore};
use texmark::{
    latex_to_html, latex_to_html_with_options, latex_to_segments, render_html_with, split_segments,
    try_latex_to_segments, ConversionError, DelimiterRenderer, HtmlOptions, MathDelimiters, MathRenderOptions,
    MathRenderer, SafeHtml, Segment, WarningKind,
};

fn segments_of(input: &str) -> Vec<Segment> {
    latex_to_segments(input)
        .document
        .lines
        .into_iter()
        .flat_map(|l| l.segments)
        .collect()
}

fn plain(s: &str) -> Segment {
    Segment::PlainText(SafeHtml::escape(s))
}

// ============================================================================
// Environment extraction
// ============================================================================

mod extraction {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_count_matches_begin_markers() {
        let src = r"A \begin{center}x\end{center} B \begin{quote}y\end{quote} C \begin{equation}z\end{equation}";
        let mut store = PlaceholderStore::new();
        let extraction = extract_environments(src, &mut store);

        assert_eq!(extraction.environments.len(), src.matches(r"\begin{").count());
        assert_eq!(store.substitute_all(&extraction.text).unwrap(), src);
    }

    #[test]
    fn test_idempotent_on_converted_output() {
        let html = latex_to_html(r"\begin{center}x\end{center} and \begin{quote}y\end{quote}");
        let mut store = PlaceholderStore::new();
        let extraction = extract_environments(&html, &mut store);

        assert!(extraction.environments.is_empty());
        assert_eq!(extraction.text, html);
    }

    #[test]
    fn test_unterminated_itemize_kept_as_text() {
        let result = latex_to_segments(r"\begin{itemize}\item a");
        assert!(result
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::UnterminatedEnvironment));

        let html = latex_to_html(r"\begin{itemize}\item a");
        assert!(html.contains(r#"<div class="math-line">\begin{itemize}\item a</div>"#));
        assert!(!html.contains('\u{2022}'));
    }

    #[test]
    fn test_unterminated_tail_keeps_inner_blocks() {
        let html = latex_to_html(r"x \begin{quote} \textbf{b} \begin{center}c\end{center}");
        assert!(html.contains(r"x \begin{quote} \textbf{b} "));
        assert!(html.contains(r#"<div class="latex-center">c</div>"#));
        assert!(!html.contains("<strong>"));
    }

    #[test]
    fn test_math_environment_passes_through() {
        assert_eq!(
            segments_of(r"see \begin{align}a&=b\end{align} done"),
            vec![
                plain("see "),
                Segment::DisplayMath(r"\begin{align}a&=b\end{align}".to_string()),
                plain(" done"),
            ]
        );
    }

    #[test]
    fn test_reserved_characters_cannot_forge_tokens() {
        let input = format!("{}ENV0{}", TOKEN_OPEN, TOKEN_CLOSE);
        let result = latex_to_segments(&input);

        assert_eq!(result.warnings[0].kind, WarningKind::ReservedCharacter);
        assert_eq!(segments_of(&input), vec![plain("ENV0")]);
    }
}

// ============================================================================
// Lists
// ============================================================================

mod lists {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_enumerate_three_items_in_order() {
        let html = latex_to_html(r"\begin{enumerate}\item one \item two \item three\end{enumerate}");

        assert!(html.contains(r#"<ol class="enumerate-list">"#));
        assert_eq!(html.matches(r#"<li class="enumerate-item">"#).count(), 3);
        let one = html.find("one").unwrap();
        let two = html.find("two").unwrap();
        let three = html.find("three").unwrap();
        assert!(one < two && two < three);
    }

    #[test]
    fn test_enumerate_counter_start() {
        let html = latex_to_html(r"\begin{enumerate}\setcounter{enumi}{5}\item a \item b\end{enumerate}");

        assert!(html.contains(r#"<ol class="enumerate-list" start="5">"#));
        assert_eq!(html.matches("<li").count(), 2);
        assert!(!html.contains("setcounter"));
    }

    #[test]
    fn test_itemize_without_items_is_empty_list() {
        let html = latex_to_html(r"\begin{itemize}nothing here\end{itemize}");
        assert!(html.contains(r#"<ul class="itemize-list"></ul>"#));
    }

    #[test]
    fn test_description_terms() {
        let html = latex_to_html(r"\begin{description}\item[Apple] fruit \item plain\end{description}");
        assert!(html.contains(concat!(
            r#"<dl class="description-list">"#,
            r#"<dt class="description-term">Apple</dt><dd class="description-item">fruit</dd>"#,
            r#"<dd class="description-item">plain</dd></dl>"#
        )));
    }

    #[test]
    fn test_nested_lists() {
        let html = latex_to_html(r"\begin{itemize}\item a \begin{enumerate}\item b\end{enumerate}\end{itemize}");
        assert!(html.contains(concat!(
            r#"<ul class="itemize-list"><li class="itemize-item">a "#,
            r#"<ol class="enumerate-list"><li class="enumerate-item">b</li></ol></li></ul>"#
        )));
    }

    #[test]
    fn test_math_inside_item_becomes_segment() {
        let segments = segments_of(r"\begin{itemize}\item $x$\end{itemize}");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1], Segment::InlineMath("x".to_string()));
        assert!(matches!(segments[0], Segment::StructuralBlock(_)));
        assert!(matches!(segments[2], Segment::StructuralBlock(_)));
    }
}

// ============================================================================
// Tables
// ============================================================================

mod tables {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_alignments() {
        let table = parse_table(" a & b & c ", ColumnSpec::parse("l|c|r"));
        assert_eq!(table.rows.len(), 1);
        let aligns: Vec<Alignment> = table.rows[0].cells.iter().map(|c| c.alignment).collect();
        assert_eq!(aligns, vec![Alignment::Left, Alignment::Center, Alignment::Right]);

        let html = latex_to_html(r"\begin{tabular}{l|c|r} a & b & c \end{tabular}");
        assert_eq!(html.matches("<td").count(), 3);
        assert!(html.contains(r#"<td class="tabular-cell" style="text-align: left">a</td>"#));
        assert!(html.contains(r#"<td class="tabular-cell border-left" style="text-align: center">b</td>"#));
        assert!(html.contains(r#"<td class="tabular-cell border-left" style="text-align: right">c</td>"#));
    }

    #[test]
    fn test_multicolumn_wraps_math() {
        let table = parse_table(r"\multicolumn{2}{c}{x+y} & z", ColumnSpec::parse("ccc"));
        let cell = &table.rows[0].cells[0];
        assert_eq!(cell.column_span, 2);
        assert_eq!(cell.alignment, Alignment::Center);
        assert_eq!(cell.content, "$x+y$");

        let segments = segments_of(r"\begin{tabular}{ccc}\multicolumn{2}{c}{x+y} & z\end{tabular}");
        assert!(segments.contains(&Segment::InlineMath("x+y".to_string())));
    }

    #[test]
    fn test_ampersand_inside_span_is_not_a_boundary() {
        let table = parse_table(r"\multicolumn{2}{c}{a & b} & c", ColumnSpec::parse("ccc"));
        assert_eq!(table.rows[0].cells.len(), 2);
        assert_eq!(table.rows[0].cells[1].content, "c");
    }

    #[test]
    fn test_table_warnings_surface() {
        let result = latex_to_segments(r"\begin{tabular}{cc} a & b & c \\ \multicolumn{2}{c} \end{tabular}");
        let kinds: Vec<WarningKind> = result.warnings.iter().map(|w| w.kind).collect();
        assert!(kinds.contains(&WarningKind::ExcessCells));
        assert!(kinds.contains(&WarningKind::MalformedSpanDirective));
    }

    #[test]
    fn test_oversized_span_without_spec() {
        let html = latex_to_html(r"\begin{tabular}{}\multicolumn{18446744073709551615}{c}{x} & y\end{tabular}");
        assert!(html.contains(&format!(r#"colspan="{}""#, MAX_COLUMNS)));
        assert!(html.contains(r#"style="text-align: center">y</td>"#));
    }

    #[test]
    fn test_nested_repeat_hits_column_limit() {
        let result = latex_to_segments(r"\begin{tabular}{*{3000}{*{3000}{c}}} a & b \end{tabular}");
        let limits = result
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::ColumnLimit)
            .count();
        assert_eq!(limits, 1);

        let html = latex_to_html(r"\begin{tabular}{*{3000}{*{3000}{c}}} a & b \end{tabular}");
        assert_eq!(html.matches("<td").count(), 2);
    }
}

// ============================================================================
// Segments and inline text
// ============================================================================

mod segments {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_value_line_splits_in_three() {
        assert_eq!(
            segments_of("The value is $x^2$ today."),
            vec![
                plain("The value is "),
                Segment::InlineMath("x^2".to_string()),
                plain(" today."),
            ]
        );
    }

    #[test]
    fn test_adjacent_dollar_spans() {
        assert_eq!(
            split_segments("$a$$b$"),
            vec![
                Segment::InlineMath("a".to_string()),
                Segment::InlineMath("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_inline_formatting_and_escaping() {
        let segments = segments_of(r"\textbf{bold} & \emph{it} <tag>");
        assert_eq!(segments.len(), 1);
        assert!(matches!(segments[0], Segment::PlainText(_)));
        let html = latex_to_html(r"\textbf{bold} & \emph{it} <tag>");
        assert!(html.contains("<strong>bold</strong> &amp; <em>it</em> &lt;tag&gt;"));
    }

    #[test]
    fn test_formatting_around_formulas() {
        let input = r"\textbf{the value $x$ here} and \emph{see $y$}";
        let html = latex_to_html(input);
        assert!(html.contains(r#"<strong>the value <span class="math-inline">\(x\)</span> here</strong>"#));
        assert!(html.contains(r#"<em>see <span class="math-inline">\(y\)</span></em>"#));
        assert!(!html.contains(r"\textbf"));

        let segments = segments_of(input);
        assert_eq!(segments[1], Segment::InlineMath("x".to_string()));
        assert_eq!(segments[3], Segment::InlineMath("y".to_string()));
    }

    #[test]
    fn test_line_splitting() {
        let input = format!("{}\n\nthird", r"first \\ second $a \\ b$ end");
        let result = latex_to_segments(&input);
        let lines = &result.document.lines;

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].segments, vec![plain("first")]);
        assert_eq!(lines[1].segments[1], Segment::InlineMath(r"a \\ b".to_string()));
        assert_eq!(lines[2].segments, vec![plain("third")]);
    }

    #[test]
    fn test_compact_keeps_one_line() {
        let options = HtmlOptions::compact();
        let result = try_latex_to_segments(r"a \\ b", &options).unwrap();
        assert_eq!(result.document.lines.len(), 1);
        assert_eq!(result.document.lines[0].segments.len(), 1);
        let html = latex_to_html_with_options(r"a \\ b", &options);
        assert!(html.contains("a <br> b"));
    }

    #[test]
    fn test_headings_and_stray_items() {
        let html = latex_to_html(r"\section*{Intro}");
        assert!(html.contains(r#"<h2 class="latex-section">Intro</h2>"#));

        let html = latex_to_html(r"\subsection{Part}");
        assert!(html.contains(r#"<h3 class="latex-subsection">Part</h3>"#));

        let html = latex_to_html(r"\item loose");
        assert!(html.contains("\u{2022} loose"));
    }

    #[test]
    fn test_empty_input() {
        let result = latex_to_segments("");
        assert!(result.document.lines.is_empty());
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_json_shape() {
        let result = latex_to_segments("a $x$");
        let json = serde_json::to_value(&result.document).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "lines": [{
                    "segments": [
                        {"kind": "plain_text", "content": "a "},
                        {"kind": "inline_math", "content": "x"}
                    ]
                }]
            })
        );
    }
}

// ============================================================================
// Structural blocks
// ============================================================================

mod blocks {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_theorem_with_name() {
        let segments = segments_of(r"\begin{theorem}[Pythagoras] $a^2+b^2=c^2$\end{theorem}");
        assert_eq!(segments.len(), 3);
        match &segments[0] {
            Segment::StructuralBlock(html) => assert_eq!(
                html.as_str(),
                r#"<div class="latex-theorem"><strong>Theorem (Pythagoras).</strong> "#
            ),
            other => panic!("expected a structural block, got {:?}", other),
        }
        assert_eq!(segments[1], Segment::InlineMath("a^2+b^2=c^2".to_string()));
        assert!(matches!(&segments[2], Segment::StructuralBlock(html) if html.as_str() == "</div>"));
    }

    #[test]
    fn test_starred_proof() {
        let html = latex_to_html(r"\begin{proof*}x\end{proof*}");
        assert!(html.contains(r#"<div class="latex-proof"><strong>Proof.</strong> x</div>"#));
    }

    #[test]
    fn test_verbatim_is_escaped() {
        let html = latex_to_html(r"\begin{verbatim}\textbf{x} $y$ <b>\end{verbatim}");
        assert!(html.contains(r#"<pre class="latex-verbatim">&#92;textbf{x} &#36;y&#36; &lt;b&gt;</pre>"#));
    }

    #[test]
    fn test_generic_wrapper_escapes_content() {
        let html = latex_to_html(r"\begin{foo}<b>\end{foo}");
        assert!(html.contains(r#"<div class="latex-foo">&lt;b&gt;</div>"#));
    }

    #[test]
    fn test_strict_mode_reports_unknown_environment() {
        let input = r"\begin{myenv}x\end{myenv}";
        let strict = try_latex_to_segments(input, &HtmlOptions::strict()).unwrap();
        assert!(strict
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::UnknownEnvironment));

        let lenient = latex_to_segments(input);
        assert!(lenient.warnings.is_empty());
    }

    #[test]
    fn test_nesting_limit() {
        let options = HtmlOptions {
            max_depth: 1,
            ..HtmlOptions::default()
        };
        let input = r"\begin{center}\begin{quote}q\end{quote}\end{center}";
        let result = try_latex_to_segments(input, &options).unwrap();
        assert!(result.warnings.iter().any(|w| w.kind == WarningKind::NestingLimit));

        let html = latex_to_html_with_options(input, &options);
        assert!(html.contains("&#92;begin{quote}q&#92;end{quote}"));
    }
}

// ============================================================================
// Rendering and errors
// ============================================================================

mod rendering {
    use super::*;
    use pretty_assertions::assert_eq;

    struct FailingRenderer;

    impl MathRenderer for FailingRenderer {
        fn render(&self, formula: &str, _options: &MathRenderOptions) -> Result<String, ConversionError> {
            if formula == "bad" {
                Err(ConversionError::render(formula, "parse error"))
            } else {
                Ok(format!("<k>{}</k>", formula))
            }
        }
    }

    #[test]
    fn test_failure_is_local_to_formula() {
        let result = latex_to_segments("$good$ then $bad$ then $fine$");
        let rendered = render_html_with(&result.document, &FailingRenderer);

        assert!(rendered.html.contains("<k>good</k>"));
        assert!(rendered.html.contains("<k>fine</k>"));
        assert!(rendered.html.contains(r#"class="math-error""#));
        assert_eq!(rendered.warnings.len(), 1);
        assert_eq!(rendered.warnings[0].kind, WarningKind::RenderFailure);
    }

    #[test]
    fn test_dollar_delimiters() {
        let options = HtmlOptions {
            math_delimiters: MathDelimiters::Dollar,
            ..HtmlOptions::default()
        };
        let html = latex_to_html_with_options("$x$", &options);
        assert!(html.contains(r#"<span class="math-inline">$x$</span>"#));

        let document = latex_to_segments("$x$").document;
        let html = render_html_with(&document, &DelimiterRenderer::default()).html;
        assert!(html.contains(r#"<span class="math-inline">\(x\)</span>"#));
    }

    #[test]
    fn test_unknown_token_is_an_internal_error() {
        let store = PlaceholderStore::new();
        let text = format!("a {}ENV7{} b", TOKEN_OPEN, TOKEN_CLOSE);
        let err = store.substitute_all(&text).unwrap_err();
        assert!(matches!(err, ConversionError::InternalError { .. }));
    }
}
