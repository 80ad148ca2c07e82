//! texmark CLI - LaTeX dialect to HTML and math segments

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};
#[cfg(feature = "cli")]
use texmark::{
    data::macros::macro_table,
    render_html_with,
    utils::{CliDiagnostic, DiagnosticSeverity},
    ConversionError, DelimiterRenderer, HtmlOptions, LatexConverter, Segment,
};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "texmark")]
#[command(version)]
#[command(about = "texmark - LaTeX dialect to HTML with math segments", long_about = None)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input file path (reads from stdin if not provided)
    input_file: Option<String>,

    /// Output file path (writes to stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Html)]
    format: Format,

    /// Check mode - report diagnostics without writing output
    #[arg(long)]
    check: bool,

    /// JSON file with conversion options (missing fields keep defaults)
    #[arg(long)]
    config: Option<String>,

    /// Disable colored diagnostics
    #[arg(long)]
    no_color: bool,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Print the renderer macro table as JSON
    Macros,

    /// Show version and feature info
    Info,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// HTML with math delimiters for a client-side typesetter
    Html,
    /// Segment document and warnings as JSON
    Json,
    /// One segment per output line, for inspection
    Segments,
}

#[cfg(feature = "cli")]
fn main() {
    env_logger::init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {}", err);
        std::process::exit(2);
    }
}

#[cfg(feature = "cli")]
fn run(cli: Cli) -> Result<(), ConversionError> {
    // Handle subcommands first
    if let Some(cmd) = cli.command {
        return handle_subcommand(cmd);
    }

    let input = match cli.input_file {
        Some(ref path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let options = match cli.config {
        Some(ref path) => HtmlOptions::from_json_file(path)?,
        None => HtmlOptions::default(),
    };
    log::debug!("options: {:?}", options);

    let mut converter = LatexConverter::with_options(options.clone());
    let result = converter.convert(&input);

    let mut diagnostics: Vec<CliDiagnostic> = result.warnings.iter().cloned().map(Into::into).collect();

    let output = match cli.format {
        Format::Html => {
            let rendered = render_html_with(&result.document, &DelimiterRenderer::new(options.math_delimiters));
            diagnostics.extend(rendered.warnings.into_iter().map(Into::into));
            rendered.html
        }
        Format::Json => serde_json::to_string_pretty(&result)?,
        Format::Segments => format_segments(&result.document),
    };

    print_diagnostics(&diagnostics, !cli.no_color);
    let has_errors = diagnostics.iter().any(|d| d.severity == DiagnosticSeverity::Error);

    if cli.check {
        if diagnostics.is_empty() {
            eprintln!("no issues found");
        }
    } else {
        match cli.output {
            Some(ref path) => fs::write(path, &output)?,
            None => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", output)?;
            }
        }
    }

    // Exit with error code if there are errors
    if has_errors {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn handle_subcommand(cmd: Commands) -> Result<(), ConversionError> {
    match cmd {
        Commands::Macros => {
            println!("{}", serde_json::to_string_pretty(&macro_table())?);
        }

        Commands::Info => {
            println!("texmark - LaTeX dialect to HTML with math segments");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Environments:");
            println!("  ✓ enumerate, itemize, description");
            println!("  ✓ tabular, array and matrix-like grids (multicolumn, rules)");
            println!("  ✓ theorem, lemma, proof, definition and friends");
            println!("  ✓ center, quote, verbatim");
            println!("  ✓ math environments passed through to the renderer");
            println!();
            println!("Output formats: html, json, segments");
            println!();
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_diagnostics(diagnostics: &[CliDiagnostic], color: bool) {
    for diag in diagnostics {
        if color {
            eprintln!("{}{}\x1b[0m", diag.color_code(), diag);
        } else {
            eprintln!("{}", diag);
        }
    }
}

#[cfg(feature = "cli")]
fn format_segments(document: &texmark::Document) -> String {
    let mut out = String::new();
    for (idx, line) in document.lines.iter().enumerate() {
        for segment in &line.segments {
            let (kind, content) = match segment {
                Segment::PlainText(html) => ("text", html.as_str()),
                Segment::StructuralBlock(html) => ("block", html.as_str()),
                Segment::InlineMath(formula) => ("inline", formula.as_str()),
                Segment::DisplayMath(formula) => ("display", formula.as_str()),
            };
            out.push_str(&format!("{:>4} {:<8} {}\n", idx + 1, kind, content));
        }
    }
    out.trim_end().to_string()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
}
