//! The CHTL command-line front end (spec.md §6's "thin collaborator"): reads
//! one input file, runs it through [`chtl::compile`], and writes the emitted
//! HTML (with its CSS inlined via a `<style>` tag) to the output file.

use clap::Parser;
use chtl::Config;
use std::path::PathBuf;
use std::process::ExitCode;

/// CHTL: compiles templated markup to HTML, CSS and JavaScript.
#[derive(Debug, Parser)]
#[command(name = "chtl", version, about)]
struct Cli {
    /// Source `.chtl` file to compile.
    input_file: PathBuf,

    /// Destination for the generated HTML. Defaults to `output.html`.
    #[arg(default_value = "output.html")]
    output_file: PathBuf,

    /// Promote duplicate-definition and missing-variable warnings to errors.
    #[arg(long)]
    strict: bool,

    /// Use wide scanner judgment for CHTL-JS/JS boundary detection (default).
    #[arg(long, conflicts_with = "strict_scan")]
    wide_scan: bool,

    /// Use strict scanner judgment (structural markers only).
    #[arg(long)]
    strict_scan: bool,

    /// Raise logging verbosity to debug for every pipeline phase.
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let config = Config::new()
        .strict(cli.strict)
        .wide_scan(!cli.strict_scan)
        .debug(cli.debug);

    let source = match std::fs::read_to_string(&cli.input_file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("chtl: failed to read {}: {e}", cli.input_file.display());
            return ExitCode::FAILURE;
        }
    };

    let result = chtl::compile(&source, &config);

    for warning in &result.warnings {
        eprintln!("warning[{}]: {}:{}: {}", warning.code, warning.line, warning.column, warning.message);
    }
    for error in &result.errors {
        eprintln!("error[{}]: {}:{}: {}", error.code, error.line, error.column, error.message);
    }

    let document = render_document(&result);
    if let Err(e) = std::fs::write(&cli.output_file, document) {
        eprintln!("chtl: failed to write {}: {e}", cli.output_file.display());
        return ExitCode::FAILURE;
    }

    if result.failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Wraps the generated CSS stream into a `<style>` tag and appends it ahead
/// of the HTML body, so a single self-contained file lands on disk even
/// though [`chtl::compile`] keeps the two streams separate.
fn render_document(result: &chtl::CompileResult) -> String {
    if result.css.is_empty() {
        result.html.clone()
    } else {
        format!("<style>\n{}</style>\n{}", result.css, result.html)
    }
}
