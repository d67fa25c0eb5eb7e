//! Cflat AST→LIR lowering CLI.
//!
//! Reads a JSON-serialized Cflat AST from a file, lowers it to LIR, and
//! prints the serialized LIR to standard output.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Lowers a Cflat AST (given as JSON) into LIR text.
#[derive(Parser, Debug)]
#[command(name = "cflatc")]
#[command(author = "Fax Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Lowers a Cflat AST into LIR", long_about = None)]
struct Args {
    /// Path to a file containing the AST serialized as JSON.
    path: PathBuf,

    /// Raise the default log level one notch (info instead of warn).
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args.path) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &Path) -> anyhow::Result<String> {
    tracing::debug!(path = %path.display(), "reading AST");
    let ast = cflat_ast::read_program_from_path(path)?;

    tracing::debug!("lowering AST to LIR");
    let lir = cflat_lir::lower_program(&ast)?;

    Ok(cflat_lir::serialize_program(&lir))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
