//! Command-line interface for incident-classifier
//!
//! Provides `classify`, `explain` and `vocab` subcommands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod classify;
mod explain;
mod utils;
mod vocab;

/// Classify incident narratives into a controlled legal taxonomy
#[derive(Parser)]
#[command(name = "incident-classifier")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every row of a workbook and write the merged spreadsheet
    Classify(Box<classify::ClassifyArgs>),

    /// Classify a single narrative and show how each facet was resolved
    Explain(explain::ExplainArgs),

    /// Print the controlled vocabulary
    Vocab(vocab::VocabArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // The global level is WARN, or DEBUG with --verbose; per-target RUST_LOG directives still apply.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Classify(args) => classify::run(*args),
        Commands::Explain(args) => explain::run(args),
        Commands::Vocab(args) => vocab::run(args),
    }
}
