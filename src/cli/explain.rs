//! Explain command implementation

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use serde_json::json;
use std::path::PathBuf;

use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::domain::{Facet, Row};
use crate::pipeline::RowClassificationPipeline;
use crate::render::legal_article;

#[derive(Args)]
pub struct ExplainArgs {
    /// Narrative text to classify
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Path to config file (incident-classifier.toml or .yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Rule table replacing the built-in rules
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ExplainArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = merge_cli_with_config(
        load_config(&cwd, args.config.as_deref())?,
        CliOverrides { rules: args.rules.clone(), ..CliOverrides::default() },
    );
    let pipeline = RowClassificationPipeline::from_config(&config).context("Invalid configuration")?;

    let row = pipeline.classify_row(1, &Row::new(), &args.text);

    if args.json {
        let value = json!({
            "outcome": row.outcome,
            "classification": row.classification,
            "diagnostics": row.diagnostics,
            "notes": row.notes,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", style(row.classification.summary()).bold());
    if let Some(article) = legal_article(row.classification.get(Facet::Offense)) {
        println!("  ({article})");
    }
    println!();
    for (facet, value) in row.classification.iter() {
        let is_default = value == pipeline.registry().default_value(facet);
        let shown = if is_default { style(value).dim() } else { style(value).cyan() };
        println!("  {:<14} {}", facet.column(), shown);
    }
    if !row.notes.is_empty() || !row.diagnostics.is_empty() {
        println!();
    }
    for note in &row.notes {
        println!("  {} {note}", style("note:").blue());
    }
    for diagnostic in &row.diagnostics {
        println!("  {} {diagnostic}", style("warning:").yellow());
    }
    Ok(())
}
