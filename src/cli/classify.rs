//! Classify command implementation

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Instant;

use super::utils::{config_anchor, parse_csv, sibling_path};
use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::domain::RowOutcome;
use crate::input::read_workbook_bytes;
use crate::pipeline::RowClassificationPipeline;
use crate::render::{build_report, sha256_hex, write_report, DiagnosticLog, MergeMode, Template, TemplateMerger};

#[derive(Args)]
pub struct ClassifyArgs {
    /// Input workbook (first sheet, first row holds the headers)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Template workbook to append the classified rows into
    #[arg(short = 't', long, value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// Output workbook [default: <INPUT>_clasificado.xlsx]
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Diagnostic log path [default: <OUTPUT>_log.txt]
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Also write a JSON batch report
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Path to config file (incident-classifier.toml or .yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Rule table replacing the built-in rules (.yaml, .toml or .json)
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Narrative column keywords (comma-separated)
    #[arg(short = 'k', long, value_name = "WORDS")]
    pub narrative_keywords: Option<String>,

    /// Header rows in the template sheet
    #[arg(long, value_name = "N")]
    pub header_rows: Option<u32>,

    /// Worksheet name when writing a new workbook
    #[arg(long, value_name = "NAME")]
    pub sheet_name: Option<String>,

    /// Classify rows in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

pub fn run(args: ClassifyArgs) -> Result<()> {
    let started = Instant::now();

    let file_config = load_config(&config_anchor(&args.input), args.config.as_deref())?;
    let config = merge_cli_with_config(
        file_config,
        CliOverrides {
            narrative_keywords: parse_csv(&args.narrative_keywords),
            header_row_count: args.header_rows,
            sheet_name: args.sheet_name.clone(),
            rules: args.rules.clone(),
            parallel: if args.parallel { Some(true) } else { None },
        },
    );

    let input_bytes = fs::read(&args.input)
        .with_context(|| format!("Failed reading input workbook: {}", args.input.display()))?;
    let input_sha256 = sha256_hex(&input_bytes);
    let sheet = read_workbook_bytes(input_bytes)
        .with_context(|| format!("Failed parsing input workbook: {}", args.input.display()))?;
    tracing::info!(sheet = %sheet.sheet_name, rows = sheet.rows.len(), "input loaded");

    let pipeline = RowClassificationPipeline::from_config(&config)
        .context("Invalid configuration")?
        .with_first_row_number(sheet.first_data_row);

    let show_progress = !args.no_progress && std::io::stderr().is_terminal();
    let progress = if show_progress {
        ProgressBar::new(sheet.rows.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} rows ({eta})")
            .map(|s| s.progress_chars("=> "))
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let batch = pipeline
        .run_with_progress(&sheet.rows, &|| progress.inc(1))
        .with_context(|| format!("Cannot classify {}", args.input.display()))?;
    progress.finish_and_clear();

    let template = match args.template.as_deref() {
        Some(path) => Some(
            Template::from_path(path)
                .with_context(|| format!("Failed reading template: {}", path.display()))?,
        ),
        None => None,
    };
    let merge = TemplateMerger::from_config(&config).write(&batch.rows, template.as_ref())?;
    let warnings = merge.warnings.clone();

    let output_path = args.output.clone().unwrap_or_else(|| sibling_path(&args.input, "_clasificado.xlsx"));
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output_path, &merge.bytes)
        .with_context(|| format!("Failed writing output workbook: {}", output_path.display()))?;

    let log_path = args.log.clone().unwrap_or_else(|| sibling_path(&output_path, "_log.txt"));
    let log = DiagnosticLog::from_config(&config)
        .with_template(template.as_ref().map(|t| t.name.as_str()))
        .with_warnings(warnings.iter().cloned())
        .render(&batch.rows);
    fs::write(&log_path, log)
        .with_context(|| format!("Failed writing diagnostic log: {}", log_path.display()))?;

    if let Some(report_path) = args.report.as_deref() {
        let report = build_report(&batch, &merge, &input_sha256, &warnings, true);
        write_report(report_path, &report)
            .with_context(|| format!("Failed writing report: {}", report_path.display()))?;
    }

    for warning in &warnings {
        eprintln!("{} {warning}", style("warning:").yellow().bold());
    }

    let mode = match merge.mode {
        MergeMode::Fresh => "new workbook",
        MergeMode::Template => "template",
    };
    println!();
    println!("{}", style("Classification complete!").green().bold());
    println!();
    println!("  Input:            {}", args.input.display());
    println!("  Narrative column: {}", batch.narrative_column.as_deref().unwrap_or("-"));
    println!("  Rows:             {}", batch.rows.len());
    println!("  Classified:       {}", batch.count(RowOutcome::Classified));
    println!("  Empty narrative:  {}", batch.count(RowOutcome::EmptyNarrative));
    if batch.count(RowOutcome::ProviderFailed) > 0 {
        println!("  Provider failed:  {}", batch.count(RowOutcome::ProviderFailed));
    }
    println!("  Flagged rows:     {}", batch.flagged());
    println!("  Output ({mode}): {}", output_path.display());
    println!("  Log:              {}", log_path.display());
    if let Some(report_path) = args.report.as_deref() {
        println!("  Report:           {}", report_path.display());
    }
    println!("  Time:             {:.2}s", started.elapsed().as_secs_f64());

    Ok(())
}
