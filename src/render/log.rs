//! Plain-text diagnostic log, one block per input row

use std::fmt::Write;

use chrono::Local;

use crate::domain::{ClassifiedRow, Config, Facet, RowOutcome};
use crate::utils::{excerpt, fold_compact};

const RULE: &str = "=================================================================";
const SEPARATOR: &str = "-----------------------------------------------------------------";

/// Criminal-code reference for an offense value, when one is known.
pub fn legal_article(offense: &str) -> Option<&'static str> {
    match fold_compact(offense).as_str() {
        "robo" => Some("CP art. 164/166"),
        "hurto" => Some("CP art. 162"),
        "lesiones" => Some("CP arts. 89-92"),
        "homicidio" => Some("CP arts. 79-80"),
        _ => None,
    }
}

/// Reviewer-facing log of a batch. Lists every row in input order so rows
/// that received defaults can be triaged.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    id_column: String,
    excerpt_chars: usize,
    template: Option<String>,
    warnings: Vec<String>,
    include_timestamp: bool,
}

impl DiagnosticLog {
    pub fn from_config(config: &Config) -> Self {
        Self {
            id_column: config.id_column.clone(),
            excerpt_chars: config.excerpt_chars,
            template: None,
            warnings: Vec::new(),
            include_timestamp: true,
        }
    }

    pub fn with_template(mut self, template: Option<&str>) -> Self {
        self.template = template.map(str::to_string);
        self
    }

    /// Batch-level warnings, printed after the row blocks.
    pub fn with_warnings(mut self, warnings: impl IntoIterator<Item = String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_timestamp(mut self, include_timestamp: bool) -> Self {
        self.include_timestamp = include_timestamp;
        self
    }

    pub fn render(&self, rows: &[ClassifiedRow]) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_to(&mut out, rows);
        out
    }

    fn write_to(&self, out: &mut String, rows: &[ClassifiedRow]) -> std::fmt::Result {
        writeln!(out, "{RULE}")?;
        writeln!(out, "= INCIDENT CLASSIFICATION LOG =")?;
        writeln!(out, "{RULE}")?;
        if self.include_timestamp {
            writeln!(out, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        }
        writeln!(out, "Rows processed: {}", rows.len())?;
        writeln!(out, "Template: {}", self.template.as_deref().unwrap_or("none"))?;

        for row in rows {
            self.write_row(out, row)?;
        }

        if !self.warnings.is_empty() {
            writeln!(out)?;
            writeln!(out, "Batch warnings:")?;
            for warning in &self.warnings {
                writeln!(out, "  [!] {warning}")?;
            }
        }

        let defaulted = rows.iter().filter(|row| row.defaults_applied()).count();
        writeln!(out)?;
        writeln!(out, "{RULE}")?;
        writeln!(out, "= FINISHED: {} rows, {} with defaults applied =", rows.len(), defaulted)?;
        writeln!(out, "{RULE}")
    }

    fn write_row(&self, out: &mut String, row: &ClassifiedRow) -> std::fmt::Result {
        let id = row
            .original
            .get_loose(&self.id_column)
            .filter(|value| !value.is_blank())
            .map(|value| value.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        writeln!(out)?;
        writeln!(out, "--- ROW {} (id: {}) ---", row.row_number, id)?;
        writeln!(out, "  Narrative excerpt: \"{}\"", excerpt(&row.narrative, self.excerpt_chars))?;
        let result = match row.outcome {
            RowOutcome::Classified => "classified",
            RowOutcome::EmptyNarrative => "EMPTY NARRATIVE, defaults applied",
            RowOutcome::ProviderFailed => "PROVIDER FAILED, defaults applied",
        };
        writeln!(out, "  >>> RESULT: {result} <<<")?;
        writeln!(out, "  Summary: {}", row.classification.summary())?;
        if let Some(article) = legal_article(row.classification.get(Facet::Offense)) {
            writeln!(out, "  Legal reference: {article}")?;
        }
        if row.outcome == RowOutcome::Classified {
            writeln!(out, "  Facets:")?;
            for (facet, value) in row.classification.iter() {
                writeln!(out, "    {facet}: {value}")?;
            }
        }
        for note in &row.notes {
            writeln!(out, "    [INFO] {note}")?;
        }
        for diagnostic in &row.diagnostics {
            writeln!(out, "    [!] WARNING: {diagnostic}")?;
        }
        writeln!(out, "{SEPARATOR}")
    }
}
