//! Report JSON generation.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::{Facet, RowOutcome};
use crate::pipeline::BatchOutcome;
use crate::render::workbook::MergeOutcome;

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Summary of a batch run: counts per outcome and per offense, plus
/// everything needed to tie the output back to its input.
pub fn build_report(
    batch: &BatchOutcome,
    merge: &MergeOutcome,
    input_sha256: &str,
    warnings: &[String],
    include_timestamp: bool,
) -> Value {
    let mut offenses: BTreeMap<&str, usize> = BTreeMap::new();
    for row in &batch.rows {
        *offenses.entry(row.classification.get(Facet::Offense)).or_default() += 1;
    }

    let mut report = Map::new();
    report.insert("schema_version".to_string(), Value::String(REPORT_SCHEMA_VERSION.to_string()));
    if include_timestamp {
        report.insert(
            "generated_at".to_string(),
            Value::String(Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string()),
        );
    }
    report.insert("input_sha256".to_string(), Value::String(input_sha256.to_string()));
    report.insert("narrative_column".to_string(), json!(batch.narrative_column));
    report.insert("merge_mode".to_string(), json!(merge.mode));
    report.insert("columns".to_string(), json!(merge.columns));
    report.insert(
        "rows".to_string(),
        json!({
            "total": batch.rows.len(),
            "classified": batch.count(RowOutcome::Classified),
            "empty_narrative": batch.count(RowOutcome::EmptyNarrative),
            "provider_failed": batch.count(RowOutcome::ProviderFailed),
            "with_diagnostics": batch.flagged(),
        }),
    );
    report.insert("offenses".to_string(), json!(offenses));
    report.insert("warnings".to_string(), json!(warnings));
    Value::Object(report)
}

pub fn write_report(report_path: &Path, report: &Value) -> Result<()> {
    if let Some(parent) = report_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(report_path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}
