//! Run configuration

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::vocab::layout::DEFAULT_OUTPUT_HEADERS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Synonyms identifying the narrative column (comma-separated string or list).
    #[serde(deserialize_with = "string_or_list")]
    pub narrative_keywords: Vec<String>,
    /// Sample length above which an unnamed column is taken as free text.
    pub narrative_min_length: usize,
    /// Rows occupied by headers in a template's target sheet.
    pub header_row_count: u32,
    /// 1-based template row carrying the column labels.
    pub template_label_row: u32,
    /// Sheet name used when a fresh workbook is created.
    pub sheet_name: String,
    #[serde(deserialize_with = "string_or_list")]
    pub output_headers: Vec<String>,
    /// Output column receiving the trimmed narrative text.
    pub narrative_column: String,
    /// Input column shown as the record id in the diagnostic log.
    pub id_column: String,
    pub excerpt_chars: usize,
    pub parallel: bool,
    /// Rule table file replacing the built-in rules.
    pub rules: Option<PathBuf>,
    /// Per-facet vocabulary overrides keyed by internal key or column name.
    pub vocabulary: BTreeMap<String, VocabularyOverride>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            narrative_keywords: vec!["relato".to_string()],
            narrative_min_length: 80,
            header_row_count: 2,
            template_label_row: 1,
            sheet_name: "Clasificado Legal Local".to_string(),
            output_headers: DEFAULT_OUTPUT_HEADERS.iter().map(|h| h.to_string()).collect(),
            narrative_column: "relato".to_string(),
            id_column: "id_hecho".to_string(),
            excerpt_chars: 150,
            parallel: false,
            rules: None,
            vocabulary: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VocabularyOverride {
    pub allowed: Vec<String>,
    /// Keeps the built-in default when omitted.
    #[serde(default)]
    pub default: Option<String>,
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    let items = match StringOrList::deserialize(deserializer)? {
        StringOrList::One(joined) => joined.split(',').map(str::to_string).collect(),
        StringOrList::Many(items) => items,
    };
    Ok(items.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
}
