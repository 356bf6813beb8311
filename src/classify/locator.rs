//! Narrative column detection

use crate::domain::{Config, Row};
use crate::error::ClassifyError;
use crate::utils::fold_compact;

/// Finds the column holding the free-text narrative. Runs once per batch.
#[derive(Debug, Clone)]
pub struct NarrativeLocator {
    /// Folded synonyms of "narrative".
    keywords: Vec<String>,
    /// Sampled values longer than this mark a column as free text.
    min_length: usize,
}

impl NarrativeLocator {
    pub fn new<S: AsRef<str>>(keywords: &[S], min_length: usize) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| fold_compact(k.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords, min_length }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.narrative_keywords, config.narrative_min_length)
    }

    /// Name of the narrative column of a batch whose first row is `sample`.
    ///
    /// The first header containing a keyword wins; failing that, the first
    /// column whose sampled value is longer than the threshold.
    pub fn locate(&self, sample: &Row) -> Result<String, ClassifyError> {
        if let Some(column) = sample.columns().find(|name| {
            let folded = fold_compact(name);
            self.keywords.iter().any(|k| folded.contains(k.as_str()))
        }) {
            return Ok(column.to_string());
        }

        if let Some((column, _)) = sample
            .iter()
            .find(|(_, value)| value.to_string().trim().chars().count() > self.min_length)
        {
            tracing::warn!(column, "no narrative header found, using first long free-text column");
            return Ok(column.to_string());
        }

        Err(ClassifyError::MissingNarrativeColumn {
            columns: sample.columns().map(str::to_string).collect(),
        })
    }
}
