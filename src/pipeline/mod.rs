//! Row classification pipeline
//!
//! Locates the narrative column once per batch, then turns every input row
//! into exactly one `ClassifiedRow`, in input order.

use rayon::prelude::*;

use crate::classify::{NarrativeLocator, RuleClassifier, Ruleset};
use crate::domain::{ClassifiedRow, Config, Row, RowOutcome, EMPTY_NARRATIVE_DIAGNOSTIC};
use crate::error::ClassifyError;
use crate::vocab::{VocabularyRegistry, VocabularyValidator};

pub mod provider;

pub use provider::{parse_provider_response, ClassificationProvider};

/// Spreadsheet row number of the first data row (row 1 holds the headers).
pub const FIRST_DATA_ROW: usize = 2;

/// Result of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// Column the narratives were read from; `None` for an empty batch.
    pub narrative_column: Option<String>,
    pub rows: Vec<ClassifiedRow>,
}

impl BatchOutcome {
    pub fn count(&self, outcome: RowOutcome) -> usize {
        self.rows.iter().filter(|row| row.outcome == outcome).count()
    }

    /// Rows that carry at least one diagnostic.
    pub fn flagged(&self) -> usize {
        self.rows.iter().filter(|row| !row.diagnostics.is_empty()).count()
    }
}

pub struct RowClassificationPipeline {
    registry: VocabularyRegistry,
    classifier: RuleClassifier,
    locator: NarrativeLocator,
    provider: Option<Box<dyn ClassificationProvider>>,
    first_row_number: usize,
    parallel: bool,
}

impl RowClassificationPipeline {
    pub fn new(registry: VocabularyRegistry, classifier: RuleClassifier, locator: NarrativeLocator) -> Self {
        Self {
            registry,
            classifier,
            locator,
            provider: None,
            first_row_number: FIRST_DATA_ROW,
            parallel: false,
        }
    }

    /// Registry, rule table and locator as configured. A `rules` path replaces
    /// the built-in rule table.
    pub fn from_config(config: &Config) -> Result<Self, ClassifyError> {
        let registry = VocabularyRegistry::from_config(config)?;
        let rules = match &config.rules {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading rule table");
                Ruleset::from_path(path)?
            }
            None => Ruleset::default(),
        };
        let classifier = RuleClassifier::new(rules, &registry);
        let locator = NarrativeLocator::from_config(config);
        Ok(Self::new(registry, classifier, locator).with_parallel(config.parallel))
    }

    /// Classify through `provider` instead of the rule engine.
    pub fn with_provider(mut self, provider: impl ClassificationProvider + 'static) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_first_row_number(mut self, first_row_number: usize) -> Self {
        self.first_row_number = first_row_number;
        self
    }

    pub fn registry(&self) -> &VocabularyRegistry {
        &self.registry
    }

    pub fn classifier(&self) -> &RuleClassifier {
        &self.classifier
    }

    pub fn run(&self, rows: &[Row]) -> Result<BatchOutcome, ClassifyError> {
        self.run_with_progress(rows, &|| {})
    }

    /// Like [`run`](Self::run), calling `tick` once per finished row.
    pub fn run_with_progress(
        &self,
        rows: &[Row],
        tick: &(dyn Fn() + Sync),
    ) -> Result<BatchOutcome, ClassifyError> {
        let Some(first) = rows.first() else {
            return Ok(BatchOutcome { narrative_column: None, rows: Vec::new() });
        };
        let column = self.locator.locate(first)?;
        tracing::info!(column = %column, rows = rows.len(), parallel = self.parallel, "classifying batch");

        let classify = |(index, row): (usize, &Row)| {
            let narrative = row
                .get(&column)
                .or_else(|| row.get_loose(&column))
                .map(|value| value.to_string())
                .unwrap_or_default();
            let classified = self.classify_row(self.first_row_number + index, row, &narrative);
            tick();
            classified
        };

        // Indexed parallel collect keeps input order.
        let classified: Vec<ClassifiedRow> = if self.parallel {
            rows.par_iter().enumerate().map(classify).collect()
        } else {
            rows.iter().enumerate().map(classify).collect()
        };

        Ok(BatchOutcome { narrative_column: Some(column), rows: classified })
    }

    /// Classify one row given its already extracted narrative.
    pub fn classify_row(&self, row_number: usize, original: &Row, narrative: &str) -> ClassifiedRow {
        let narrative = narrative.trim().to_string();
        let mut classified = ClassifiedRow {
            row_number,
            original: original.clone(),
            narrative,
            classification: self.registry.defaults(),
            outcome: RowOutcome::Classified,
            diagnostics: Vec::new(),
            notes: Vec::new(),
        };

        if classified.narrative.is_empty() {
            tracing::debug!(row = row_number, "empty narrative");
            classified.outcome = RowOutcome::EmptyNarrative;
            classified.diagnostics.push(EMPTY_NARRATIVE_DIAGNOSTIC.to_string());
            return classified;
        }

        let raw = match &self.provider {
            None => self.classifier.classify(&classified.narrative),
            Some(provider) => {
                let answer = provider
                    .classify(&classified.narrative)
                    .and_then(|text| parse_provider_response(&text));
                match answer {
                    Ok(raw) => raw,
                    Err(err) => {
                        tracing::warn!(
                            row = row_number,
                            provider = provider.name(),
                            error = %err,
                            "provider failed, applying defaults"
                        );
                        classified.outcome = RowOutcome::ProviderFailed;
                        classified.diagnostics.push(format!("{}: {err}; defaults applied", provider.name()));
                        return classified;
                    }
                }
            }
        };

        let validated = VocabularyValidator::new(&self.registry).validate(&raw);
        tracing::debug!(
            row = row_number,
            summary = %validated.classification.summary(),
            substitutions = validated.diagnostics.len(),
            "row classified"
        );
        classified.classification = validated.classification;
        classified.diagnostics = validated.diagnostics;
        classified.notes = raw.notes().to_vec();
        classified
    }
}
