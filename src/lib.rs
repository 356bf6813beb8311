//! incident-classifier: rule-based classification of incident narratives
//!
//! Reads rows from a workbook, finds the narrative column, classifies each
//! narrative against a controlled legal taxonomy, and writes the result into
//! a fresh workbook or a pre-formatted template.

pub mod classify;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod render;
pub mod utils;
pub mod vocab;

pub use classify::{NarrativeLocator, RuleClassifier, Ruleset};
pub use domain::{CellValue, Classification, ClassifiedRow, Config, Facet, RawClassification, Row, RowOutcome};
pub use error::{ClassifyError, ProviderError};
pub use pipeline::{BatchOutcome, ClassificationProvider, RowClassificationPipeline};
pub use render::{DiagnosticLog, Template, TemplateMerger};
pub use vocab::{VocabularyRegistry, VocabularyValidator};
