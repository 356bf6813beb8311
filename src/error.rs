//! Typed errors for the classification library

use thiserror::Error;

/// Batch-level failures. Per-row problems never surface here; they become
/// diagnostics on the affected row.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("no narrative column found among headers [{}]", columns.join(", "))]
    MissingNarrativeColumn { columns: Vec<String> },

    #[error("invalid vocabulary for facet '{facet}': {reason}")]
    InvalidVocabulary { facet: String, reason: String },

    #[error("invalid rule table: {0}")]
    Ruleset(String),

    #[error("workbook error: {0}")]
    Workbook(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures of an external classification provider for a single narrative.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(String),

    #[error("provider rate limit exceeded")]
    RateLimited,

    #[error("malformed provider response: {0}")]
    Malformed(String),
}
