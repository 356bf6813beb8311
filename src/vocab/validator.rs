//! Reconcile raw facet values against the controlled vocabulary
//!
//! This is the only place a `Classification` is assembled from untrusted
//! values. Rule-engine and provider output go through the same gate.

use std::collections::BTreeMap;

use crate::domain::{Classification, Facet, RawClassification};
use crate::vocab::registry::VocabularyRegistry;

/// Validator outcome: a safe classification plus one message per substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub classification: Classification,
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct VocabularyValidator<'a> {
    registry: &'a VocabularyRegistry,
}

impl<'a> VocabularyValidator<'a> {
    pub fn new(registry: &'a VocabularyRegistry) -> Self {
        Self { registry }
    }

    /// Keep allowed values (in their canonical spelling), replace everything
    /// else with the facet default. Missing facets take the default silently.
    pub fn validate(&self, raw: &RawClassification) -> Validated {
        let mut values = BTreeMap::new();
        let mut diagnostics = Vec::new();

        for facet in Facet::ALL {
            let vocabulary = self.registry.vocabulary(facet);
            let value = match raw.get(facet) {
                None => vocabulary.default_value().to_string(),
                Some(candidate) => match vocabulary.canonical(candidate) {
                    Some(canonical) => canonical.to_string(),
                    None => {
                        let fallback = vocabulary.default_value();
                        tracing::debug!(
                            facet = facet.column(),
                            rejected = candidate,
                            "value outside vocabulary, using default"
                        );
                        diagnostics.push(format!(
                            "field \"{}\": value \"{}\" is not allowed, using \"{}\"",
                            facet.column(),
                            candidate,
                            fallback
                        ));
                        fallback.to_string()
                    }
                },
            };
            values.insert(facet, value);
        }

        Validated { classification: Classification::from_validated(values), diagnostics }
    }
}
