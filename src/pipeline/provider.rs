//! Seam for external (generative) classification providers.
//!
//! A provider answers with free-form text that should contain one JSON
//! object keyed by facet. Whatever it returns is untrusted and goes through
//! the same vocabulary gate as the rule engine.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::domain::{Facet, RawClassification};
use crate::error::ProviderError;

static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid JSON object regex"));

pub trait ClassificationProvider: Send + Sync {
    fn name(&self) -> &str;
    /// Raw response text for one narrative.
    fn classify(&self, narrative: &str) -> Result<String, ProviderError>;
}

/// Plain functions and closures act as providers, mostly for tests and
/// embedding.
impl<F> ClassificationProvider for F
where
    F: Fn(&str) -> Result<String, ProviderError> + Send + Sync,
{
    fn name(&self) -> &str {
        "function"
    }

    fn classify(&self, narrative: &str) -> Result<String, ProviderError> {
        self(narrative)
    }
}

/// Extract the facet values from a provider response.
///
/// Keys may be internal keys or output column names. Unknown keys and nulls
/// are skipped; other non-string values are stringified and left for the
/// validator to judge.
pub fn parse_provider_response(text: &str) -> Result<RawClassification, ProviderError> {
    let Some(found) = JSON_OBJECT.find(text) else {
        return Err(ProviderError::Malformed("no JSON object in response".to_string()));
    };
    let value: Value = serde_json::from_str(found.as_str())
        .map_err(|err| ProviderError::Malformed(err.to_string()))?;
    let Value::Object(map) = value else {
        return Err(ProviderError::Malformed("response is not a JSON object".to_string()));
    };

    let mut raw = RawClassification::new();
    for (key, value) in map {
        let Some(facet) = Facet::from_key(&key) else {
            tracing::debug!(key = %key, "ignoring unknown provider key");
            continue;
        };
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s,
            other => other.to_string(),
        };
        raw.set(facet, text);
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_surrounded_by_prose() {
        let text = "Claro, aquí está:\n```json\n{\"CALIFICACION LEGAL\": \"ROBO\", \"ARMA\": \"FUEGO\"}\n```\nSaludos";
        let raw = parse_provider_response(text).expect("parse");
        assert_eq!(raw.get(Facet::Offense), Some("ROBO"));
        assert_eq!(raw.get(Facet::Weapon), Some("FUEGO"));
        assert_eq!(raw.get(Facet::Place), None);
    }

    #[test]
    fn accepts_column_names_and_skips_unknown_keys() {
        let raw = parse_provider_response(r#"{"VICTIMA/S": "MUJER", "confianza": 0.9, "LUGAR": null}"#)
            .expect("parse");
        assert_eq!(raw.get(Facet::Victim), Some("MUJER"));
        assert_eq!(raw.get(Facet::Place), None);
    }

    #[test]
    fn non_string_scalars_are_stringified() {
        let raw = parse_provider_response(r#"{"TENTATIVA": true, "FRECUENCIA": 3}"#).expect("parse");
        assert_eq!(raw.get(Facet::Attempt), Some("true"));
        assert_eq!(raw.get(Facet::Frequency), Some("3"));
    }

    #[test]
    fn text_without_object_is_malformed() {
        assert!(matches!(
            parse_provider_response("no puedo clasificar este relato"),
            Err(ProviderError::Malformed(_))
        ));
        assert!(matches!(
            parse_provider_response("{ not json }"),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn closures_are_providers() {
        let provider = |_: &str| -> Result<String, ProviderError> { Err(ProviderError::RateLimited) };
        assert_eq!(provider.name(), "function");
        assert_eq!(ClassificationProvider::classify(&provider, "x"), Err(ProviderError::RateLimited));
    }
}
