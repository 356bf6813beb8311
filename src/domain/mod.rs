//! Core data types shared across the crate

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::fold_compact;

pub mod config;

pub use config::{Config, VocabularyOverride};

/// Diagnostic attached to rows whose narrative was blank.
pub const EMPTY_NARRATIVE_DIAGNOSTIC: &str = "empty narrative, defaults applied";

/// One axis of the classification taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Jurisdiction,
    Offense,
    Modality,
    Victim,
    Perpetrator,
    AgeGroup,
    Weapon,
    Injured,
    Place,
    Attempt,
    Observation,
    Frequency,
}

impl Facet {
    pub const ALL: [Facet; 12] = [
        Facet::Jurisdiction,
        Facet::Offense,
        Facet::Modality,
        Facet::Victim,
        Facet::Perpetrator,
        Facet::AgeGroup,
        Facet::Weapon,
        Facet::Injured,
        Facet::Place,
        Facet::Attempt,
        Facet::Observation,
        Facet::Frequency,
    ];

    /// Key used by external providers and in configuration files.
    pub fn internal_key(self) -> &'static str {
        match self {
            Facet::Jurisdiction => "JURISDICCION",
            Facet::Offense => "CALIFICACION LEGAL",
            Facet::Modality => "MODALIDAD",
            Facet::Victim => "VICTIMA",
            Facet::Perpetrator => "IMPUTADO",
            Facet::AgeGroup => "MAYOR O MENOR",
            Facet::Weapon => "ARMA",
            Facet::Injured => "LESIONADA",
            Facet::Place => "LUGAR",
            Facet::Attempt => "TENTATIVA",
            Facet::Observation => "OBSERVACION",
            Facet::Frequency => "FRECUENCIA",
        }
    }

    /// Header of the spreadsheet column holding this facet.
    pub fn column(self) -> &'static str {
        match self {
            Facet::Jurisdiction => "JURISDICCIÓN",
            Facet::Offense => "CALIFICACIÓN",
            Facet::Modality => "MODALIDAD",
            Facet::Victim => "VICTIMA/S",
            Facet::Perpetrator => "IMPUTADOS",
            Facet::AgeGroup => "MENOR/MAYOR",
            Facet::Weapon => "ARMAS",
            Facet::Injured => "LESIONADA",
            Facet::Place => "LUGAR",
            Facet::Attempt => "TENTATIVA",
            Facet::Observation => "OBSERVACIÓN",
            Facet::Frequency => "FRECUENCIA",
        }
    }

    /// Resolve a facet from its internal key or its column header,
    /// ignoring case and accents.
    pub fn from_key(key: &str) -> Option<Facet> {
        let folded = fold_compact(key);
        Facet::ALL.into_iter().find(|facet| {
            fold_compact(facet.internal_key()) == folded || fold_compact(facet.column()) == folded
        })
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Scalar value of one spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            CellValue::Number(_) | CellValue::Bool(_) => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => f.write_str(text),
            // Integral floats print without a trailing ".0", like spreadsheet UIs do.
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// One input record: ordered column name to value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<CellValue>,
    {
        let mut row = Row::new();
        for (column, value) in pairs {
            row.insert(column, value);
        }
        row
    }

    /// Set a column, keeping its original position when it already exists.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(name, _)| name == column).map(|(_, value)| value)
    }

    /// Exact lookup first, then a case/accent/whitespace-insensitive one.
    pub fn get_loose(&self, column: &str) -> Option<&CellValue> {
        if let Some(value) = self.get(column) {
            return Some(value);
        }
        let wanted = fold_compact(column);
        self.cells.iter().find(|(name, _)| fold_compact(name) == wanted).map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, value)| value.is_blank())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Unvalidated facet values as produced by the rule engine or a provider.
/// Values may be informal and must pass through the vocabulary validator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawClassification {
    values: BTreeMap<Facet, String>,
    notes: Vec<String>,
}

impl RawClassification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, facet: Facet, value: impl Into<String>) {
        self.values.insert(facet, value.into());
    }

    pub fn with(mut self, facet: Facet, value: impl Into<String>) -> Self {
        self.set(facet, value);
        self
    }

    pub fn get(&self, facet: Facet) -> Option<&str> {
        self.values.get(&facet).map(String::as_str)
    }

    pub fn add_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }
}

/// A complete facet assignment in which every value belongs to its facet's
/// allowed set. Only the vocabulary module can build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Classification {
    values: BTreeMap<Facet, String>,
}

impl Classification {
    pub(crate) fn from_validated(values: BTreeMap<Facet, String>) -> Self {
        debug_assert!(Facet::ALL.iter().all(|facet| values.contains_key(facet)));
        Self { values }
    }

    pub fn get(&self, facet: Facet) -> &str {
        self.values.get(&facet).map(String::as_str).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Facet, &str)> {
        self.values.iter().map(|(facet, value)| (*facet, value.as_str()))
    }

    /// "OFFENSE / MODALITY", the one-line summary used in logs.
    pub fn summary(&self) -> String {
        format!("{} / {}", self.get(Facet::Offense), self.get(Facet::Modality))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOutcome {
    /// Classified by the rule engine or a provider.
    Classified,
    /// Narrative was blank; defaults applied.
    EmptyNarrative,
    /// Provider errored or answered garbage; defaults applied.
    ProviderFailed,
}

/// An input row merged with its validated classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRow {
    /// Visible spreadsheet row number of the source record.
    pub row_number: usize,
    pub original: Row,
    pub narrative: String,
    pub classification: Classification,
    pub outcome: RowOutcome,
    /// Substitutions and failures, each a reviewer-facing sentence.
    pub diagnostics: Vec<String>,
    /// Informational messages from the rule engine.
    pub notes: Vec<String>,
}

impl ClassifiedRow {
    pub fn defaults_applied(&self) -> bool {
        self.outcome != RowOutcome::Classified
    }

    /// All diagnostics joined into one message, if any.
    pub fn diagnostic(&self) -> Option<String> {
        if self.diagnostics.is_empty() {
            None
        } else {
            Some(self.diagnostics.join("; "))
        }
    }
}
