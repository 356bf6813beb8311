//! Output column order and where each column's value comes from

use crate::domain::{CellValue, ClassifiedRow, Config, Facet};
use crate::utils::fold_compact;

/// Column order of the delegation workbook.
pub const DEFAULT_OUTPUT_HEADERS: &[&str] = &[
    "id_hecho",
    "nro_registro",
    "ipp",
    "fecha_carga",
    "hora_carga",
    "dependencia",
    "fecha_inicio_hecho",
    "hora_inicio_hecho",
    "partido_hecho",
    "localidad_hecho",
    "latitud",
    "calle",
    "longitud",
    "altura",
    "entre",
    "calificaciones",
    "relato",
    "JURISDICCIÓN",
    "CALIFICACIÓN",
    "MODALIDAD",
    "VICTIMA/S",
    "NO",
    "IMPUTADOS",
    "MENOR/MAYOR",
    "ARMAS",
    "LESIONADA",
    "LUGAR",
    "TENTATIVA",
    "OBSERVACIÓN",
    "FRECUENCIA",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    /// Value of a classification facet.
    Facet(Facet),
    /// The trimmed narrative text.
    Narrative,
    /// Copied from the input row column of the same name (blank when absent).
    Passthrough(String),
    /// Unlabeled column; always written empty.
    Blank,
}

impl ColumnSource {
    pub fn resolve(label: &str, narrative_column: &str) -> Self {
        let folded = fold_compact(label);
        if folded.is_empty() {
            ColumnSource::Blank
        } else if folded == fold_compact(narrative_column) {
            ColumnSource::Narrative
        } else if let Some(facet) = Facet::from_key(label) {
            ColumnSource::Facet(facet)
        } else {
            ColumnSource::Passthrough(label.trim().to_string())
        }
    }
}

/// Ordered output columns. Every row rendered through one layout has the same
/// column set and order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    columns: Vec<(String, ColumnSource)>,
}

impl OutputLayout {
    pub fn new<S: AsRef<str>>(headers: &[S], narrative_column: &str) -> Self {
        let columns = headers
            .iter()
            .map(|h| {
                let label = h.as_ref().to_string();
                let source = ColumnSource::resolve(&label, narrative_column);
                (label, source)
            })
            .collect();
        Self { columns }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.output_headers, &config.narrative_column)
    }

    /// Same column sources, different labels and order (a template's).
    pub fn with_headers<S: AsRef<str>>(&self, headers: &[S]) -> Self {
        let narrative_column = self
            .columns
            .iter()
            .find(|(_, source)| *source == ColumnSource::Narrative)
            .map(|(label, _)| label.as_str())
            .unwrap_or("relato");
        Self::new(headers, narrative_column)
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|(label, _)| label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Facets that have no column in this layout.
    pub fn missing_facets(&self) -> Vec<Facet> {
        Facet::ALL
            .into_iter()
            .filter(|facet| !self.columns.iter().any(|(_, s)| *s == ColumnSource::Facet(*facet)))
            .collect()
    }

    /// Build the output cells of one row: pass-through columns from the
    /// original row, facet columns from the classification.
    pub fn render(&self, row: &ClassifiedRow) -> Vec<CellValue> {
        self.columns
            .iter()
            .map(|(_, source)| match source {
                ColumnSource::Facet(facet) => {
                    CellValue::Text(row.classification.get(*facet).to_string())
                }
                ColumnSource::Narrative => CellValue::Text(row.narrative.clone()),
                ColumnSource::Passthrough(name) => {
                    row.original.get_loose(name).cloned().unwrap_or_default()
                }
                ColumnSource::Blank => CellValue::Empty,
            })
            .collect()
    }
}
