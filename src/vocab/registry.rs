//! Controlled vocabulary: allowed values and default per facet
//!
//! The built-in lists mirror the dropdowns of the delegation workbook. A value
//! written to any facet column must appear here verbatim.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use crate::domain::{Classification, Config, Facet};
use crate::error::ClassifyError;
use crate::utils::fold_compact;

const OFFENSES: &[&str] = &[
    "ROBO",
    "HURTO",
    "LESIONES",
    "HOMICIDIO",
    "USURPACION",
    "ABUSO SEXUAL",
    "LEY 23737",
    "ABIGEATO",
    "ESTAFAS",
    "ABUSO DE ARMAS",
    "TENENCIA DE ARMAS",
    "PORTACION DE ARMAS",
    "ENCUBRIMIENTO",
    "NINGUNO DE INTERÉS",
    "OTROS",
];

const MODALITIES: &[&str] = &[
    "ASALTO",
    "MOTOCHORRO",
    "ENTRADERA",
    "VIOLENCIA DE GÉNERO",
    "HOMICIDIO SIMPLE",
    "FEMICIDIO",
    "INTRAFAMILIAR",
    "EN RIÑA",
    "EN OCASIÓN DE ROBO",
    "AJUSTE DE CUENTAS",
    "ENFRENTAMIENTO ARMADO",
    "SUSTRACCION AUTOMOTOR",
    "SUSTRACCION MOTOVEHICULO",
    "ABUSO SEXUAL SIMPLE",
    "ABUSO SEXUAL CON ACCESO CARNAL",
    "TENENCIA",
    "CONSUMO",
    "COMERCIALIZACION",
    "SIEMBRA",
    "ABIGEATO",
    "ESTAFA MARKETPLACE",
    "ESTAFA WHATSAPP",
    "ESTAFA CUENTO DEL TIO",
    "ESTAFA OTROS",
    "ABUSO DE ARMAS",
    "TENENCIA DE ARMAS",
    "PORTACION DE ARMAS",
    "ENCUBRIMIENTO",
    "NO ESPECIFICADO",
];

const WEAPONS: &[&str] = &["FUEGO", "BLANCA", "IMPROPIA", "NO ESPECIFICADO"];
const YES_NO: &[&str] = &["SI", "NO"];
const GENDERS: &[&str] = &["MASCULINO", "FEMENINO", "AMBOS", "NO ESPECIFICADO"];
const AGE_GROUPS: &[&str] = &["MAYOR", "MENOR", "AMBOS", "NO ESPECIFICADO"];

const JURISDICTIONS: &[&str] = &[
    "JOSÉ C. PAZ",
    "SAN MIGUEL",
    "MALVINAS ARGENTINAS",
    "PILAR",
    "TRES DE FEBRERO",
    "MORENO",
    "RODRIGUEZ",
    "GENERAL PAZ",
    "NAVARRO",
    "MERCEDES",
    "SUIPACHA",
    "LUJAN",
    "GENERAL LAS HERAS",
    "MARCOS PAZ",
    "GENERAL RODRÍGUEZ",
    "EXALTACIÓN DE LA CRUZ",
    "CAMPANA",
    "ZÁRATE",
    "ESCOBAR",
    "TIGRE",
    "SAN FERNANDO",
    "VICENTE LÓPEZ",
    "SAN ISIDRO",
    "SAN MARTIN",
    "HURLINGHAM",
    "ITUZAINGÓ",
    "MERLO",
    "MORÓN",
    "LA MATANZA",
    "EZEIZA",
    "ESTEBAN ECHEVERRÍA",
    "LANÚS",
    "LOMAS DE ZAMORA",
    "AVELLANEDA",
    "QUILMES",
    "BERAZATEGUI",
    "FLORENCIO VARELA",
    "LA PLATA",
    "ENSENADA",
    "BERISSO",
    "BRANDSEN",
    "PRESIDENTE PERÓN",
    "SAN VICENTE",
    "CAÑUELAS",
    "GENERAL ALVEAR",
    "OLAVARRÍA",
    "AZUL",
    "TANDIL",
    "GENERAL PUEYRREDÓN",
    "MIRAMAR",
    "NECOCHEA",
    "BALCARCE",
    "OTRO",
    "NO ESPECIFICADO",
];

const PLACES: &[&str] = &[
    "FINCA",
    "VÍA PÚBLICA",
    "COMERCIO",
    "ESTABLECIMIENTO EDUCATIVO",
    "TRANSPORTE PÚBLICO",
    "BANCO",
    "HOSPITAL",
    "OTRO",
    "NO ESPECIFICADO",
];

const OBSERVATIONS: &[&str] = &["NO ESPECIFICADO"];
const FREQUENCIES: &[&str] = &["DIARIA", "SEMANAL", "MENSUAL", "OCASIONAL", "NO ESPECIFICADO"];

const UNSPECIFIED: &str = "NO ESPECIFICADO";

static BUILTIN: Lazy<VocabularyRegistry> = Lazy::new(|| {
    let entries = Facet::ALL
        .into_iter()
        .map(|facet| {
            let (allowed, default) = match facet {
                Facet::Jurisdiction => (JURISDICTIONS, UNSPECIFIED),
                Facet::Offense => (OFFENSES, "NINGUNO DE INTERÉS"),
                Facet::Modality => (MODALITIES, UNSPECIFIED),
                Facet::Victim | Facet::Perpetrator => (GENDERS, UNSPECIFIED),
                Facet::AgeGroup => (AGE_GROUPS, UNSPECIFIED),
                Facet::Weapon => (WEAPONS, UNSPECIFIED),
                Facet::Injured | Facet::Attempt => (YES_NO, "NO"),
                Facet::Place => (PLACES, UNSPECIFIED),
                Facet::Observation => (OBSERVATIONS, UNSPECIFIED),
                Facet::Frequency => (FREQUENCIES, UNSPECIFIED),
            };
            FacetVocabulary::new(
                facet,
                allowed.iter().map(|v| v.to_string()).collect(),
                default.to_string(),
            )
        })
        .collect();
    VocabularyRegistry { entries }
});

/// Closed value set and default of one facet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetVocabulary {
    facet: Facet,
    allowed: Vec<String>,
    default: String,
    /// Folded form of each allowed value, same order as `allowed`.
    folded: Vec<String>,
}

impl FacetVocabulary {
    fn new(facet: Facet, allowed: Vec<String>, default: String) -> Self {
        let folded = allowed.iter().map(|v| fold_compact(v)).collect();
        Self { facet, allowed, default, folded }
    }

    pub fn facet(&self) -> Facet {
        self.facet
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn default_value(&self) -> &str {
        &self.default
    }

    /// The allowed spelling of `raw`, compared case- and accent-insensitively.
    pub fn canonical(&self, raw: &str) -> Option<&str> {
        let wanted = fold_compact(raw);
        if wanted.is_empty() {
            return None;
        }
        self.folded.iter().position(|f| *f == wanted).map(|i| self.allowed[i].as_str())
    }
}

/// Process-wide, read-only table of facet vocabularies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyRegistry {
    /// One entry per facet, in `Facet::ALL` order.
    entries: Vec<FacetVocabulary>,
}

impl Default for VocabularyRegistry {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

impl VocabularyRegistry {
    /// Built-in vocabulary with the configured overrides applied.
    pub fn from_config(config: &Config) -> Result<Self, ClassifyError> {
        let mut registry = Self::default();
        for (key, over) in &config.vocabulary {
            let facet = Facet::from_key(key).ok_or_else(|| ClassifyError::InvalidVocabulary {
                facet: key.clone(),
                reason: "unknown facet".to_string(),
            })?;
            let allowed: Vec<String> = over
                .allowed
                .iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            if allowed.is_empty() {
                return Err(ClassifyError::InvalidVocabulary {
                    facet: key.clone(),
                    reason: "allowed list is empty".to_string(),
                });
            }
            let default = over
                .default
                .clone()
                .unwrap_or_else(|| registry.vocabulary(facet).default_value().to_string());
            let entry = FacetVocabulary::new(facet, allowed, default.trim().to_string());
            let Some(canonical) = entry.canonical(&default).map(str::to_string) else {
                return Err(ClassifyError::InvalidVocabulary {
                    facet: key.clone(),
                    reason: format!("default '{default}' is not an allowed value"),
                });
            };
            registry.entries[facet as usize] = FacetVocabulary { default: canonical, ..entry };
        }
        Ok(registry)
    }

    pub fn vocabulary(&self, facet: Facet) -> &FacetVocabulary {
        &self.entries[facet as usize]
    }

    pub fn allowed(&self, facet: Facet) -> &[String] {
        self.vocabulary(facet).allowed()
    }

    pub fn default_value(&self, facet: Facet) -> &str {
        self.vocabulary(facet).default_value()
    }

    pub fn is_allowed(&self, facet: Facet, value: &str) -> bool {
        self.allowed(facet).iter().any(|allowed| allowed == value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FacetVocabulary> {
        self.entries.iter()
    }

    /// The all-defaults classification.
    pub fn defaults(&self) -> Classification {
        let values: BTreeMap<Facet, String> =
            self.entries.iter().map(|entry| (entry.facet, entry.default.clone())).collect();
        Classification::from_validated(values)
    }
}
