//! Rule table for the narrative classifier
//!
//! ORDER MATTERS: every list is evaluated top to bottom and the first match
//! wins. Exclusions run before categories; within the categories homicide
//! precedes injuries, injuries precede robbery and theft, and the remaining
//! special offenses follow. Keywords are compared against the folded
//! narrative (lowercase, no accents), so they may be written with accents.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ClassifyError;
use crate::utils::fold;

/// Keyword predicate over a folded narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Any keyword occurs as a substring.
    Any(Vec<String>),
    /// Every inner trigger holds.
    All(Vec<Trigger>),
    /// At least one inner trigger holds.
    Either(Vec<Trigger>),
    Not(Box<Trigger>),
}

impl Trigger {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Trigger::Any(words) => words.iter().any(|w| text.contains(w.as_str())),
            Trigger::All(parts) => parts.iter().all(|t| t.matches(text)),
            Trigger::Either(parts) => parts.iter().any(|t| t.matches(text)),
            Trigger::Not(inner) => !inner.matches(text),
        }
    }

    fn normalize(&mut self) {
        match self {
            Trigger::Any(words) => normalize_keywords(words),
            Trigger::All(parts) | Trigger::Either(parts) => parts.iter_mut().for_each(Trigger::normalize),
            Trigger::Not(inner) => inner.normalize(),
        }
    }

    fn check(&self, context: &str) -> Result<(), ClassifyError> {
        match self {
            Trigger::Any(words) if words.is_empty() => {
                Err(ClassifyError::Ruleset(format!("{context}: empty keyword list")))
            }
            Trigger::Any(_) => Ok(()),
            Trigger::All(parts) | Trigger::Either(parts) if parts.is_empty() => {
                Err(ClassifyError::Ruleset(format!("{context}: empty trigger group")))
            }
            Trigger::All(parts) | Trigger::Either(parts) => {
                parts.iter().try_for_each(|t| t.check(context))
            }
            Trigger::Not(inner) => inner.check(context),
        }
    }
}

/// Assign `value` when `when` matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub value: String,
    pub when: Trigger,
}

/// One top-level offense category with its nested modality rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub offense: String,
    pub when: Trigger,
    /// Replace `offense` when one of these matches (e.g. robbery without violence is theft).
    #[serde(default)]
    pub offense_overrides: Vec<Rule>,
    #[serde(default)]
    pub modalities: Vec<Rule>,
    /// Modality when no modality rule matches; unspecified when absent.
    #[serde(default)]
    pub fallback_modality: Option<String>,
    /// The category itself implies an injured victim.
    #[serde(default)]
    pub marks_injured: bool,
}

/// Output labels the engine writes for binary and demographic facets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub unspecified: String,
    pub no_interest: String,
    pub yes: String,
    pub no: String,
    pub male: String,
    pub female: String,
    pub both: String,
    pub adult: String,
    pub minor: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            unspecified: "NO ESPECIFICADO".to_string(),
            no_interest: "NINGUNO DE INTERÉS".to_string(),
            yes: "SI".to_string(),
            no: "NO".to_string(),
            male: "MASCULINO".to_string(),
            female: "FEMENINO".to_string(),
            both: "AMBOS".to_string(),
            adult: "MAYOR".to_string(),
            minor: "MENOR".to_string(),
        }
    }
}

/// Keyword lists for gender attribution to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenderKeywords {
    pub victim_roles: Vec<String>,
    pub perpetrator_roles: Vec<String>,
    pub male: Vec<String>,
    pub female: Vec<String>,
    /// Plural or group-size words that resolve the facet to "both".
    pub group: Vec<String>,
}

impl Default for GenderKeywords {
    fn default() -> Self {
        DEFAULT_RULESET.genders.clone()
    }
}

/// The complete, ordered decision table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ruleset {
    /// Exculpatory patterns; the first match assigns its value as the offense
    /// and ends classification.
    pub exclusions: Vec<Rule>,
    pub categories: Vec<CategoryRule>,
    pub weapons: Vec<Rule>,
    /// Injury evidence beyond categories that already imply it.
    pub injured: Vec<Trigger>,
    pub genders: GenderKeywords,
    pub adult: Vec<String>,
    pub minor: Vec<String>,
    pub attempt: Vec<Trigger>,
    pub labels: Labels,
}

impl Default for Ruleset {
    fn default() -> Self {
        DEFAULT_RULESET.clone()
    }
}

impl Ruleset {
    /// Load a rule table from YAML, TOML or JSON. Sections left out of the
    /// file keep their built-in contents.
    pub fn from_path(path: &Path) -> Result<Self, ClassifyError> {
        let content = fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        let parsed: Ruleset = match ext.as_str() {
            // Triggers are written as `any: [...]` maps, not `!any` tags.
            "yaml" | "yml" => serde_yaml::with::singleton_map_recursive::deserialize(
                serde_yaml::Deserializer::from_str(&content),
            )
            .map_err(|e| ClassifyError::Ruleset(format!("{}: {e}", path.display())))?,
            "toml" => toml::from_str(&content)
                .map_err(|e| ClassifyError::Ruleset(format!("{}: {e}", path.display())))?,
            "json" => serde_json::from_str(&content)
                .map_err(|e| ClassifyError::Ruleset(format!("{}: {e}", path.display())))?,
            other => {
                return Err(ClassifyError::Ruleset(format!(
                    "unsupported rule file extension '.{other}' for {}",
                    path.display()
                )))
            }
        };
        parsed.prepared()
    }

    /// Fold every keyword and validate the table.
    pub fn prepared(mut self) -> Result<Self, ClassifyError> {
        let rules = self
            .exclusions
            .iter_mut()
            .chain(&mut self.weapons)
            .chain(self.categories.iter_mut().flat_map(|c| {
                c.when.normalize();
                c.offense_overrides.iter_mut().chain(c.modalities.iter_mut())
            }));
        for rule in rules {
            rule.when.normalize();
        }
        self.injured.iter_mut().chain(&mut self.attempt).for_each(Trigger::normalize);
        for list in [
            &mut self.genders.victim_roles,
            &mut self.genders.perpetrator_roles,
            &mut self.genders.male,
            &mut self.genders.female,
            &mut self.genders.group,
            &mut self.adult,
            &mut self.minor,
        ] {
            normalize_keywords(list);
        }

        for rule in &self.exclusions {
            rule.when.check(&format!("exclusion '{}'", rule.value))?;
        }
        for category in &self.categories {
            let context = format!("category '{}'", category.offense);
            category.when.check(&context)?;
            for rule in category.offense_overrides.iter().chain(&category.modalities) {
                rule.when.check(&format!("{context} rule '{}'", rule.value))?;
            }
        }
        for rule in &self.weapons {
            rule.when.check(&format!("weapon '{}'", rule.value))?;
        }
        for trigger in self.injured.iter().chain(&self.attempt) {
            trigger.check("facet trigger")?;
        }
        Ok(self)
    }
}

fn normalize_keywords(words: &mut Vec<String>) {
    for word in words.iter_mut() {
        // Keep inner padding: " dos " must not match "todos".
        let padded_left = word.starts_with(' ');
        let padded_right = word.ends_with(' ');
        let mut folded = fold(word);
        if padded_left {
            folded.insert(0, ' ');
        }
        if padded_right {
            folded.push(' ');
        }
        *word = folded;
    }
    words.retain(|w| !w.trim().is_empty());
}

fn any(words: &[&str]) -> Trigger {
    Trigger::Any(words.iter().map(|w| w.to_string()).collect())
}

fn all(parts: Vec<Trigger>) -> Trigger {
    Trigger::All(parts)
}

fn either(parts: Vec<Trigger>) -> Trigger {
    Trigger::Either(parts)
}

fn not(inner: Trigger) -> Trigger {
    Trigger::Not(Box::new(inner))
}

fn rule(value: &str, when: Trigger) -> Rule {
    Rule { value: value.to_string(), when }
}

fn category(offense: &str, when: Trigger, modalities: Vec<Rule>, fallback: Option<&str>) -> CategoryRule {
    CategoryRule {
        offense: offense.to_string(),
        when,
        offense_overrides: Vec::new(),
        modalities,
        fallback_modality: fallback.map(str::to_string),
        marks_injured: false,
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

static DEFAULT_RULESET: Lazy<Ruleset> = Lazy::new(|| {
    let raw = Ruleset {
        exclusions: vec![rule(
            "NINGUNO DE INTERÉS",
            any(&[
                "lesiones culposas",
                "lesión culposa",
                "accidente de tránsito",
                "accidente vial",
                "siniestro vial",
            ]),
        )],
        categories: default_categories(),
        weapons: vec![
            rule("FUEGO", any(&["arma de fuego", "pistola", "revólver", "disparo", "escopeta"])),
            rule("BLANCA", any(&["arma blanca", "cuchillo", "navaja", "punzón"])),
            rule(
                "IMPROPIA",
                any(&[
                    "arma impropia",
                    "palo",
                    "piedra",
                    "botella",
                    "fierro",
                    "objetos contundentes",
                    "a golpes",
                    "golpeado con",
                ]),
            ),
        ],
        injured: vec![any(&[
            "lesionada",
            "lesionado",
            "herida",
            "herido",
            "golpeada",
            "agredida",
            "sufrió lesiones",
        ])],
        genders: GenderKeywords {
            victim_roles: words(&[
                "víctima",
                "damnificado",
                "damnificada",
                "damnificados",
                "damnificadas",
            ]),
            perpetrator_roles: words(&[
                "imputado",
                "imputada",
                "autor",
                "autora",
                "autores",
                "aprehendido",
                "aprehendida",
                "aprehendidos",
            ]),
            male: words(&["masculino", "hombre", "señor", "varón", "individuo", "masculinas"]),
            female: words(&["femenina", "mujer", "señora", "fémina", "individua", "femeninas"]),
            group: words(&["varios", "varias", "ambos", "personas", "más de uno", " dos "]),
        },
        adult: words(&["mayor de edad", "mayor de 18", "adulto", "mayor"]),
        minor: words(&["menor de edad", "menor de 18", "adolescente", "niño", "menor"]),
        attempt: vec![
            any(&["intento de", "tentativa de", "fracasó el ilícito", "no se consumó"]),
            all(vec![any(&["no logró"]), any(&["robar", "hurtar", "concretar"])]),
        ],
        labels: Labels::default(),
    };
    // The built-in table is static data; a failure here is a programming error.
    raw.prepared().expect("built-in rule table is valid")
});

fn default_categories() -> Vec<CategoryRule> {
    let homicide = category(
        "HOMICIDIO",
        any(&["homicidio", "muerte", "fallec", "occiso", "asesinat"]),
        vec![
            rule("FEMICIDIO", any(&["femicidio"])),
            rule("INTRAFAMILIAR", any(&["intrafamiliar", "ámbito familiar", "miembro de familia"])),
            rule(
                "EN RIÑA",
                any(&["riña", "gresca", "pelea más de dos personas", "agresión más de dos personas"]),
            ),
            rule(
                "EN OCASIÓN DE ROBO",
                either(vec![
                    any(&["ocasión de robo"]),
                    all(vec![any(&["robo", "sustracción"]), any(&["homicidio"])]),
                ]),
            ),
            rule("AJUSTE DE CUENTAS", any(&["ajuste de cuentas", "vengar agravio", "deuda pendiente"])),
            rule(
                "ENFRENTAMIENTO ARMADO",
                either(vec![
                    any(&["enfrentamiento armado", "tiroteo"]),
                    all(vec![any(&["personal policial"]), any(&["delincuentes"])]),
                ]),
            ),
        ],
        Some("HOMICIDIO SIMPLE"),
    );

    let injuries = CategoryRule {
        marks_injured: true,
        ..category(
            "LESIONES",
            any(&["lesion", "herid", "golpe", "agred", "daño físico", "contusiones"]),
            vec![rule(
                "VIOLENCIA DE GÉNERO",
                any(&[
                    "violencia de género",
                    "género",
                    "pareja",
                    "ex-pareja",
                    "intrafamiliar",
                    "violencia familiar",
                ]),
            )],
            None,
        )
    };

    let robbery = CategoryRule {
        offense_overrides: vec![rule(
            "HURTO",
            any(&["sin violencia", "sin fuerza", "sin intimidación", "sin uso de fuerza"]),
        )],
        ..category(
            "ROBO",
            any(&["robo", "sustrajo", "desapoderamiento", "apoderamiento ilegal", "sustracción"]),
            vec![
                rule(
                    "MOTOCHORRO",
                    either(vec![
                        any(&["motochorro"]),
                        all(vec![any(&["moto"]), any(&["asalto", "robo"])]),
                    ]),
                ),
                rule(
                    "ENTRADERA",
                    either(vec![
                        any(&["entradera"]),
                        all(vec![
                            any(&["domicilio"]),
                            any(&["ingreso"]),
                            any(&["violencia", "sorprenden"]),
                        ]),
                    ]),
                ),
                rule(
                    "ASALTO EN FINCA",
                    either(vec![
                        any(&["asalto en finca"]),
                        all(vec![any(&["finca"]), any(&["asalto", "robo"])]),
                    ]),
                ),
                rule(
                    "ASALTO EN VÍA PÚBLICA",
                    either(vec![
                        any(&["asalto en vía pública"]),
                        all(vec![any(&["vía pública"]), any(&["asalto"])]),
                    ]),
                ),
                rule(
                    "ASALTO EN COMERCIO",
                    either(vec![
                        any(&["asalto en comercio"]),
                        all(vec![any(&["comercio"]), any(&["asalto"])]),
                    ]),
                ),
                rule("ROBACABLES", any(&["robacables", "robo de cables"])),
                rule("ROBARRUEDAS", any(&["robarruedas", "robo de ruedas"])),
                rule("ROMPEVIDRIOS", any(&["rompevidrios", "ruptura de cristal", "rompió el vidrio"])),
                rule("ARREBATADOR", any(&["arrebatador", "arrebato"])),
                rule(
                    "BICICLETA",
                    all(vec![any(&["bicicleta"]), any(&["robo", "hurto", "sustracción"])]),
                ),
                rule(
                    "CHOFERES/REPARTIDORES",
                    any(&["chofer", "repartidor", "taxi", "aplicación", "delivery"]),
                ),
                rule(
                    "SUSTRACCION AUTOMOTOR",
                    any(&["sustracción automotor", "robo de auto", "hurto de auto"]),
                ),
                rule(
                    "SUSTRACCION MOTOVEHICULO",
                    any(&["sustracción motovehículo", "robo de moto", "hurto de moto"]),
                ),
                rule(
                    "ROBO SIMPLE",
                    all(vec![any(&["robo simple"]), not(any(&["arma", "intimidación"]))]),
                ),
                rule("ASALTO", any(&["asalto"])),
            ],
            None,
        )
    };

    let theft = category(
        "HURTO",
        any(&["hurto", "hurtar", "hurtaron"]),
        vec![
            rule("SUSTRACCION AUTOMOTOR", any(&["hurto de auto", "automotor"])),
            rule("SUSTRACCION MOTOVEHICULO", any(&["hurto de moto", "motovehículo"])),
        ],
        None,
    );

    vec![
        homicide,
        injuries,
        robbery,
        theft,
        category(
            "USURPACION",
            any(&["usurpación", "toma de terreno", "desalojo"]),
            Vec::new(),
            Some("USURPACION"),
        ),
        category(
            "ABUSO SEXUAL",
            any(&["abuso sexual"]),
            vec![rule("ABUSO SEXUAL CON ACCESO CARNAL", any(&["acceso carnal"]))],
            Some("ABUSO SEXUAL SIMPLE"),
        ),
        category(
            "LEY 23737",
            any(&["ley 23737", "estupefacientes", "droga", "narcóticos"]),
            vec![
                rule("COMERCIALIZACION", any(&["comercialización", "venta de droga"])),
                rule("TENENCIA", any(&["tenencia", "poseía droga"])),
                rule("CONSUMO", any(&["consumo", "consumía droga"])),
                rule("SIEMBRA", any(&["siembra", "cultivo"])),
            ],
            None,
        ),
        category(
            "ABIGEATO",
            any(&["abigeato", "robo de ganado", "animales"]),
            Vec::new(),
            Some("ABIGEATO"),
        ),
        category(
            "ESTAFAS",
            any(&["estafa"]),
            vec![
                rule("ESTAFA MARKETPLACE", any(&["marketplace"])),
                rule("ESTAFA WHATSAPP", any(&["whatsapp"])),
                rule("ESTAFA CUENTO DEL TIO", any(&["cuento del tío"])),
            ],
            Some("ESTAFA OTROS"),
        ),
        category("ABUSO DE ARMAS", any(&["abuso de armas"]), Vec::new(), Some("ABUSO DE ARMAS")),
        category(
            "TENENCIA DE ARMAS",
            any(&["tenencia de armas"]),
            Vec::new(),
            Some("TENENCIA DE ARMAS"),
        ),
        category(
            "PORTACION DE ARMAS",
            any(&["portación de armas"]),
            Vec::new(),
            Some("PORTACION DE ARMAS"),
        ),
        category(
            "ENCUBRIMIENTO",
            any(&["encubrimiento"]),
            vec![
                rule("ENCUBRIMIENTO VÍA PÚBLICA", any(&["vía pública"])),
                rule("ENCUBRIMIENTO TALLER", any(&["taller"])),
                rule("ENCUBRIMIENTO DOMICILIO PARTICULAR", any(&["domicilio particular"])),
            ],
            Some("ENCUBRIMIENTO"),
        ),
        category(
            "ENFRENTAMIENTOS",
            any(&["enfrentamiento", "tiroteo", "bandas antagónicas"]),
            vec![
                rule(
                    "EN OCASIÓN DE ROBO",
                    either(vec![
                        any(&["ocasión de robo"]),
                        all(vec![any(&["robo"]), any(&["enfrentamiento"])]),
                    ]),
                ),
                rule("AJUSTE DE CUENTAS", any(&["ajuste de cuentas"])),
                rule(
                    "PROCEDIMIENTO POLICIAL",
                    either(vec![
                        any(&["procedimiento policial"]),
                        all(vec![any(&["policía"]), any(&["delincuentes"])]),
                    ]),
                ),
                rule("EN RIÑA", any(&["riña", "gresca"])),
                rule("BANDAS ANTAGÓNICAS", any(&["bandas antagónicas", "grupos enfrentados"])),
            ],
            None,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn builtin_keywords_are_folded() {
        let rules = Ruleset::default();
        let Trigger::Any(words) = &rules.exclusions[0].when else {
            panic!("exclusion should be a keyword list");
        };
        assert!(words.contains(&"accidente de transito".to_string()));
        assert!(rules.genders.group.contains(&" dos ".to_string()));
    }

    #[test]
    fn category_order_puts_homicide_first() {
        let rules = Ruleset::default();
        let offenses: Vec<&str> = rules.categories.iter().map(|c| c.offense.as_str()).collect();
        assert_eq!(&offenses[..4], &["HOMICIDIO", "LESIONES", "ROBO", "HURTO"]);
    }

    #[test]
    fn trigger_combinators() {
        let t = all(vec![any(&["moto"]), not(any(&["bicicleta"]))]);
        assert!(t.matches("robo en moto"));
        assert!(!t.matches("robo de bicicleta en moto"));
        assert!(either(vec![any(&["x"]), any(&["robo"])]).matches("robo"));
    }

    #[test]
    fn yaml_rule_file_overrides_sections_and_keeps_the_rest() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("rules.yaml");
        fs::write(
            &path,
            "weapons:\n  - value: FUEGO\n    when:\n      any: [\"Escopetazo\"]\n",
        )
        .expect("write");

        let rules = Ruleset::from_path(&path).expect("rules");
        assert_eq!(rules.weapons.len(), 1);
        assert!(rules.weapons[0].when.matches("un escopetazo"));
        assert_eq!(rules.categories.len(), Ruleset::default().categories.len());
    }

    #[test]
    fn yaml_rule_file_accepts_nested_triggers() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("rules.yml");
        fs::write(
            &path,
            "attempt:\n  - all:\n      - any: [\"intentó\"]\n      - not:\n          any: [\"logró\"]\n",
        )
        .expect("write");

        let rules = Ruleset::from_path(&path).expect("rules");
        assert_eq!(rules.attempt.len(), 1);
        assert!(rules.attempt[0].matches("intento sustraer"));
        assert!(!rules.attempt[0].matches("intento y logro huir"));
    }

    #[test]
    fn empty_keyword_list_is_rejected() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("rules.json");
        fs::write(&path, r#"{"weapons":[{"value":"FUEGO","when":{"any":[]}}]}"#).expect("write");
        let err = Ruleset::from_path(&path).expect_err("empty list");
        assert!(err.to_string().contains("empty keyword list"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("rules.ini");
        fs::write(&path, "").expect("write");
        assert!(Ruleset::from_path(&path).is_err());
    }
}
