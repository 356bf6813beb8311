//! Rule-based narrative classifier
//!
//! A pure, deterministic decision list over the folded narrative. The output
//! may contain informal values (modalities outside the dropdown lists, for
//! instance); the vocabulary validator reconciles them afterwards.

use crate::classify::rules::{Rule, Ruleset};
use crate::domain::{Facet, RawClassification};
use crate::utils::fold_compact;
use crate::vocab::VocabularyRegistry;

/// Controlled-vocabulary term paired with its folded search form.
#[derive(Debug, Clone)]
struct Term {
    value: String,
    folded: String,
}

#[derive(Debug, Clone)]
pub struct RuleClassifier {
    rules: Ruleset,
    jurisdictions: Vec<Term>,
    places: Vec<Term>,
}

impl RuleClassifier {
    /// Jurisdiction and place are found by scanning the registry's term lists,
    /// so the classifier takes them once at construction.
    pub fn new(rules: Ruleset, registry: &VocabularyRegistry) -> Self {
        Self {
            rules,
            jurisdictions: terms(registry, Facet::Jurisdiction),
            places: terms(registry, Facet::Place),
        }
    }

    pub fn builtin(registry: &VocabularyRegistry) -> Self {
        Self::new(Ruleset::default(), registry)
    }

    pub fn rules(&self) -> &Ruleset {
        &self.rules
    }

    /// Classify one non-empty narrative. Never fails.
    pub fn classify(&self, narrative: &str) -> RawClassification {
        // Padded so keywords with edge spaces also match at the ends.
        let text = format!(" {} ", fold_compact(narrative));
        let labels = &self.rules.labels;
        let mut raw = RawClassification::new();

        if let Some(exclusion) = first_match(&self.rules.exclusions, &text) {
            raw.set(Facet::Offense, exclusion.value.clone());
            raw.add_note(format!(
                "classified as \"{}\" by an exclusion rule (culpable injuries or traffic accident)",
                exclusion.value
            ));
            return raw;
        }

        let mut injured = false;
        match self.rules.categories.iter().find(|c| c.when.matches(&text)) {
            Some(category) => {
                let offense = first_match(&category.offense_overrides, &text)
                    .map(|r| r.value.as_str())
                    .unwrap_or(&category.offense);
                let modality = first_match(&category.modalities, &text)
                    .map(|r| r.value.as_str())
                    .or(category.fallback_modality.as_deref())
                    .unwrap_or(&labels.unspecified);
                raw.set(Facet::Offense, offense);
                raw.set(Facet::Modality, modality);
                injured = category.marks_injured;
            }
            None => {
                raw.set(Facet::Offense, labels.no_interest.clone());
                raw.set(Facet::Modality, labels.unspecified.clone());
            }
        }

        let weapon = first_match(&self.rules.weapons, &text)
            .map(|r| r.value.as_str())
            .unwrap_or(&labels.unspecified);
        raw.set(Facet::Weapon, weapon);

        injured = injured || self.rules.injured.iter().any(|t| t.matches(&text));
        raw.set(Facet::Injured, if injured { labels.yes.as_str() } else { labels.no.as_str() });

        let genders = &self.rules.genders;
        raw.set(Facet::Victim, self.gender_for(&genders.victim_roles, &text));
        raw.set(Facet::Perpetrator, self.gender_for(&genders.perpetrator_roles, &text));
        raw.set(Facet::AgeGroup, self.age_group(&text));

        let jurisdiction = first_term(&self.jurisdictions, &text).unwrap_or(&labels.unspecified);
        raw.set(Facet::Jurisdiction, jurisdiction);
        raw.set(Facet::Place, first_term(&self.places, &text).unwrap_or(&labels.unspecified));

        let attempted = self.rules.attempt.iter().any(|t| t.matches(&text));
        raw.set(Facet::Attempt, if attempted { labels.yes.as_str() } else { labels.no.as_str() });

        raw
    }

    /// Gender is only attributed when a role keyword is present. Both genders,
    /// or any group keyword, resolve to "both".
    fn gender_for(&self, role_keywords: &[String], text: &str) -> &str {
        let labels = &self.rules.labels;
        if !contains_any(text, role_keywords) {
            return labels.unspecified.as_str();
        }
        let genders = &self.rules.genders;
        let male = contains_any(text, &genders.male);
        let female = contains_any(text, &genders.female);
        if (male && female) || contains_any(text, &genders.group) {
            labels.both.as_str()
        } else if male {
            labels.male.as_str()
        } else if female {
            labels.female.as_str()
        } else {
            labels.unspecified.as_str()
        }
    }

    fn age_group(&self, text: &str) -> &str {
        let labels = &self.rules.labels;
        match (contains_any(text, &self.rules.adult), contains_any(text, &self.rules.minor)) {
            (true, true) => labels.both.as_str(),
            (true, false) => labels.adult.as_str(),
            (false, true) => labels.minor.as_str(),
            (false, false) => labels.unspecified.as_str(),
        }
    }
}

fn terms(registry: &VocabularyRegistry, facet: Facet) -> Vec<Term> {
    let default = registry.default_value(facet);
    registry
        .allowed(facet)
        .iter()
        .filter(|value| value.as_str() != default)
        .map(|value| Term { value: value.clone(), folded: fold_compact(value) })
        .collect()
}

fn first_match<'r>(rules: &'r [Rule], text: &str) -> Option<&'r Rule> {
    rules.iter().find(|rule| rule.when.matches(text))
}

fn first_term<'t>(terms: &'t [Term], text: &str) -> Option<&'t str> {
    terms.iter().find(|term| text.contains(term.folded.as_str())).map(|term| term.value.as_str())
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_str()))
}
