//! Narrative location and rule-based classification

pub mod engine;
pub mod locator;
pub mod rules;

pub use engine::RuleClassifier;
pub use locator::NarrativeLocator;
pub use rules::{CategoryRule, Rule, Ruleset, Trigger};
