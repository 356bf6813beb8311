//! Controlled vocabulary, validation and output layout

pub mod layout;
pub mod registry;
pub mod validator;

pub use layout::{ColumnSource, OutputLayout, DEFAULT_OUTPUT_HEADERS};
pub use registry::{FacetVocabulary, VocabularyRegistry};
pub use validator::{Validated, VocabularyValidator};
