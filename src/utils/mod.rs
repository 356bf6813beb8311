//! Shared helpers

pub mod text;

pub use text::{excerpt, fold, fold_compact};
