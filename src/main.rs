//! incident-classifier: classify incident narratives into spreadsheets
//!
//! Thin binary over the library; see `incident_classifier::cli`.

use anyhow::Result;

fn main() -> Result<()> {
    incident_classifier::cli::run()
}
