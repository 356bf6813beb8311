//! CLI overrides on top of file configuration

use std::path::PathBuf;

use crate::domain::Config;

/// Values given on the command line. `None` keeps the file/default value.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub narrative_keywords: Option<Vec<String>>,
    pub header_row_count: Option<u32>,
    pub sheet_name: Option<String>,
    pub rules: Option<PathBuf>,
    pub parallel: Option<bool>,
}

/// Precedence: CLI > file > defaults.
pub fn merge_cli_with_config(mut config: Config, cli: CliOverrides) -> Config {
    if let Some(keywords) = cli.narrative_keywords.filter(|k| !k.is_empty()) {
        config.narrative_keywords = keywords;
    }
    if let Some(count) = cli.header_row_count {
        config.header_row_count = count;
    }
    if let Some(name) = cli.sheet_name {
        config.sheet_name = name;
    }
    if let Some(rules) = cli.rules {
        config.rules = Some(rules);
    }
    if let Some(parallel) = cli.parallel {
        config.parallel = parallel;
    }
    config
}
