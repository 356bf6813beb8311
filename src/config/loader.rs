//! Config file loading

use crate::domain::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Section name honored when the settings live in a shared file.
const SECTION: &str = "incident-classifier";

const CANDIDATES: [&str; 4] = [
    "incident-classifier.toml",
    ".incident-classifier.toml",
    "incident-classifier.yml",
    "incident-classifier.yaml",
];

/// Load the explicit config file, or the first one discovered in `search_dir`.
///
/// A broken explicit file is an error. A broken discovered file only logs a
/// warning and yields the defaults.
pub fn load_config(search_dir: &Path, config_path: Option<&Path>) -> Result<Config> {
    let config_path_provided = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(search_dir),
    };

    let Some(config_file) = discovered else {
        return Ok(Config::default());
    };

    let parsed = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))
        .and_then(|content| parse_config(&content, &config_file));

    let mut config = match parsed {
        Ok(config) => config,
        Err(e) if !config_path_provided => {
            tracing::warn!("Failed to parse auto-discovered config {}: {:#}", config_file.display(), e);
            return Ok(Config::default());
        }
        Err(e) => return Err(e),
    };

    // Rule tables are resolved next to the file that names them.
    if let (Some(rules), Some(dir)) = (config.rules.as_mut(), config_file.parent()) {
        if rules.is_relative() {
            *rules = dir.join(&*rules);
        }
    }

    tracing::debug!(path = %config_file.display(), "loaded config");
    Ok(config)
}

fn parse_config(content: &str, config_file: &Path) -> Result<Config> {
    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "toml" => parse_toml_config(content, config_file),
        "yaml" | "yml" => parse_yaml_config(content, config_file),
        other => anyhow::bail!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        ),
    }
}

/// Parse TOML config, honoring a nested [incident-classifier] section.
fn parse_toml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;

    let config_val = match raw.get(SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    config_val.try_into().with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

/// Parse YAML config, honoring a nested incident-classifier section.
fn parse_yaml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))?;

    let config_val = match raw.get(SECTION) {
        Some(nested) => nested.clone(),
        // An empty file parses as null.
        None if raw.is_null() => return Ok(Config::default()),
        None => raw,
    };

    serde_yaml::from_value(config_val)
        .with_context(|| format!("Invalid YAML config: {}", config_file.display()))
}

fn discover_config(search_dir: &Path) -> Option<PathBuf> {
    CANDIDATES.iter().map(|candidate| search_dir.join(candidate)).find(|path| path.exists())
}
