//! Shared CLI utilities.

use std::path::{Path, PathBuf};

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

/// `<dir>/<stem><suffix>` next to `path`.
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!("{stem}{suffix}"))
}

/// Directory searched for a config file: the one holding `path`.
pub fn config_anchor(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_csv_trims_and_drops_empty_parts() {
        assert_eq!(
            parse_csv(&Some(" relato, ,hecho ".to_string())),
            Some(vec!["relato".to_string(), "hecho".to_string()])
        );
        assert_eq!(parse_csv(&None), None);
    }

    #[test]
    fn sibling_paths_share_directory_and_stem() {
        assert_eq!(
            sibling_path(Path::new("datos/hechos.xlsx"), "_clasificado.xlsx"),
            PathBuf::from("datos/hechos_clasificado.xlsx")
        );
        assert_eq!(config_anchor(Path::new("hechos.xlsx")), PathBuf::from("."));
        assert_eq!(config_anchor(Path::new("datos/hechos.xlsx")), PathBuf::from("datos"));
    }
}
