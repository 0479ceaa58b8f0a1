//! TOML configuration file parsing.
use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// `dotlink.toml` as written by the user, before any path expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    /// Config-file ignore patterns, applied after the built-in defaults.
    pub ignore: Vec<String>,
    /// `[[mapping]]` tables in configuration order.
    pub mapping: Vec<RawMapping>,
}

/// One `[[mapping]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawMapping {
    /// Repository subtree, relative to the repository root (`.` for the root).
    pub source: String,
    /// Destination directory; a leading `~` is the home directory.
    pub target: String,
}

/// Load and deserialize a TOML file.
///
/// A missing file deserializes as empty TOML, so every table falls back to
/// its default.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return toml::from_str("").context("Failed to create empty config");
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let raw: RawConfig = load_config(&dir.path().join("dotlink.toml")).unwrap();
        assert_eq!(raw, RawConfig::default());
    }

    #[test]
    fn parses_ignore_and_mappings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dotlink.toml");
        std::fs::write(
            &path,
            r#"
ignore = ["*.swp", "!keep.swp"]

[[mapping]]
source = "home"
target = "~"

[[mapping]]
source = "etc"
target = "/etc/local"
"#,
        )
        .unwrap();

        let raw: RawConfig = load_config(&path).unwrap();
        assert_eq!(raw.ignore, vec!["*.swp", "!keep.swp"]);
        assert_eq!(raw.mapping.len(), 2);
        assert_eq!(raw.mapping[1].target, "/etc/local");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dotlink.toml");
        std::fs::write(&path, "ignores = []\n").unwrap();

        let err = load_config::<RawConfig>(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse TOML config"));
    }
}
