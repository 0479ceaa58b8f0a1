use std::path::Path;

use super::Config;
use crate::links::mapping::is_strict_descendant;

/// A validation warning detected during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The configuration source (e.g., "dotlink.toml").
    pub source: String,
    /// The specific item that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Create a warning.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

/// Check the configured mappings; never fatal.
///
/// Overlapping sources are reported but kept: the first mapping that
/// contains a link still owns it.
#[must_use]
pub fn validate_all(config: &Config) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let item = |path: &Path| path.display().to_string();

    for (index, mapping) in config.mappings.iter().enumerate() {
        match std::fs::metadata(&mapping.source) {
            Ok(meta) if !meta.is_dir() => warnings.push(ValidationWarning::new(
                super::CONFIG_FILE,
                item(&mapping.source),
                "mapping source is not a directory",
            )),
            Ok(_) => {}
            Err(_) => warnings.push(ValidationWarning::new(
                super::CONFIG_FILE,
                item(&mapping.source),
                "mapping source does not exist",
            )),
        }

        if !mapping.target.is_absolute() {
            warnings.push(ValidationWarning::new(
                super::CONFIG_FILE,
                item(&mapping.target),
                "mapping target is not absolute (use an absolute path or ~)",
            ));
        }

        let earlier = config.mappings.iter().take(index);
        for other in earlier {
            if other.source == mapping.source
                || is_strict_descendant(&other.source, &mapping.source)
                || is_strict_descendant(&mapping.source, &other.source)
            {
                warnings.push(ValidationWarning::new(
                    super::CONFIG_FILE,
                    item(&mapping.source),
                    format!(
                        "mapping source overlaps {}; links are owned by the first match",
                        other.source.display()
                    ),
                ));
            }
        }
    }

    warnings
}
