//! Repository configuration: root discovery, `dotlink.toml`, and the layered
//! ignore-pattern set.
pub mod toml_loader;
pub mod validation;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::error::DotlinkError;
use crate::links::SourceMapping;
use crate::links::mapping::normalize_lexically;
use crate::patterns::{DEFAULT_PATTERNS, PatternSet};

/// Name of the optional configuration file at the repository root.
pub const CONFIG_FILE: &str = "dotlink.toml";

/// Name of the optional ignore file at the repository root.
pub const IGNORE_FILE: &str = ".dotlinkignore";

/// Directory under the home directory tried when nothing else names a
/// repository.
const DEFAULT_REPO_DIR: &str = "dotfiles";

/// Fully resolved configuration for one command invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute repository root.
    pub root: PathBuf,
    /// Mappings in configuration order; the first one that contains a link
    /// owns it.
    pub mappings: Vec<SourceMapping>,
    /// Built-in, config, ignore-file and command-line patterns, in that order.
    pub patterns: PatternSet,
}

impl Config {
    /// Load `dotlink.toml` and `.dotlinkignore` from `root`.
    ///
    /// `extra_ignore` are the command-line patterns; they are evaluated last
    /// so they override everything else.
    ///
    /// # Errors
    ///
    /// Returns an error if either file exists but cannot be read or parsed,
    /// or if any pattern has invalid glob syntax.
    pub fn load(root: &Path, home: &Path, extra_ignore: &[String]) -> Result<Self> {
        let raw: toml_loader::RawConfig =
            toml_loader::load_config(&root.join(CONFIG_FILE)).context("loading dotlink.toml")?;

        let mappings = if raw.mapping.is_empty() {
            vec![SourceMapping::new(root, home)]
        } else {
            raw.mapping
                .iter()
                .map(|m| {
                    SourceMapping::new(
                        normalize_lexically(&root.join(&m.source)),
                        expand_tilde(&m.target, home),
                    )
                })
                .collect()
        };

        let ignore_file = root.join(IGNORE_FILE);
        let ignore_text = if ignore_file.is_file() {
            std::fs::read_to_string(&ignore_file)
                .with_context(|| format!("reading {}", ignore_file.display()))?
        } else {
            String::new()
        };

        let patterns = PatternSet::compile(DEFAULT_PATTERNS)?
            .extend(PatternSet::compile(&raw.ignore).context("compiling dotlink.toml ignore")?)
            .extend(PatternSet::parse(&ignore_text).context("compiling .dotlinkignore")?)
            .extend(PatternSet::compile(extra_ignore).context("compiling --ignore")?);

        Ok(Self {
            root: root.to_path_buf(),
            mappings,
            patterns,
        })
    }
}

/// Expand a leading `~` (alone or followed by a separator) to `home`.
#[must_use]
pub fn expand_tilde(raw: &str, home: &Path) -> PathBuf {
    if raw == "~" {
        return home.to_path_buf();
    }
    match raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        Some(rest) => home.join(rest),
        None => PathBuf::from(raw),
    }
}

/// Find the repository root.
///
/// Precedence: `explicit` (the `--repo` flag or `DOTLINK_REPO`), then `cwd`
/// when it holds a `dotlink.toml`, then `~/dotfiles` when it holds one.
///
/// # Errors
///
/// Returns a validation error when an explicit root is not a directory or
/// when no candidate holds a configuration file.
pub fn resolve_root(explicit: Option<&Path>, cwd: &Path, home: &Path) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        let dir = std::path::absolute(dir)
            .with_context(|| format!("resolving {}", dir.display()))?;
        if !dir.is_dir() {
            return Err(DotlinkError::validation(format!(
                "repository {} is not a directory",
                dir.display()
            ))
            .into());
        }
        return Ok(normalize_lexically(&dir));
    }

    let fallback = home.join(DEFAULT_REPO_DIR);
    [cwd, fallback.as_path()]
        .into_iter()
        .find(|dir| dir.join(CONFIG_FILE).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            DotlinkError::validation("no dotfiles repository found")
                .with_hint(format!(
                    "pass --repo, set DOTLINK_REPO, or run from a directory containing {CONFIG_FILE}"
                ))
                .into()
        })
}
