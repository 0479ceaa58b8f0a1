//! Top-level subcommand orchestration.
//!
//! Each command resolves the repository, loads its configuration into a
//! [`CommandSetup`], runs one link-engine batch per mapping, records a
//! summary entry per batch and fails if any entry failed.
pub mod adopt;
pub mod link;
pub mod orphan;
pub mod prune;
pub mod status;
pub mod unlink;
pub mod version;

use anyhow::{Context as _, Result};
use std::path::Path;
use std::sync::Arc;

use crate::cli::GlobalOpts;
use crate::config::{self, Config, validation};
use crate::context::Context;
use crate::links::{Action, BatchStats, SourceMapping};
use crate::logging::{Log, Logger, Outcome};
use crate::platform;

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// Loaded configuration.
    pub config: Config,
    /// Request-scoped context handed to the link engine.
    pub ctx: Context,
}

impl CommandSetup {
    /// Resolve the repository root and home directory, then load the
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory or repository cannot be
    /// determined, or the configuration fails to load.
    pub fn init(global: &GlobalOpts, log: &Arc<Logger>) -> Result<Self> {
        let log: Arc<dyn Log> = Arc::<Logger>::clone(log);
        let ctx = Context::new(log, global.dry_run)?;
        let cwd = std::env::current_dir().context("reading current directory")?;
        let root = config::resolve_root(global.repo.as_deref(), &cwd, &ctx.home)?;
        Self::load(&root, &global.ignore, ctx)
    }

    /// Load the configuration at `root` into a setup around `ctx`.
    ///
    /// Validation warnings are logged and never fatal.
    ///
    /// # Errors
    ///
    /// Returns an error if `dotlink.toml` or `.dotlinkignore` cannot be read
    /// or parsed, or if a pattern is invalid.
    pub fn load(root: &Path, extra_ignore: &[String], ctx: Context) -> Result<Self> {
        ctx.log.stage("Loading configuration");
        ctx.log.info(&format!("repository: {}", root.display()));
        ctx.log.debug(&format!("platform: {}", platform::Os::detect()));
        let config = Config::load(root, &ctx.home, extra_ignore)?;
        ctx.log.debug(&format!("{} mappings", config.mappings.len()));
        ctx.log.debug(&format!("{} ignore rules", config.patterns.len()));
        if ctx.dry_run {
            ctx.log.info("dry run: nothing will be changed");
        }

        let warnings = validation::validate_all(&config);
        if !warnings.is_empty() {
            ctx.log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                ctx.log.warn(&format!(
                    "  {} [{}]: {}",
                    warning.source, warning.item, warning.message
                ));
            }
        }

        Ok(Self { config, ctx })
    }

    /// Short label for a mapping in stage headers and summary entries.
    #[must_use]
    pub fn label(&self, mapping: &SourceMapping) -> String {
        let source = mapping
            .source
            .strip_prefix(&self.config.root)
            .ok()
            .filter(|rel| rel.components().next().is_some())
            .map_or_else(|| ".".to_string(), |rel| rel.display().to_string());
        format!("{source} -> {}", tilde_path(&mapping.target, &self.ctx.home))
    }
}

/// Record one batch in the summary.
pub(crate) fn record(log: &dyn Log, name: &str, stats: BatchStats, action: Action, dry_run: bool) {
    let outcome = if stats.failed > 0 {
        Outcome::Failed
    } else if stats.changed == 0 {
        Outcome::Skipped
    } else if dry_run {
        Outcome::DryRun
    } else {
        Outcome::Ok
    };
    log.record(name, outcome, Some(&stats.summary(action, dry_run)));
}

/// Print the summary and bail if any entry of `stats` failed.
///
/// # Errors
///
/// Returns an error if one or more entries failed.
pub fn finish(log: &Logger, stats: BatchStats) -> Result<()> {
    log.print_summary();
    if stats.failed > 0 {
        anyhow::bail!("{} operation(s) failed", stats.failed);
    }
    Ok(())
}

/// `path` with a leading home directory shown as `~`.
#[must_use]
pub fn tilde_path(path: &Path, home: &Path) -> String {
    match path.strip_prefix(home) {
        Ok(rel) if rel.components().next().is_none() => "~".to_string(),
        Ok(rel) => format!("~/{}", crate::links::to_slash(rel)),
        Err(_) => path.display().to_string(),
    }
}
