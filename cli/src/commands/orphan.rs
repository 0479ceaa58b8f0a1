//! Orphan command implementation.
use anyhow::Result;
use std::sync::Arc;

use super::CommandSetup;
use crate::cli::{GlobalOpts, OrphanOpts};
use crate::links::{Action, BatchStats, orphan_paths};
use crate::logging::Logger;

/// Run the orphan command.
///
/// # Errors
///
/// Returns an error if setup fails or any path could not be orphaned.
pub fn run(global: &GlobalOpts, opts: &OrphanOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let stats = execute(&setup, opts)?;
    super::finish(log, stats)
}

/// Orphan every given link or directory of links.
///
/// # Errors
///
/// Returns an error if no paths were given.
pub fn execute(setup: &CommandSetup, opts: &OrphanOpts) -> Result<BatchStats> {
    let ctx = &setup.ctx;
    ctx.log.stage("Orphaning");
    let stats = orphan_paths(&opts.paths, &setup.config.mappings, ctx)?;
    ctx.log.info(&stats.summary(Action::Orphan, ctx.dry_run));
    super::record(&*ctx.log, "orphan", stats, Action::Orphan, ctx.dry_run);
    Ok(stats)
}
