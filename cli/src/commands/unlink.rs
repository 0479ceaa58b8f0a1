//! Unlink command implementation.
use anyhow::Result;
use std::sync::Arc;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::links::{Action, BatchStats, remove_managed_links};
use crate::logging::Logger;

/// Run the unlink command.
///
/// # Errors
///
/// Returns an error if setup fails, a mapping target cannot be scanned, or
/// any link could not be removed.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let stats = execute(&setup)?;
    super::finish(log, stats)
}

/// Remove every managed link of every mapping.
///
/// # Errors
///
/// Returns an error if a mapping target cannot be scanned.
pub fn execute(setup: &CommandSetup) -> Result<BatchStats> {
    let ctx = &setup.ctx;
    let mut total = BatchStats::new();
    for mapping in &setup.config.mappings {
        let label = setup.label(mapping);
        ctx.log.stage(&format!("Unlinking {label}"));
        let stats = remove_managed_links(&mapping.target, &mapping.source, ctx)?;
        ctx.log.info(&stats.summary(Action::Unlink, ctx.dry_run));
        super::record(&*ctx.log, &label, stats, Action::Unlink, ctx.dry_run);
        total += stats;
    }
    Ok(total)
}
