//! Link command implementation.
use anyhow::Result;
use std::sync::Arc;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::links::{Action, BatchStats, compute_and_create_links};
use crate::logging::Logger;

/// Run the link command.
///
/// # Errors
///
/// Returns an error if setup fails, a mapping source is missing, or any
/// link could not be created.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let stats = execute(&setup)?;
    super::finish(log, stats)
}

/// Plan, validate and create the links of every mapping in order.
///
/// # Errors
///
/// Returns an error if a mapping source is missing or not a directory.
/// Per-link failures are counted, not returned.
pub fn execute(setup: &CommandSetup) -> Result<BatchStats> {
    let ctx = &setup.ctx;
    let mut total = BatchStats::new();
    for mapping in &setup.config.mappings {
        let label = setup.label(mapping);
        ctx.log.stage(&format!("Linking {label}"));
        let stats =
            compute_and_create_links(&mapping.source, &mapping.target, &setup.config.patterns, ctx)?;
        ctx.log.info(&stats.summary(Action::Link, ctx.dry_run));
        super::record(&*ctx.log, &label, stats, Action::Link, ctx.dry_run);
        total += stats;
    }
    Ok(total)
}
