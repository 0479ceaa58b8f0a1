//! Adopt command implementation.
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use super::CommandSetup;
use crate::cli::{AdoptOpts, GlobalOpts};
use crate::error::DotlinkError;
use crate::links::mapping::{canonicalize_lenient, is_strict_descendant, resolve_location};
use crate::links::{Action, BatchStats, SourceMapping, adopt_paths};
use crate::logging::Logger;

/// Run the adopt command.
///
/// # Errors
///
/// Returns an error if setup fails, no mapping covers the paths, or any
/// path could not be adopted.
pub fn run(global: &GlobalOpts, opts: &AdoptOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let stats = execute(&setup, opts)?;
    super::finish(log, stats)
}

/// Adopt every path into the first mapping whose target contains them all.
///
/// # Errors
///
/// Returns an error if no mapping target contains every path, the package
/// name is invalid, or no paths were given.
pub fn execute(setup: &CommandSetup, opts: &AdoptOpts) -> Result<BatchStats> {
    let ctx = &setup.ctx;
    let mapping = select_mapping(&setup.config.mappings, &opts.paths)?;
    let label = setup.label(mapping);
    ctx.log.stage(&format!("Adopting into {label}"));
    let stats = adopt_paths(
        &opts.paths,
        mapping,
        opts.package.as_deref(),
        &setup.config.patterns,
        ctx,
    )?;
    ctx.log.info(&stats.summary(Action::Adopt, ctx.dry_run));
    super::record(&*ctx.log, &label, stats, Action::Adopt, ctx.dry_run);
    Ok(stats)
}

fn select_mapping<'a>(
    mappings: &'a [SourceMapping],
    paths: &[PathBuf],
) -> Result<&'a SourceMapping, DotlinkError> {
    let locations = paths
        .iter()
        .map(|p| resolve_location(p))
        .collect::<Result<Vec<_>, _>>()?;
    mappings
        .iter()
        .find(|m| {
            let target = canonicalize_lenient(&m.target);
            locations.iter().all(|l| is_strict_descendant(&target, l))
        })
        .ok_or_else(|| {
            DotlinkError::validation("no mapping target contains every given path")
                .with_hint("adopt paths from one mapping target at a time")
        })
}
