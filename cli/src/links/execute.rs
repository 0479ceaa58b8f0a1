//! Carrying out link creation, removal and pruning.
//!
//! Each function takes an already collected list (or collects one first via
//! [`plan`](super::plan()) or [`scan`](super::scan())) and then acts on it.
//! Per-entry failures are logged and counted; the batch always runs to the
//! end.
use std::path::Path;

use super::mapping::{ManagedLink, PlannedLink, SourceMapping};
use super::plan::{plan, validate_plan};
use super::scan::scan;
use super::{BatchStats, report_failure};
use crate::context::Context;
use crate::error::Result;
use crate::patterns::PatternSet;
use crate::resources::symlink::{SymlinkResource, occupied_error};
use crate::resources::{LinkState, ResourceChange};

/// Create every planned link.
///
/// Links that already point at their source are counted as skipped. A stale
/// symlink is replaced. A real file or directory at the target fails that
/// entry only.
#[must_use]
pub fn create_links(planned: &[PlannedLink], ctx: &Context) -> BatchStats {
    let mut stats = BatchStats::new();
    for link in planned {
        let resource = SymlinkResource::new(link.source.clone(), link.target.clone());
        let outcome = resource.current_state().and_then(|state| match state {
            LinkState::LinkedCorrectly => Ok(ResourceChange::AlreadyCorrect),
            LinkState::Occupied { is_dir } => Err(occupied_error(&link.target, is_dir)),
            LinkState::Absent | LinkState::LinkedElsewhere { .. } if ctx.dry_run => {
                ctx.log
                    .dry_run(&format!("would link {}", resource.description()));
                Ok(ResourceChange::Applied)
            }
            LinkState::Absent | LinkState::LinkedElsewhere { .. } => resource.apply(),
        });
        match outcome {
            Ok(ResourceChange::Applied) => {
                if !ctx.dry_run {
                    ctx.log.debug(&format!("linked {}", resource.description()));
                }
                stats.changed += 1;
            }
            Ok(ResourceChange::AlreadyCorrect) => stats.skipped += 1,
            Err(e) => {
                report_failure(ctx, &e);
                stats.failed += 1;
            }
        }
    }
    stats
}

/// Plan, validate and create the links from `source_dir` into `target_dir`.
///
/// Planned links that fail validation are reported and counted as failed
/// without being attempted; the rest are created.
///
/// # Errors
///
/// Returns an error if planning fails (missing source directory).
pub fn compute_and_create_links(
    source_dir: &Path,
    target_dir: &Path,
    patterns: &PatternSet,
    ctx: &Context,
) -> Result<BatchStats> {
    let planned = plan(source_dir, target_dir, patterns)?;
    ctx.log.debug(&format!(
        "{} links planned from {}",
        planned.len(),
        source_dir.display()
    ));

    let conflicts = validate_plan(&planned);
    for conflict in &conflicts {
        report_failure(ctx, &conflict.error);
    }
    let clean: Vec<PlannedLink> = planned
        .into_iter()
        .filter(|p| !conflicts.iter().any(|c| c.link.target == p.target))
        .collect();

    let mut stats = create_links(&clean, ctx);
    stats.failed += u32::try_from(conflicts.len()).unwrap_or(u32::MAX);
    Ok(stats)
}

/// Remove every given managed link.
///
/// An entry that vanished since the scan counts as skipped; an entry that
/// is no longer a symlink is refused and counted as failed.
#[must_use]
pub fn remove_links(links: &[ManagedLink], ctx: &Context) -> BatchStats {
    let mut stats = BatchStats::new();
    for link in links {
        if ctx.dry_run {
            ctx.log.dry_run(&format!("would remove {}", link.path.display()));
            stats.changed += 1;
            continue;
        }
        let resource = SymlinkResource::new(link.resolved.clone(), link.path.clone());
        match resource.remove() {
            Ok(ResourceChange::Applied) => {
                ctx.log.debug(&format!("removed {}", link.path.display()));
                stats.changed += 1;
            }
            Ok(ResourceChange::AlreadyCorrect) => stats.skipped += 1,
            Err(e) => {
                report_failure(ctx, &e);
                stats.failed += 1;
            }
        }
    }
    stats
}

/// Remove every link under `target_dir` managed by `source_dir`.
///
/// # Errors
///
/// Returns an error if `target_dir` cannot be scanned.
pub fn remove_managed_links(
    target_dir: &Path,
    source_dir: &Path,
    ctx: &Context,
) -> Result<BatchStats> {
    let links = scan(target_dir, &[SourceMapping::new(source_dir, target_dir)])?;
    Ok(remove_links(&links, ctx))
}

/// Remove only the broken links under `target_dir` managed by `source_dir`.
///
/// # Errors
///
/// Returns an error if `target_dir` cannot be scanned.
pub fn prune_broken(target_dir: &Path, source_dir: &Path, ctx: &Context) -> Result<BatchStats> {
    let broken: Vec<ManagedLink> = scan(target_dir, &[SourceMapping::new(source_dir, target_dir)])?
        .into_iter()
        .filter(|l| l.is_broken)
        .collect();
    Ok(remove_links(&broken, ctx))
}
