//! Prune command implementation.
use anyhow::Result;
use std::sync::Arc;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::links::{Action, BatchStats, prune_broken};
use crate::logging::Logger;

/// Run the prune command.
///
/// # Errors
///
/// Returns an error if setup fails, a mapping target cannot be scanned, or
/// any broken link could not be removed.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let stats = execute(&setup)?;
    super::finish(log, stats)
}

/// Remove the broken managed links of every mapping.
///
/// # Errors
///
/// Returns an error if a mapping target cannot be scanned.
pub fn execute(setup: &CommandSetup) -> Result<BatchStats> {
    let ctx = &setup.ctx;
    let mut total = BatchStats::new();
    for mapping in &setup.config.mappings {
        let label = setup.label(mapping);
        ctx.log.stage(&format!("Pruning {label}"));
        let stats = prune_broken(&mapping.target, &mapping.source, ctx)?;
        ctx.log.info(&stats.summary(Action::Prune, ctx.dry_run));
        super::record(&*ctx.log, &label, stats, Action::Prune, ctx.dry_run);
        total += stats;
    }
    Ok(total)
}

#[cfg(all(test, unix))]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::commands::link;
    use crate::commands::test_helpers::Workspace;

    #[test]
    fn prunes_only_links_to_deleted_files() {
        let ws = Workspace::new();
        ws.repo_file(".keep", "k");
        let gone = ws.repo_file(".gone", "g");
        let (setup, log) = ws.setup(false);
        link::execute(&setup).unwrap();
        std::fs::remove_file(gone).unwrap();

        let stats = execute(&setup).unwrap();
        assert_eq!(stats.changed, 1);
        assert!(ws.home.join(".keep").is_symlink());
        assert!(ws.home.join(".gone").symlink_metadata().is_err());
        assert_eq!(log.at("info").last().unwrap(), "1 pruned");
    }
}
