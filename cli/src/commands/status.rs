//! Status command implementation.
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{CommandSetup, tilde_path};
use crate::cli::GlobalOpts;
use crate::links::{ManagedLink, PlannedLink, find_managed_links, plan};
use crate::logging::{Logger, Outcome};
use crate::resources::LinkState;
use crate::resources::symlink::SymlinkResource;

/// What `status` found: the links that exist and the ones still to create.
#[derive(Debug, Default)]
pub struct StatusReport {
    /// Managed links across every mapping target, sorted by path.
    pub links: Vec<ManagedLink>,
    /// Planned links whose target is not yet a correct symlink.
    pub pending: Vec<PlannedLink>,
}

impl StatusReport {
    /// Number of broken managed links.
    #[must_use]
    pub fn broken(&self) -> usize {
        self.links.iter().filter(|l| l.is_broken).count()
    }
}

/// Run the status command.
///
/// # Errors
///
/// Returns an error if setup fails or a mapping target cannot be scanned.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let report = collect(&setup)?;
    setup.ctx.log.stage("Status");
    for line in render(&report, &setup.ctx.home) {
        setup.ctx.log.info(&line);
    }
    let outcome = if report.broken() > 0 {
        Outcome::Failed
    } else {
        Outcome::Ok
    };
    log.record("status", outcome, Some(&totals(&report)));
    log.print_summary();
    Ok(())
}

/// Scan every distinct mapping target and plan every mapping.
///
/// Each target is scanned once against all mappings, so a link is still
/// attributed to the first mapping that contains it. A mapping whose source
/// is missing is reported and contributes no pending links.
///
/// # Errors
///
/// Returns an error if a mapping target cannot be scanned.
pub fn collect(setup: &CommandSetup) -> Result<StatusReport> {
    let mappings = &setup.config.mappings;
    let mut targets: Vec<&PathBuf> = Vec::new();
    for mapping in mappings {
        if !targets.contains(&&mapping.target) {
            targets.push(&mapping.target);
        }
    }

    let mut report = StatusReport::default();
    for target in targets {
        if !target.is_dir() {
            setup
                .ctx
                .log
                .debug(&format!("skipping missing target {}", target.display()));
            continue;
        }
        report.links.extend(find_managed_links(target, mappings)?);
    }
    report.links.sort_by(|a, b| a.path.cmp(&b.path));
    report.links.dedup_by(|a, b| a.path == b.path);

    for mapping in mappings {
        let planned = match plan(&mapping.source, &mapping.target, &setup.config.patterns) {
            Ok(planned) => planned,
            Err(e) => {
                setup.ctx.log.warn(&e.to_string());
                continue;
            }
        };
        report.pending.extend(planned.into_iter().filter(|p| {
            !matches!(
                SymlinkResource::new(p.source.clone(), p.target.clone()).current_state(),
                Ok(LinkState::LinkedCorrectly)
            )
        }));
    }
    Ok(report)
}

/// Render the report as one line per link plus a totals line.
#[must_use]
pub fn render(report: &StatusReport, home: &Path) -> Vec<String> {
    let mut lines: Vec<String> = report
        .links
        .iter()
        .map(|l| {
            let state = if l.is_broken { "broken" } else { "linked" };
            format!(
                "{state:<8}{} -> {}",
                tilde_path(&l.path, home),
                tilde_path(&l.resolved, home)
            )
        })
        .collect();
    lines.extend(
        report
            .pending
            .iter()
            .map(|p| format!("{:<8}{}", "missing", tilde_path(&p.target, home))),
    );
    lines.push(totals(report));
    lines
}

fn totals(report: &StatusReport) -> String {
    format!(
        "{} linked, {} broken, {} not linked",
        report.links.len() - report.broken(),
        report.broken(),
        report.pending.len()
    )
}
