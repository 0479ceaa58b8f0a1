//! Orphaning: the inverse of adoption.
//!
//! A managed link is replaced by a real copy of its repository file and the
//! repository copy is removed, through git when possible.
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::mapping::{
    ManagedLink, SourceMapping, absolutize_link_target, canonicalize_lenient, owning_mapping,
    resolve_location,
};
use super::scan::scan;
use super::{BatchStats, report_failure};
use crate::context::Context;
use crate::error::{ConflictKind, DotlinkError, Result};
use crate::resources::symlink::remove_symlink;

/// Upper bound on the `git rm` call before falling back to a plain delete.
const GIT_RM_TIMEOUT: Duration = Duration::from_secs(10);

/// Orphan a managed link, or every managed link below a directory.
///
/// # Errors
///
/// For a single link, returns the orphaning error: the path is not a
/// symlink, is not managed by any of `mappings`, its repository file was
/// deleted, or the copy-back failed. A directory without managed links is a
/// validation error; per-link failures inside a directory are logged and
/// counted.
pub fn orphan(path: &Path, mappings: &[SourceMapping], ctx: &Context) -> Result<BatchStats> {
    let location = resolve_location(path)?;
    let meta = std::fs::symlink_metadata(&location)
        .map_err(|e| DotlinkError::path("orphan", &location, e))?;

    if meta.is_dir() {
        let links = scan(&location, mappings)?;
        if links.is_empty() {
            return Err(DotlinkError::validation(format!(
                "no managed links under {}",
                location.display()
            )));
        }
        let mut stats = BatchStats::new();
        for link in &links {
            match orphan_link(link, ctx) {
                Ok(()) => stats.changed += 1,
                Err(e) => {
                    report_failure(ctx, &e);
                    stats.failed += 1;
                }
            }
        }
        return Ok(stats);
    }

    if !meta.file_type().is_symlink() {
        return Err(DotlinkError::conflict(ConflictKind::NotASymlink, &location)
            .with_hint("only links created by dotlink can be orphaned"));
    }
    let link = managed_link(&location, mappings)?;
    orphan_link(&link, ctx)?;
    Ok(BatchStats {
        changed: 1,
        ..BatchStats::new()
    })
}

/// Orphan several paths; per-path failures are logged and counted.
///
/// # Errors
///
/// Returns a validation error when `paths` is empty.
pub fn orphan_paths(
    paths: &[PathBuf],
    mappings: &[SourceMapping],
    ctx: &Context,
) -> Result<BatchStats> {
    if paths.is_empty() {
        return Err(DotlinkError::validation("no paths specified")
            .with_hint("pass one or more links or directories to orphan"));
    }
    let mut stats = BatchStats::new();
    for path in paths {
        match orphan(path, mappings, ctx) {
            Ok(s) => stats += s,
            Err(e) => {
                report_failure(ctx, &e);
                stats.failed += 1;
            }
        }
    }
    Ok(stats)
}

fn managed_link(location: &Path, mappings: &[SourceMapping]) -> Result<ManagedLink> {
    let stored = std::fs::read_link(location)
        .map_err(|e| DotlinkError::path("read link", location, e))?;
    let resolved = canonicalize_lenient(&absolutize_link_target(location, &stored));
    let mapping = owning_mapping(mappings, &resolved).ok_or_else(|| {
        DotlinkError::conflict(ConflictKind::NotManaged, location).with_hint(format!(
            "it points to {}, outside every configured mapping",
            stored.display()
        ))
    })?;
    Ok(ManagedLink {
        path: location.to_path_buf(),
        is_broken: std::fs::metadata(&resolved).is_err(),
        target: stored,
        resolved,
        mapping: mapping.clone(),
    })
}

/// Replace one managed link with a real copy of its repository file.
fn orphan_link(link: &ManagedLink, ctx: &Context) -> Result<()> {
    let meta = match std::fs::metadata(&link.resolved) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(DotlinkError::DeletedInRepo {
                link: link.path.clone(),
                target: link.resolved.clone(),
            });
        }
        Err(e) => return Err(DotlinkError::path("inspect", &link.resolved, e)),
    };
    if meta.is_dir() {
        return Err(DotlinkError::validation(format!(
            "{} links to a directory",
            link.path.display()
        ))
        .with_hint("orphan the files inside it instead"));
    }
    if ctx.dry_run {
        ctx.log.dry_run(&format!(
            "would orphan {} (from {})",
            link.path.display(),
            link.resolved.display()
        ));
        return Ok(());
    }

    let ops = &*ctx.fs_ops;
    let permissions = meta.permissions();
    remove_symlink(&link.path)?;

    if let Err(e) = ops.copy_file(&link.resolved, &link.path) {
        let original = DotlinkError::path("copy back", &link.resolved, e);
        let _ = std::fs::remove_file(&link.path);
        return match ops.symlink(&link.target, &link.path) {
            Ok(()) => {
                ctx.log
                    .warn(&format!("restored link {} after failed copy", link.path.display()));
                Err(original)
            }
            Err(re) => Err(DotlinkError::RollbackFailed {
                path: link.path.clone(),
                original: Box::new(original),
                rollback: Box::new(DotlinkError::link(&link.target, &link.path, re)),
            }),
        };
    }
    std::fs::set_permissions(&link.path, permissions)
        .map_err(|e| DotlinkError::path("restore permissions of", &link.path, e))?;

    remove_from_repository(&link.resolved, ctx);
    ctx.log.debug(&format!("orphaned {}", link.path.display()));
    Ok(())
}

/// Delete `file` from the repository, through `git rm` when git is
/// available. Failures here never fail the orphan.
fn remove_from_repository(file: &Path, ctx: &Context) {
    if let (Some(dir), Some(name)) = (file.parent(), file.file_name().and_then(|n| n.to_str()))
        && ctx.executor.which("git")
    {
        match ctx.executor.run_in_with_timeout(
            dir,
            "git",
            &["rm", "-f", "-q", "--", name],
            GIT_RM_TIMEOUT,
        ) {
            Ok(_) => ctx.log.debug(&format!("git rm {}", file.display())),
            Err(e) => ctx
                .log
                .debug(&format!("git rm failed ({e:#}), deleting directly")),
        }
    }
    if std::fs::symlink_metadata(file).is_ok()
        && let Err(e) = std::fs::remove_file(file)
    {
        ctx.log.warn(&format!(
            "could not remove {} from the repository: {e}",
            file.display()
        ));
    }
}
