//! Computing the links a source tree should produce.
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::mapping::PlannedLink;
use super::to_slash;
use crate::error::{DotlinkError, Result};
use crate::patterns::PatternSet;
use crate::resources::LinkState;
use crate::resources::symlink::{SymlinkResource, occupied_error};

/// Walk `source_tree` and return one [`PlannedLink`] per regular file that
/// `patterns` does not ignore, mirrored under `target_tree`.
///
/// Nothing is mutated. Directories are never planned; the executor creates
/// them as needed. Symlinks inside the source tree are not followed or
/// linked. An ignored directory's subtree is skipped outright unless a later
/// negation might re-include something below it.
///
/// # Errors
///
/// Returns a validation error if `source_tree` is missing or not a
/// directory.
pub fn plan(
    source_tree: &Path,
    target_tree: &Path,
    patterns: &PatternSet,
) -> Result<Vec<PlannedLink>> {
    match std::fs::metadata(source_tree) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(DotlinkError::validation(format!(
                "source {} is not a directory",
                source_tree.display()
            )));
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(DotlinkError::validation(format!(
                "source directory {} does not exist",
                source_tree.display()
            ))
            .with_hint("check the `source` of each [[mapping]] in dotlink.toml"));
        }
        Err(e) => return Err(DotlinkError::path("read source directory", source_tree, e)),
    }

    let mut planned = Vec::new();
    let mut walker = WalkDir::new(source_tree)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(source_tree) else {
            continue;
        };
        let rel_text = to_slash(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if patterns.can_skip_dir(&rel_text) {
                tracing::debug!("ignoring directory {rel_text}");
                walker.skip_current_dir();
            }
            continue;
        }
        if !file_type.is_file() {
            tracing::debug!("not linking non-regular file {rel_text}");
            continue;
        }
        if patterns.matches_entry(&rel_text, false) {
            tracing::debug!("ignoring {rel_text}");
            continue;
        }
        planned.push(PlannedLink {
            source: entry.path().to_path_buf(),
            target: target_tree.join(rel),
        });
    }
    Ok(planned)
}

/// A planned link that cannot be created safely.
#[derive(Debug)]
pub struct PlanConflict {
    /// The offending link.
    pub link: PlannedLink,
    /// Why it cannot be created.
    pub error: DotlinkError,
}

/// Check every planned link before execution.
///
/// A link is acceptable when its target is absent or a symlink (correct or
/// stale) and its nearest existing ancestor is a writable directory. Real
/// files and directories at the target are reported, never overwritten.
#[must_use]
pub fn validate_plan(planned: &[PlannedLink]) -> Vec<PlanConflict> {
    planned
        .iter()
        .filter_map(|link| {
            check_link(link).err().map(|error| PlanConflict {
                link: link.clone(),
                error,
            })
        })
        .collect()
}

fn check_link(link: &PlannedLink) -> Result<()> {
    let parent = nearest_existing_ancestor(&link.target)?;
    let resource = SymlinkResource::new(link.source.clone(), link.target.clone());
    match resource.current_state()? {
        LinkState::Occupied { is_dir } => Err(occupied_error(&link.target, is_dir)),
        state if state.is_actionable() => match parent {
            Some((dir, true)) => Err(DotlinkError::path(
                "create link in",
                &dir,
                io::Error::from(io::ErrorKind::PermissionDenied),
            )),
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

/// The closest ancestor of `target` that exists, with its read-only flag.
///
/// A missing component, or one that sits below a regular file, is walked
/// past; the first existing ancestor must be a directory.
fn nearest_existing_ancestor(target: &Path) -> Result<Option<(PathBuf, bool)>> {
    let mut ancestor = target.parent();
    while let Some(dir) = ancestor {
        match std::fs::metadata(dir) {
            Ok(meta) if !meta.is_dir() => {
                return Err(DotlinkError::validation(format!(
                    "cannot create {}: {} is not a directory",
                    target.display(),
                    dir.display()
                )));
            }
            Ok(meta) => return Ok(Some((dir.to_path_buf(), meta.permissions().readonly()))),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                ancestor = dir.parent();
            }
            Err(e) => return Err(DotlinkError::path("inspect", dir, e)),
        }
    }
    Ok(None)
}
