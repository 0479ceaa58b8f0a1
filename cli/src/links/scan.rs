//! Discovery of existing managed links.
//!
//! The scanner is the single source of truth for status, unlink, prune and
//! orphan: it walks a target tree and reports every symlink whose resolved
//! target lies strictly inside one of the configured mapping sources.
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::mapping::{
    ManagedLink, SourceMapping, absolutize_link_target, canonicalize_lenient,
    is_strict_descendant,
};
use crate::error::{DotlinkError, Result};
use crate::platform::is_reserved_dir_name;

/// Walk `root` and return every symlink managed by one of `mappings`.
///
/// Mapping order matters: a link is attributed to the first mapping whose
/// source contains its resolved target. Symlinks that resolve elsewhere are
/// omitted. OS-reserved directories and any mapping source that lies inside
/// `root` are skipped with their whole subtree. Unreadable entries are
/// logged and skipped.
///
/// # Errors
///
/// Fails only when `root` itself cannot be read or is not a directory.
pub fn scan(root: &Path, mappings: &[SourceMapping]) -> Result<Vec<ManagedLink>> {
    let meta = std::fs::metadata(root).map_err(|e| DotlinkError::path("scan", root, e))?;
    if !meta.is_dir() {
        return Err(DotlinkError::validation(format!(
            "cannot scan {}: not a directory",
            root.display()
        )));
    }

    let sources: Vec<PathBuf> = mappings.iter().map(SourceMapping::canonical_source).collect();
    let canonical_root = canonicalize_lenient(root);
    let skipped_sources: Vec<PathBuf> = sources
        .iter()
        .filter_map(|s| s.strip_prefix(&canonical_root).ok())
        .filter(|rel| rel.components().next().is_some())
        .map(|rel| root.join(rel))
        .collect();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !should_skip_dir(e, &skipped_sources));

    let mut links = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                let io = err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("walk failed"));
                return Err(DotlinkError::path("scan", root, io));
            }
            Err(err) => {
                tracing::warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.path_is_symlink() {
            continue;
        }
        let stored = match std::fs::read_link(entry.path()) {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!("cannot read link {}: {err}", entry.path().display());
                continue;
            }
        };
        let resolved = canonicalize_lenient(&absolutize_link_target(entry.path(), &stored));
        let Some(mapping) = mappings
            .iter()
            .zip(&sources)
            .find(|(_, source)| is_strict_descendant(source, &resolved))
            .map(|(mapping, _)| mapping)
        else {
            continue;
        };
        let is_broken = std::fs::metadata(&resolved).is_err();
        links.push(ManagedLink {
            path: entry.path().to_path_buf(),
            target: stored,
            resolved,
            is_broken,
            mapping: mapping.clone(),
        });
    }
    Ok(links)
}

/// Alias of [`scan`] named after the operation the CLI exposes.
///
/// # Errors
///
/// See [`scan`].
pub fn find_managed_links(
    target_dir: &Path,
    mappings: &[SourceMapping],
) -> Result<Vec<ManagedLink>> {
    scan(target_dir, mappings)
}

fn should_skip_dir(entry: &DirEntry, skipped_sources: &[PathBuf]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let reserved = entry
        .file_name()
        .to_str()
        .is_some_and(is_reserved_dir_name);
    reserved || skipped_sources.iter().any(|s| s == entry.path())
}
