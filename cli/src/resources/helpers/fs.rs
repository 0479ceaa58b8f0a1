//! File-system resource helpers.
use std::path::Path;

use crate::error::{DotlinkError, Result};
use crate::operations::FileSystemOps;

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| DotlinkError::path("create parent", parent, e))?;
    }
    Ok(())
}

/// Move `from` to `to`, falling back to copy-verify-delete when a plain
/// rename fails (for example across filesystems).
///
/// Only regular files are moved; directories are adopted file by file.
/// Verification re-stats both paths and compares sizes before the original
/// is deleted.
///
/// # Errors
///
/// Returns an error if both the rename and the fallback fail. A failed
/// fallback removes its partial copy and leaves `from` untouched.
pub fn move_path(ops: &dyn FileSystemOps, from: &Path, to: &Path) -> Result<()> {
    let Err(rename_err) = ops.rename(from, to) else {
        return Ok(());
    };
    tracing::debug!(
        "rename {} -> {} failed ({rename_err}), copying instead",
        from.display(),
        to.display()
    );

    if let Err(e) = ops.copy_file(from, to) {
        let _ = std::fs::remove_file(to);
        return Err(DotlinkError::path("copy", from, e));
    }
    let copied = std::fs::metadata(to).map_err(|e| DotlinkError::path("verify copy", to, e))?;
    let original =
        std::fs::metadata(from).map_err(|e| DotlinkError::path("verify original", from, e))?;
    if copied.len() != original.len() {
        let _ = std::fs::remove_file(to);
        return Err(DotlinkError::validation(format!(
            "copy of {} is {} bytes, expected {}",
            from.display(),
            copied.len(),
            original.len()
        )));
    }
    std::fs::remove_file(from).map_err(|e| DotlinkError::path("remove original", from, e))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::SystemFileSystemOps;
    use crate::operations::test_helpers::{Fail, failing};

    #[test]
    fn ensure_parent_dir_creates_missing_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("file.txt");
        ensure_parent_dir(&nested).unwrap();
        assert!(dir.path().join("a").join("b").exists());
    }

    #[test]
    fn move_path_renames() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("from.txt");
        let to = dir.path().join("to.txt");
        std::fs::write(&from, "payload").unwrap();

        move_path(&SystemFileSystemOps, &from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "payload");
    }

    #[test]
    fn move_path_falls_back_to_copy_for_files() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("from.txt");
        let to = dir.path().join("to.txt");
        std::fs::write(&from, "payload").unwrap();

        let ops = failing(Fail::Rename);
        move_path(&ops, &from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "payload");
    }

    #[test]
    fn failed_fallback_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("from.txt");
        let to = dir.path().join("to.txt");
        std::fs::write(&from, "payload").unwrap();

        let mut ops = crate::operations::MockFileSystemOps::new();
        ops.expect_rename()
            .returning(|_, _| Err(std::io::Error::other("no rename")));
        ops.expect_copy_file()
            .returning(|_, _| Err(std::io::Error::other("disk full")));

        assert!(move_path(&ops, &from, &to).is_err());
        assert_eq!(std::fs::read_to_string(&from).unwrap(), "payload");
        assert!(!to.exists());
    }
}
