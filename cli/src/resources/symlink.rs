//! Symlink resource.
use std::io;
use std::path::{Path, PathBuf};

use super::{LinkState, ResourceChange};
use crate::error::{ConflictKind, DotlinkError, Result};

/// A symlink that can be classified, created and removed idempotently.
#[derive(Debug, Clone)]
pub struct SymlinkResource {
    /// The source file (what the symlink points to).
    pub source: PathBuf,
    /// The target path (where the symlink will be created).
    pub target: PathBuf,
}

impl SymlinkResource {
    /// Create a new symlink resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self { source, target }
    }

    /// Human-readable description of this resource.
    #[must_use]
    pub fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    /// Classify what currently occupies the target path.
    ///
    /// # Errors
    ///
    /// Returns an error if the target exists but cannot be inspected.
    pub fn current_state(&self) -> Result<LinkState> {
        let meta = match std::fs::symlink_metadata(&self.target) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LinkState::Absent),
            Err(e) => return Err(DotlinkError::path("inspect", &self.target, e)),
        };

        if meta.file_type().is_symlink() {
            let existing = std::fs::read_link(&self.target)
                .map_err(|e| DotlinkError::path("read link", &self.target, e))?;
            return Ok(if paths_equal(&existing, &self.source) {
                LinkState::LinkedCorrectly
            } else {
                LinkState::LinkedElsewhere { current: existing }
            });
        }

        Ok(LinkState::Occupied {
            is_dir: meta.is_dir(),
        })
    }

    /// Bring the target into the linked state.
    ///
    /// A stale symlink is replaced; an occupied target is refused with a
    /// [`DotlinkError::Conflict`] pointing the user at `adopt`.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is occupied, or if a parent directory,
    /// the stale link or the new link cannot be written.
    pub fn apply(&self) -> Result<ResourceChange> {
        match self.current_state()? {
            LinkState::LinkedCorrectly => Ok(ResourceChange::AlreadyCorrect),
            LinkState::Occupied { is_dir } => Err(occupied_error(&self.target, is_dir)),
            LinkState::LinkedElsewhere { .. } => {
                remove_symlink(&self.target)?;
                self.create()
            }
            LinkState::Absent => self.create(),
        }
    }

    /// Remove the target if, and only if, it is a symlink.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is not a symlink or cannot be removed.
    pub fn remove(&self) -> Result<ResourceChange> {
        match self.current_state()? {
            LinkState::Absent => Ok(ResourceChange::AlreadyCorrect),
            LinkState::Occupied { .. } => Err(DotlinkError::conflict(
                ConflictKind::NotASymlink,
                &self.target,
            )),
            LinkState::LinkedCorrectly | LinkState::LinkedElsewhere { .. } => {
                remove_symlink(&self.target)?;
                Ok(ResourceChange::Applied)
            }
        }
    }

    fn create(&self) -> Result<ResourceChange> {
        super::helpers::fs::ensure_parent_dir(&self.target)?;
        create_symlink(&self.source, &self.target)?;
        Ok(ResourceChange::Applied)
    }
}

/// The conflict reported when a real file or directory sits where a link
/// should go.
#[must_use]
pub fn occupied_error(target: &Path, is_dir: bool) -> DotlinkError {
    if is_dir {
        DotlinkError::conflict(ConflictKind::OccupiedByDirectory, target)
            .with_hint("move the directory away or adopt its files with `dotlink adopt`")
    } else {
        DotlinkError::conflict(ConflictKind::OccupiedByFile, target).with_hint(format!(
            "run `dotlink adopt {}` to move it into the repository first",
            target.display()
        ))
    }
}

/// Compare two paths for equality, handling UNC prefix normalization on Windows.
#[must_use]
pub fn paths_equal(a: &Path, b: &Path) -> bool {
    let normalize = |p: &Path| -> PathBuf {
        #[cfg(windows)]
        {
            let s = p.to_string_lossy();
            if let Some(stripped) = s.strip_prefix(r"\\?\") {
                return PathBuf::from(stripped);
            }
        }
        p.to_path_buf()
    };

    normalize(a) == normalize(b)
}

/// Create a symlink at `link` pointing to `source`.
///
/// # Errors
///
/// Returns [`DotlinkError::Link`] if the OS refuses to create the link.
pub fn create_symlink(source: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    let result = std::os::unix::fs::symlink(source, link);

    #[cfg(windows)]
    let result = if source.is_dir() {
        std::os::windows::fs::symlink_dir(source, link)
    } else {
        std::os::windows::fs::symlink_file(source, link)
    };

    result.map_err(|e| {
        let err = DotlinkError::link(source, link, e);
        if cfg!(windows) {
            err.with_hint("enable Developer Mode or run as Administrator to create symlinks")
        } else {
            err
        }
    })
}

/// Remove a symlink, handling platform differences.
///
/// On Windows, directory symlinks must be removed with `remove_dir` (not
/// `remove_file`), so the raw `FILE_ATTRIBUTE_DIRECTORY` flag is checked.
///
/// # Errors
///
/// Returns [`DotlinkError::Path`] if the link cannot be inspected or removed.
pub fn remove_symlink(path: &Path) -> Result<()> {
    let meta = std::fs::symlink_metadata(path)
        .map_err(|e| DotlinkError::path("inspect", path, e))?;
    let result = if is_dir_like(&meta) {
        std::fs::remove_dir(path)
    } else {
        std::fs::remove_file(path)
    };
    result.map_err(|e| DotlinkError::path("remove symlink", path, e))
}

/// Check if metadata represents a directory-like entry.
fn is_dir_like(meta: &std::fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        meta.file_attributes() & 0x10 != 0 // FILE_ATTRIBUTE_DIRECTORY
    }
    #[cfg(not(windows))]
    {
        meta.is_dir()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn paths_equal_works() {
        let path1 = PathBuf::from("/tmp/test");
        let path2 = PathBuf::from("/tmp/test");
        assert!(paths_equal(&path1, &path2));

        let path3 = PathBuf::from("/tmp/other");
        assert!(!paths_equal(&path1, &path3));
    }

    #[test]
    fn description_names_both_ends() {
        let resource = SymlinkResource::new(PathBuf::from("/source"), PathBuf::from("/target"));
        assert_eq!(resource.description(), "/target -> /source");
    }

    #[test]
    fn absent_when_target_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("source");
        std::fs::write(&source, "test").unwrap();

        let resource = SymlinkResource::new(source, temp_dir.path().join("target"));
        assert_eq!(resource.current_state().unwrap(), LinkState::Absent);
    }

    #[cfg(unix)]
    #[test]
    fn linked_correctly_when_link_points_to_source() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("source");
        let target = temp_dir.path().join("target");
        std::fs::write(&source, "test").unwrap();
        std::os::unix::fs::symlink(&source, &target).unwrap();

        let resource = SymlinkResource::new(source, target);
        assert_eq!(resource.current_state().unwrap(), LinkState::LinkedCorrectly);
        assert_eq!(resource.apply().unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[cfg(unix)]
    #[test]
    fn linked_elsewhere_is_replaced() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("source");
        let other = temp_dir.path().join("other");
        let target = temp_dir.path().join("target");
        std::fs::write(&source, "test").unwrap();
        std::fs::write(&other, "other").unwrap();
        std::os::unix::fs::symlink(&other, &target).unwrap();

        let resource = SymlinkResource::new(source.clone(), target.clone());
        assert!(matches!(
            resource.current_state().unwrap(),
            LinkState::LinkedElsewhere { .. }
        ));
        assert_eq!(resource.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
    }

    #[test]
    fn regular_file_is_never_overwritten() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("source");
        let target = temp_dir.path().join("target");
        std::fs::write(&source, "content").unwrap();
        std::fs::write(&target, "precious").unwrap();

        let resource = SymlinkResource::new(source, target.clone());
        assert_eq!(
            resource.current_state().unwrap(),
            LinkState::Occupied { is_dir: false }
        );
        let err = resource.apply().unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::OccupiedByFile));
        assert!(err.hint().unwrap().contains("adopt"));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "precious");
    }

    #[test]
    fn real_directory_is_occupied() {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = temp_dir.path().join("target");
        std::fs::create_dir(&target).unwrap();

        let resource = SymlinkResource::new(temp_dir.path().join("source"), target);
        let err = resource.apply().unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::OccupiedByDirectory));
    }

    #[cfg(unix)]
    #[test]
    fn apply_creates_missing_parents() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("source");
        std::fs::write(&source, "x").unwrap();
        let target = temp_dir.path().join("a").join("b").join("target");

        let resource = SymlinkResource::new(source.clone(), target.clone());
        assert_eq!(resource.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(std::fs::read_link(&target).unwrap(), source);
    }

    #[cfg(unix)]
    #[test]
    fn remove_deletes_broken_link() {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = temp_dir.path().join("target");
        std::os::unix::fs::symlink("/nonexistent/source", &target).unwrap();

        let resource = SymlinkResource::new(PathBuf::from("/nonexistent/source"), target.clone());
        assert_eq!(resource.remove().unwrap(), ResourceChange::Applied);
        assert!(target.symlink_metadata().is_err());
        assert_eq!(resource.remove().unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[test]
    fn remove_refuses_regular_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = temp_dir.path().join("target");
        std::fs::write(&target, "keep me").unwrap();

        let resource = SymlinkResource::new(temp_dir.path().join("source"), target.clone());
        let err = resource.remove().unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::NotASymlink));
        assert!(target.exists());
    }
}
