//! Mapping and link value types shared by the scanner, planner and executor.
use std::path::{Component, Path, PathBuf};

use crate::error::{DotlinkError, Result};

/// One configured pairing of a repository subtree to a destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapping {
    /// Absolute path of the repository subtree.
    pub source: PathBuf,
    /// Absolute path of the directory the subtree is linked into.
    pub target: PathBuf,
}

impl SourceMapping {
    /// Create a mapping from already-expanded absolute paths.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// The source path with symlinks resolved where possible.
    ///
    /// Falls back to a lexically cleaned path when the source does not exist.
    #[must_use]
    pub fn canonical_source(&self) -> PathBuf {
        canonicalize_lenient(&self.source)
    }

    /// Whether `resolved` lies strictly inside this mapping's source.
    ///
    /// `resolved` must already be absolute and canonical; see
    /// [`canonicalize_lenient`].
    #[must_use]
    pub fn contains(&self, resolved: &Path) -> bool {
        is_strict_descendant(&self.canonical_source(), resolved)
    }
}

/// A symlink discovered by the scanner whose target lies in a mapping source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedLink {
    /// Absolute path of the symlink itself.
    pub path: PathBuf,
    /// The symlink text as stored on disk.
    pub target: PathBuf,
    /// Absolute, canonical form of `target`.
    pub resolved: PathBuf,
    /// `true` when `resolved` does not exist.
    pub is_broken: bool,
    /// The mapping that claimed this link.
    pub mapping: SourceMapping,
}

/// A symlink the planner wants to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLink {
    /// Absolute path of the repository file.
    pub source: PathBuf,
    /// Absolute path where the symlink belongs.
    pub target: PathBuf,
}

/// Return the first mapping (in configuration order) whose source contains
/// `resolved`.
#[must_use]
pub fn owning_mapping<'a>(
    mappings: &'a [SourceMapping],
    resolved: &Path,
) -> Option<&'a SourceMapping> {
    mappings.iter().find(|m| m.contains(resolved))
}

/// `true` when `path` is below `root`: the relative path from `root` is
/// neither empty nor starts with `..`.
#[must_use]
pub fn is_strict_descendant(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .is_ok_and(|rel| rel.components().next().is_some())
}

/// Resolve a symlink's stored text into an absolute path: relative text is
/// joined onto the directory holding the link.
#[must_use]
pub fn absolutize_link_target(link: &Path, stored: &Path) -> PathBuf {
    if stored.is_absolute() {
        stored.to_path_buf()
    } else {
        link.parent()
            .map_or_else(|| stored.to_path_buf(), |dir| dir.join(stored))
    }
}

/// Canonicalise `path`, falling back to lexical cleaning when any component
/// is missing (as with the target of a broken link).
///
/// When the path itself is missing, its deepest existing ancestor is still
/// canonicalised so both sides of a containment check agree on prefixes such
/// as `/tmp` → `/private/tmp`.
#[must_use]
pub fn canonicalize_lenient(path: &Path) -> PathBuf {
    if let Ok(canonical) = dunce::canonicalize(path) {
        return canonical;
    }
    let cleaned = normalize_lexically(path);
    let mut existing = cleaned.as_path();
    let mut tail = Vec::new();
    while let Some(parent) = existing.parent() {
        if let Some(name) = existing.file_name() {
            tail.push(name.to_os_string());
        }
        existing = parent;
        if let Ok(canonical) = dunce::canonicalize(existing) {
            return tail
                .iter()
                .rev()
                .fold(canonical, |acc, name| acc.join(name));
        }
    }
    cleaned
}

/// Absolute form of a user-supplied `path` with its parent canonicalised but
/// the final component kept as-is, so a symlink at `path` is not followed.
///
/// # Errors
///
/// Returns an error if the current directory is needed but unavailable, or
/// if `path` has no final component (such as `/`).
pub fn resolve_location(path: &Path) -> Result<PathBuf> {
    let absolute =
        std::path::absolute(path).map_err(|e| DotlinkError::path("resolve", path, e))?;
    let absolute = normalize_lexically(&absolute);
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => Ok(canonicalize_lenient(parent).join(name)),
        _ => Err(DotlinkError::validation(format!(
            "{} does not name a file or directory",
            absolute.display()
        ))),
    }
}

/// Remove `.` components and fold `..` into their parent without touching
/// the filesystem.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn strict_descendant_excludes_root_and_siblings() {
        let root = Path::new("/repo/home");
        assert!(is_strict_descendant(root, Path::new("/repo/home/.bashrc")));
        assert!(is_strict_descendant(root, Path::new("/repo/home/a/b")));
        assert!(!is_strict_descendant(root, Path::new("/repo/home")));
        assert!(!is_strict_descendant(root, Path::new("/repo/homework/x")));
        assert!(!is_strict_descendant(root, Path::new("/repo/other")));
    }

    #[test]
    fn lexical_normalisation_folds_dots() {
        assert_eq!(
            normalize_lexically(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(
            normalize_lexically(Path::new("../x")),
            PathBuf::from("../x")
        );
    }

    #[test]
    fn relative_link_target_resolves_against_link_dir() {
        let abs = absolutize_link_target(
            Path::new("/home/u/.config/nvim"),
            Path::new("../dotfiles/nvim"),
        );
        assert_eq!(abs, PathBuf::from("/home/u/.config/../dotfiles/nvim"));
        assert_eq!(
            normalize_lexically(&abs),
            PathBuf::from("/home/u/dotfiles/nvim")
        );
        let abs = absolutize_link_target(Path::new("/home/u/.x"), Path::new("/repo/x"));
        assert_eq!(abs, PathBuf::from("/repo/x"));
    }

    #[test]
    fn lenient_canonicalisation_keeps_missing_tail() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone").join("file.txt");
        let resolved = canonicalize_lenient(&missing);
        let base = dunce::canonicalize(dir.path()).unwrap();
        assert_eq!(resolved, base.join("gone").join("file.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn resolve_location_keeps_final_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let base = dunce::canonicalize(dir.path()).unwrap();
        std::os::unix::fs::symlink("/elsewhere", base.join("link")).unwrap();
        let resolved = resolve_location(&base.join("sub/../link")).unwrap();
        assert_eq!(resolved, base.join("link"));
        assert!(resolve_location(Path::new("/")).is_err());
    }

    #[test]
    fn first_matching_mapping_wins() {
        let dir = tempfile::tempdir().unwrap();
        let outer = dir.path().join("repo");
        let inner = outer.join("home");
        std::fs::create_dir_all(&inner).unwrap();
        std::fs::write(inner.join("f"), "x").unwrap();

        let mappings = vec![
            SourceMapping::new(&outer, "/t1"),
            SourceMapping::new(&inner, "/t2"),
        ];
        let resolved = canonicalize_lenient(&inner.join("f"));
        let owner = owning_mapping(&mappings, &resolved).unwrap();
        assert_eq!(owner.target, PathBuf::from("/t1"));
    }
}
