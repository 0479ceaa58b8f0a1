//! Domain-specific error types for the link engine.
//!
//! Library code returns [`DotlinkError`]; command handlers at the CLI
//! boundary convert it to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! DotlinkError
//! ├── Path           — an operation failed against a specific path
//! ├── Link           — a symlink operation failed (carries source + target)
//! ├── Validation     — unacceptable input, detected before any I/O
//! ├── Conflict       — already adopted, occupied target, unmanaged link, …
//! ├── DeletedInRepo  — a managed link whose repository file is gone
//! └── RollbackFailed — a multi-step mutation failed and could not be undone
//! ```
//!
//! Every variant can carry an optional human-actionable hint, kept separate
//! from the technical message and surfaced by [`DotlinkError::hint`].

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T, E = DotlinkError> = std::result::Result<T, E>;

/// Classification of a [`DotlinkError::Conflict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// The path is already a symlink into the repository.
    AlreadyAdopted,
    /// A regular file occupies the place where a symlink should go.
    OccupiedByFile,
    /// A real directory occupies the place where a symlink should go.
    OccupiedByDirectory,
    /// The symlink does not resolve into any configured mapping.
    NotManaged,
    /// A symlink was expected but the path is something else.
    NotASymlink,
    /// The repository already holds a file at the adoption destination.
    DestinationExists,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::AlreadyAdopted => "already adopted",
            Self::OccupiedByFile => "target occupied by regular file",
            Self::OccupiedByDirectory => "target occupied by directory",
            Self::NotManaged => "symlink not managed by this repository",
            Self::NotASymlink => "not a symlink",
            Self::DestinationExists => "destination already exists in repository",
        };
        f.write_str(text)
    }
}

/// Top-level error type for the link engine.
#[derive(Error, Debug)]
pub enum DotlinkError {
    /// An operation failed against a specific filesystem path.
    #[error("{action} {}: {source}", .path.display())]
    Path {
        /// Short verb phrase describing what was attempted.
        action: String,
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
        /// Optional user-facing hint.
        hint: Option<String>,
    },

    /// A symlink-specific operation failed.
    #[error("symlink {} -> {}: {cause}", .target.display(), .source_path.display())]
    Link {
        /// What the symlink points (or should point) to.
        source_path: PathBuf,
        /// Where the symlink lives.
        target: PathBuf,
        /// Underlying I/O error.
        #[source]
        cause: io::Error,
        /// Optional user-facing hint.
        hint: Option<String>,
    },

    /// A configuration or argument value is unacceptable.
    #[error("{message}")]
    Validation {
        /// Description of the problem.
        message: String,
        /// Optional user-facing hint.
        hint: Option<String>,
    },

    /// The filesystem is not in a state the operation can act on.
    #[error("{kind}: {}", .path.display())]
    Conflict {
        /// Conflict classification.
        kind: ConflictKind,
        /// Offending path.
        path: PathBuf,
        /// Optional user-facing hint.
        hint: Option<String>,
    },

    /// A managed link points at a repository file that no longer exists.
    #[error("file deleted in repo: {} -> {}", .link.display(), .target.display())]
    DeletedInRepo {
        /// The managed symlink.
        link: PathBuf,
        /// The missing repository file.
        target: PathBuf,
    },

    /// A multi-step operation failed and undoing its first step failed too.
    #[error(
        "{original}; rollback also failed: {rollback} (file may now be missing from both {} and the repository)",
        .path.display()
    )]
    RollbackFailed {
        /// Original location of the file.
        path: PathBuf,
        /// The error that triggered the rollback.
        original: Box<DotlinkError>,
        /// The error raised by the rollback itself.
        rollback: Box<DotlinkError>,
    },
}

impl DotlinkError {
    /// Build a [`DotlinkError::Path`] without a hint.
    pub fn path(action: impl Into<String>, path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Path {
            action: action.into(),
            path: path.as_ref().to_path_buf(),
            source,
            hint: None,
        }
    }

    /// Build a [`DotlinkError::Link`] without a hint.
    pub fn link(source_path: impl AsRef<Path>, target: impl AsRef<Path>, cause: io::Error) -> Self {
        Self::Link {
            source_path: source_path.as_ref().to_path_buf(),
            target: target.as_ref().to_path_buf(),
            cause,
            hint: None,
        }
    }

    /// Build a [`DotlinkError::Validation`] without a hint.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            hint: None,
        }
    }

    /// Build a [`DotlinkError::Conflict`] without a hint.
    pub fn conflict(kind: ConflictKind, path: impl AsRef<Path>) -> Self {
        Self::Conflict {
            kind,
            path: path.as_ref().to_path_buf(),
            hint: None,
        }
    }

    /// Attach a hint. Variants that cannot carry one are returned unchanged.
    #[must_use]
    pub fn with_hint(mut self, text: impl Into<String>) -> Self {
        match &mut self {
            Self::Path { hint, .. }
            | Self::Link { hint, .. }
            | Self::Validation { hint, .. }
            | Self::Conflict { hint, .. } => *hint = Some(text.into()),
            Self::DeletedInRepo { .. } | Self::RollbackFailed { .. } => {}
        }
        self
    }

    /// The human-actionable hint, if any.
    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Path { hint, .. }
            | Self::Link { hint, .. }
            | Self::Validation { hint, .. }
            | Self::Conflict { hint, .. } => hint.as_deref(),
            Self::DeletedInRepo { .. } => {
                Some("restore the file in the repository or remove the link with `dotlink prune`")
            }
            Self::RollbackFailed { .. } => {
                Some("check the repository working tree for the file and move it back by hand")
            }
        }
    }

    /// The conflict classification, when this is a [`DotlinkError::Conflict`].
    #[must_use]
    pub const fn conflict_kind(&self) -> Option<ConflictKind> {
        match self {
            Self::Conflict { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
