//! Idempotent filesystem primitives (classify + apply pattern).
pub mod helpers;
pub mod symlink;

use std::path::PathBuf;

/// What currently occupies the place where a symlink should be.
///
/// # Examples
///
/// ```
/// use dotlink::resources::LinkState;
///
/// let absent = LinkState::Absent;
/// let stale = LinkState::LinkedElsewhere { current: "/old/path".into() };
///
/// assert_ne!(absent, LinkState::LinkedCorrectly);
/// assert!(absent.is_actionable());
/// assert!(stale.is_actionable());
/// assert!(!LinkState::Occupied { is_dir: false }.is_actionable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// Nothing exists at the target path.
    Absent,
    /// A symlink already points at the intended source.
    LinkedCorrectly,
    /// A symlink points somewhere else.
    LinkedElsewhere {
        /// The stored text of the existing link.
        current: PathBuf,
    },
    /// A real file or directory sits at the target path.
    Occupied {
        /// `true` for a directory, `false` for a file or other entry.
        is_dir: bool,
    },
}

impl LinkState {
    /// Whether applying a link would change anything without destroying data.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        matches!(self, Self::Absent | Self::LinkedElsewhere { .. })
    }
}

/// Result of applying or removing a resource.
///
/// # Examples
///
/// ```
/// use dotlink::resources::ResourceChange;
///
/// let applied = ResourceChange::Applied;
/// let noop = ResourceChange::AlreadyCorrect;
///
/// assert_eq!(applied, ResourceChange::Applied);
/// assert_ne!(applied, noop);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceChange {
    /// Resource was created, updated or removed.
    Applied,
    /// Resource was already in the desired state.
    AlreadyCorrect,
}
