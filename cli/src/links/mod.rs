//! The link engine: discover, plan, create, remove, adopt and orphan
//! symlinks between a repository and the directories it is linked into.
//!
//! Every batch operation is split into a read-only collection phase
//! ([`scan`] or [`plan`]) that yields an immutable list, followed by an
//! action phase that walks that list. Dry-run mode runs the same collection
//! and only swaps the mutation for a log line.
pub mod adopt;
pub mod execute;
pub mod mapping;
pub mod orphan;
pub mod plan;
pub mod scan;

pub use adopt::{adopt, adopt_paths};
pub use execute::{
    compute_and_create_links, create_links, prune_broken, remove_links, remove_managed_links,
};
pub use mapping::{ManagedLink, PlannedLink, SourceMapping};
pub use orphan::{orphan, orphan_paths};
pub use plan::{PlanConflict, plan, validate_plan};
pub use scan::{find_managed_links, scan};

use std::path::Path;

use crate::context::Context;
use crate::error::DotlinkError;

/// The kind of batch a [`BatchStats`] counts, which decides its wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Creating planned links.
    Link,
    /// Removing managed links.
    Unlink,
    /// Removing broken managed links.
    Prune,
    /// Moving files into the repository.
    Adopt,
    /// Moving files back out of the repository.
    Orphan,
}

impl Action {
    const fn verbs(self) -> (&'static str, &'static str) {
        match self {
            Self::Link => ("created", "would create"),
            Self::Unlink => ("removed", "would remove"),
            Self::Prune => ("pruned", "would prune"),
            Self::Adopt => ("adopted", "would adopt"),
            Self::Orphan => ("orphaned", "would orphan"),
        }
    }
}

/// Per-batch counters.
///
/// # Examples
///
/// ```
/// use dotlink::links::{Action, BatchStats};
///
/// let stats = BatchStats { changed: 5, skipped: 12, failed: 0 };
/// assert_eq!(stats.summary(Action::Link, false), "5 created, 12 already linked");
/// assert_eq!(stats.summary(Action::Link, true), "5 would create, 12 already linked");
/// assert!(stats.is_success());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    /// Entries created, removed, adopted or orphaned (or that would be).
    pub changed: u32,
    /// Entries already in the desired state.
    pub skipped: u32,
    /// Entries that failed; siblings are still processed.
    pub failed: u32,
}

impl BatchStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when no entry failed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Format the summary string (e.g. "3 created, 10 already linked, 1 failed").
    #[must_use]
    pub fn summary(&self, action: Action, dry_run: bool) -> String {
        let (done, would) = action.verbs();
        let verb = if dry_run { would } else { done };
        let mut text = format!("{} {verb}", self.changed);
        if self.skipped > 0 {
            text.push_str(&format!(", {} already linked", self.skipped));
        }
        if self.failed > 0 {
            text.push_str(&format!(", {} failed", self.failed));
        }
        text
    }
}

impl std::ops::AddAssign for BatchStats {
    fn add_assign(&mut self, other: Self) {
        self.changed += other.changed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Log a per-entry failure and its hint without aborting the batch.
pub(crate) fn report_failure(ctx: &Context, err: &DotlinkError) {
    ctx.log.error(&err.to_string());
    if let Some(hint) = err.hint() {
        ctx.log.info(&format!("hint: {hint}"));
    }
}

/// Render `rel` with `/` separators for pattern matching.
pub(crate) fn to_slash(rel: &Path) -> String {
    let mut out = String::new();
    for component in rel.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}
