//! Core logging types: summary entries, outcomes, and the [`Log`] trait.

/// One line of the end-of-run summary.
#[derive(Debug, Clone)]
pub struct SummaryEntry {
    /// What was acted on, usually a mapping or a path.
    pub name: String,
    /// Final outcome.
    pub outcome: Outcome,
    /// Optional detail message (e.g., counts or an error description).
    pub message: Option<String>,
}

/// Outcome of one summarised operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Completed and changed something.
    Ok,
    /// Nothing to do.
    Skipped,
    /// Ran in dry-run mode; no changes were applied.
    DryRun,
    /// Failed, fully or for some entries.
    Failed,
}

/// Abstraction over logging backends.
///
/// The link engine logs through this trait (held by
/// [`Context`](crate::context::Context)) so it never depends on global
/// presentation state.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record an operation result for the summary.
    fn record(&self, name: &str, outcome: Outcome, message: Option<&str>);
}
