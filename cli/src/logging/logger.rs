//! Structured logger with dry-run awareness and summary collection.
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{Log, Outcome, SummaryEntry};
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
///
/// The `record` method is **not** included because its signature differs
/// from the `fn(&self, &str)` pattern shared by the display methods.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with dry-run awareness and summary collection.
///
/// All messages are always written to a persistent log file at
/// `$XDG_CACHE_HOME/dotlink/<command>.log` (default `~/.cache/dotlink/<command>.log`)
/// with timestamps and ANSI codes stripped, regardless of the verbose flag.
#[derive(Debug)]
pub struct Logger {
    entries: Mutex<Vec<SummaryEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display in the run summary. The log file
    /// itself is created by [`init_subscriber`](super::init_subscriber); this
    /// constructor does not write to it.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// A logger that reports `path` as its log file.
    #[cfg(test)]
    pub(crate) fn with_log_path(path: Option<PathBuf>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            log_file: path,
        }
    }

    /// Return the log file path, if available.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded summary entries.
    #[must_use]
    pub fn entries(&self) -> Vec<SummaryEntry> {
        self.entries.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record an operation result for the summary.
    pub fn record(&self, name: &str, outcome: Outcome, message: Option<&str>) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(SummaryEntry {
                name: name.to_string(),
                outcome,
                message: message.map(String::from),
            });
        }
    }

    /// Return `true` if any recorded operation has failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    /// Count the number of failed operations.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.entries.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|e| e.outcome == Outcome::Failed)
                .count()
        })
    }

    /// Print the summary of all recorded operations.
    pub fn print_summary(&self) {
        let entries = self.entries();
        if entries.is_empty() {
            return;
        }

        self.stage("Summary");
        for line in render_summary(&entries) {
            self.info(&line);
        }
        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

/// Render summary entries as console lines, one per entry plus a totals line.
fn render_summary(entries: &[SummaryEntry]) -> Vec<String> {
    let mut ok = 0u32;
    let mut skipped = 0u32;
    let mut dry_run = 0u32;
    let mut failed = 0u32;

    let mut lines = Vec::with_capacity(entries.len() + 1);
    for entry in entries {
        let (icon, color) = match entry.outcome {
            Outcome::Ok => {
                ok += 1;
                ("✓", "\x1b[32m")
            }
            Outcome::Skipped => {
                skipped += 1;
                ("○", "\x1b[33m")
            }
            Outcome::DryRun => {
                dry_run += 1;
                ("~", "\x1b[37m")
            }
            Outcome::Failed => {
                failed += 1;
                ("✗", "\x1b[31m")
            }
        };
        let suffix = entry
            .message
            .as_ref()
            .map_or_else(String::new, |msg| format!(" ({msg})"));
        lines.push(format!("{color}{icon} {}{suffix}\x1b[0m", entry.name));
    }
    lines.push(format!(
        "\x1b[32m{ok} ok\x1b[0m, \x1b[33m{skipped} skipped\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m, \x1b[31m{failed} failed\x1b[0m"
    ));
    lines
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record(&self, name: &str, outcome: Outcome, message: Option<&str>) {
        self.record(name, outcome, message);
    }
}
