//! Console and log-file output.
//!
//! The link engine talks to the [`Log`] trait; [`Logger`] implements it on
//! top of [`tracing`] and keeps the end-of-run summary. [`init_subscriber`]
//! wires the console formatter and the per-command log file.

mod logger;
mod subscriber;
mod types;
mod utils;

pub use logger::Logger;
pub use subscriber::init_subscriber;
pub use types::{Log, Outcome, SummaryEntry};

/// A [`Logger`] whose events land in a fresh log file inside a temporary
/// directory, through a thread-local subscriber.
///
/// Keep the returned guard alive for the whole test.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn logger_with_file() -> (Logger, tempfile::TempDir, tracing::dispatcher::DefaultGuard)
{
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};

    let tmp = tempfile::tempdir().expect("temp dir");
    let path = tmp.path().join("test.log");
    let layer = subscriber::LogFileLayer::open(&path, "test").expect("log file");
    let subscriber = tracing_subscriber::registry().with(layer.with_filter(LevelFilter::DEBUG));
    let guard = tracing::subscriber::set_default(subscriber);
    (Logger::with_log_path(Some(path)), tmp, guard)
}
