//! Tracing subscriber setup: console formatter, log file layer, and
//! initialisation.
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;

use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};

/// Target used by [`Logger::stage`](super::Logger::stage).
pub(super) const STAGE_TARGET: &str = "dotlink::stage";
/// Target used by [`Logger::dry_run`](super::Logger::dry_run).
pub(super) const DRY_RUN_TARGET: &str = "dotlink::dry_run";

/// How an event is presented, derived from its level and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Stage,
    DryRun,
    Error,
    Warn,
    Info,
    Debug,
}

impl Kind {
    fn of(metadata: &tracing::Metadata<'_>) -> Self {
        match (*metadata.level(), metadata.target()) {
            (Level::ERROR, _) => Self::Error,
            (Level::WARN, _) => Self::Warn,
            (Level::INFO, STAGE_TARGET) => Self::Stage,
            (Level::INFO, DRY_RUN_TARGET) => Self::DryRun,
            (Level::INFO, _) => Self::Info,
            _ => Self::Debug,
        }
    }

    /// Fixed-width column written before each message in the log file.
    const fn file_label(self) -> &'static str {
        match self {
            Self::Stage => "stage",
            Self::DryRun => "dry-run",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

/// Collects the `message` field of an event.
#[derive(Default)]
struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0.push_str(value);
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.0, "{value:?}");
        }
    }
}

fn message_of(event: &tracing::Event<'_>) -> String {
    let mut visitor = MessageVisitor::default();
    event.record(&mut visitor);
    visitor.0
}

/// Appends every event it sees to a plain-text log file.
///
/// Lines are `HH:MM:SS label   message` with ANSI codes removed. The file
/// starts with a one-line header naming the command and the start time.
#[derive(Debug)]
pub(super) struct LogFileLayer {
    file: Mutex<fs::File>,
}

impl LogFileLayer {
    /// Open the log file for `command` under the cache directory.
    pub(super) fn for_command(command: &str) -> Option<Self> {
        Self::open(&log_file_path(command)?, command)
    }

    /// Truncate `path`, write the run header and keep the file open for
    /// appending. `None` when the file cannot be written.
    pub(super) fn open(path: &Path, command: &str) -> Option<Self> {
        let version =
            option_env!("DOTLINK_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let header = format!(
            "# dotlink {version}: {command} started {} UTC\n",
            format_utc_datetime()
        );
        fs::write(path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogFileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let kind = Kind::of(event.metadata());
        let line = format!(
            "{} {:<7} {}",
            format_utc_time(),
            kind.file_label(),
            strip_ansi(&message_of(event))
        );
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{line}");
        }
    }
}

/// Console output: stage headers, indented detail lines, and
/// `warning:`/`error:` prefixes on the diagnostic stream.
struct ConsoleFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let msg = message_of(event);
        match Kind::of(event.metadata()) {
            Kind::Stage => writeln!(writer, "\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            Kind::DryRun => writeln!(writer, "  \x1b[36m~\x1b[0m {msg}"),
            Kind::Error => writeln!(writer, "\x1b[1;31merror:\x1b[0m {msg}"),
            Kind::Warn => writeln!(writer, "\x1b[1;33mwarning:\x1b[0m {msg}"),
            Kind::Info => writeln!(writer, "  {msg}"),
            Kind::Debug => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Install the global [`tracing`] subscriber for one `command` run.
///
/// Warnings and errors go to stderr, everything else to stdout. `verbose`
/// lowers the console level to `DEBUG`; `RUST_LOG` overrides it. The log
/// file at `$XDG_CACHE_HOME/dotlink/<command>.log` always receives `DEBUG`
/// and above. Call once, before anything logs.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let console = fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(
            std::io::stderr
                .with_max_level(Level::WARN)
                .and(std::io::stdout.with_min_level(Level::INFO)),
        )
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        );
    let file = LogFileLayer::for_command(command).map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry().with(console).with(file).init();
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt as _;

    #[test]
    fn events_are_classified_by_level_and_target() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("status.log");
        let layer = LogFileLayer::open(&path, "status").unwrap();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: STAGE_TARGET, "Scanning");
            tracing::info!(target: DRY_RUN_TARGET, "remove ~/.vimrc");
            tracing::warn!("\x1b[33mcareful\x1b[0m");
            tracing::debug!("walked 12 entries");
        });

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert!(lines.next().unwrap().starts_with("# dotlink "));
        let rest: Vec<&str> = lines.map(|l| l.get(9..).unwrap_or_default()).collect();
        assert_eq!(
            rest,
            vec![
                "stage   Scanning",
                "dry-run remove ~/.vimrc",
                "warn    careful",
                "debug   walked 12 entries",
            ]
        );
    }
}
