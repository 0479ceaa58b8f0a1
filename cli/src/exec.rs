//! External command execution with a bounded wait.
use anyhow::{Context as _, Result, bail};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How often a running child is polled while waiting for it to exit.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Result of a command execution.
#[derive(Debug)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
}

/// Runs external programs on behalf of the link engine.
///
/// The only caller today is the version-control-aware removal in
/// [`orphan`](crate::links::orphan); the trait exists so that path can be
/// tested without `git` on the machine.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run `program` in `dir`, killing it if it has not exited after
    /// `timeout`. Fails on spawn errors, timeouts and non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started, does not finish in
    /// time, or exits non-zero.
    fn run_in_with_timeout(
        &self,
        dir: &Path,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<ExecResult>;

    /// Check if a program is available on PATH.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_in_with_timeout(
        &self,
        dir: &Path,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<ExecResult> {
        let label = format!("{program} in {}", dir.display());
        let mut child = Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to execute: {label}"))?;

        // Both pipes are read while the child runs; a full pipe stalls it.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + timeout;
        let status = loop {
            if let Some(status) = child
                .try_wait()
                .with_context(|| format!("failed to wait for: {label}"))?
            {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                bail!("{label} timed out after {}s", timeout.as_secs());
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let result = ExecResult {
            stdout: String::from_utf8_lossy(&stdout.join().unwrap_or_default()).into_owned(),
            stderr: String::from_utf8_lossy(&stderr.join().unwrap_or_default()).into_owned(),
            success: status.success(),
            code: status.code(),
        };
        if !result.success {
            bail!(
                "{label} failed (exit {}): {}",
                result.code.unwrap_or(-1),
                result.stderr.trim()
            );
        }
        Ok(result)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Read `pipe` to its end on a background thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[cfg(unix)]
    #[test]
    fn run_echo() {
        let dir = std::env::temp_dir();
        let result = SystemExecutor
            .run_in_with_timeout(&dir, "echo", &["hello"], TIMEOUT)
            .unwrap();
        assert!(result.success, "echo command should succeed");
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn run_failure() {
        let dir = std::env::temp_dir();
        let result = SystemExecutor.run_in_with_timeout(&dir, "false", &[], TIMEOUT);
        assert!(result.is_err(), "non-zero exit should produce an error");
    }

    #[cfg(unix)]
    #[test]
    fn run_times_out() {
        let dir = std::env::temp_dir();
        let started = Instant::now();
        let err = SystemExecutor
            .run_in_with_timeout(&dir, "sleep", &["5"], Duration::from_millis(100))
            .unwrap_err();
        assert!(err.to_string().contains("timed out"), "got: {err}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn large_output_does_not_stall() {
        let dir = std::env::temp_dir();
        let result = SystemExecutor
            .run_in_with_timeout(&dir, "head", &["-c", "200000", "/dev/zero"], TIMEOUT)
            .unwrap();
        assert_eq!(result.stdout.len(), 200_000);
    }

    #[cfg(unix)]
    #[test]
    fn stderr_is_captured_on_failure() {
        let dir = std::env::temp_dir();
        let err = SystemExecutor
            .run_in_with_timeout(&dir, "sh", &["-c", "echo broken >&2; exit 3"], TIMEOUT)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("exit 3"), "got: {message}");
        assert!(message.contains("broken"), "got: {message}");
    }

    #[test]
    fn missing_program_is_an_error() {
        let dir = std::env::temp_dir();
        let result = SystemExecutor.run_in_with_timeout(
            &dir,
            "this-program-does-not-exist-12345",
            &[],
            TIMEOUT,
        );
        assert!(result.is_err());
    }

    #[test]
    fn which_missing_program() {
        assert!(
            !SystemExecutor.which("this-program-does-not-exist-12345"),
            "non-existent program should not be found"
        );
    }

    #[test]
    fn mock_records_calls() {
        let mock = test_helpers::MockExecutor::ok();
        mock.run_in_with_timeout(Path::new("/repo"), "git", &["rm", "-f"], TIMEOUT)
            .unwrap();
        assert_eq!(
            mock.calls(),
            vec![(std::path::PathBuf::from("/repo"), "git rm -f".to_string())]
        );
        assert!(
            mock.run_in_with_timeout(Path::new("/repo"), "git", &[], TIMEOUT)
                .is_err(),
            "exhausted mock should fail"
        );
    }
}
