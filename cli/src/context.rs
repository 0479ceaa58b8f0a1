//! Request-scoped state shared by every link-engine operation.
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::Log;
use crate::operations::{FileSystemOps, SystemFileSystemOps};

/// Shared context for one command invocation.
pub struct Context {
    /// Logger for output and summary recording.
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
    /// User's home directory path.
    pub home: PathBuf,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Filesystem operation abstraction (injectable for testing).
    pub fs_ops: Arc<dyn FileSystemOps>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("home", &self.home)
            .field("executor", &self.executor)
            .field("fs_ops", &self.fs_ops)
            .finish()
    }
}

impl Context {
    /// Creates a context backed by the real system, rooted at the current
    /// user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new(log: Arc<dyn Log>, dry_run: bool) -> Result<Self> {
        Ok(Self::with_home(log, dry_run, crate::platform::home_dir()?))
    }

    /// Creates a context backed by the real system with an explicit home
    /// directory.
    #[must_use]
    pub fn with_home(log: Arc<dyn Log>, dry_run: bool, home: PathBuf) -> Self {
        Self {
            log,
            dry_run,
            home,
            executor: Arc::new(SystemExecutor),
            fs_ops: Arc::new(SystemFileSystemOps),
        }
    }

    /// Create a copy of this context with a different [`Executor`].
    #[must_use]
    pub fn with_executor(&self, executor: Arc<dyn Executor>) -> Self {
        Self {
            log: Arc::clone(&self.log),
            dry_run: self.dry_run,
            home: self.home.clone(),
            executor,
            fs_ops: Arc::clone(&self.fs_ops),
        }
    }

    /// Create a copy of this context with a different [`FileSystemOps`]
    /// implementation.
    ///
    /// Used in tests to inject a partially failing mock so rollback paths
    /// can be exercised.
    #[must_use]
    pub fn with_fs_ops(&self, fs_ops: Arc<dyn FileSystemOps>) -> Self {
        Self {
            log: Arc::clone(&self.log),
            dry_run: self.dry_run,
            home: self.home.clone(),
            executor: Arc::clone(&self.executor),
            fs_ops,
        }
    }
}
