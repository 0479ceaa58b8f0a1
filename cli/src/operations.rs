//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that the multi-step mutations in
//! adopt and orphan can be unit-tested with forced failures. Production code
//! uses [`SystemFileSystemOps`]; tests use the generated `MockFileSystemOps`.

use std::io;
use std::path::Path;

/// The mutating primitives whose failure triggers a rollback.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Rename `from` to `to` (same semantics as [`std::fs::rename`]).
    ///
    /// # Errors
    ///
    /// Returns the OS error, e.g. `CrossesDevices` when the paths live on
    /// different filesystems.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create a symlink at `link` pointing to `source`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the link cannot be created.
    fn symlink(&self, source: &Path, link: &Path) -> io::Result<()>;

    /// Copy the contents of file `from` to `to`, returning the bytes copied.
    ///
    /// # Errors
    ///
    /// Returns the OS error if either side cannot be opened or written.
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64>;
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn symlink(&self, source: &Path, link: &Path) -> io::Result<()> {
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(source, link)
        }
        #[cfg(windows)]
        {
            if source.is_dir() {
                std::os::windows::fs::symlink_dir(source, link)
            } else {
                std::os::windows::fs::symlink_file(source, link)
            }
        }
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64> {
        std::fs::copy(from, to)
    }
}
