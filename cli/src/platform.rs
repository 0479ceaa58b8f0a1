//! Platform detection and OS-specific constants.
use std::fmt;
use std::path::PathBuf;

use crate::error::{DotlinkError, Result};

/// Directory names the link scanner never descends into.
///
/// `.Trash` is the macOS and freedesktop trash folder; `Library` is the macOS
/// per-user application data tree. Both are large and never hold managed
/// links. Matching is case-sensitive and by final path component.
pub const RESERVED_DIR_NAMES: &[&str] = &[".Trash", "Library"];

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Linux and other Unix-like systems.
    Linux,
    /// macOS.
    MacOs,
    /// Windows.
    Windows,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::MacOs => write!(f, "macos"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

impl Os {
    /// Detect the current operating system.
    #[must_use]
    pub const fn detect() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }
}

/// Whether `name` is a directory the scanner skips along with its subtree.
#[must_use]
pub fn is_reserved_dir_name(name: &str) -> bool {
    RESERVED_DIR_NAMES.contains(&name)
}

/// The current user's home directory.
///
/// # Errors
///
/// Returns a validation error if no home directory can be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        DotlinkError::validation("cannot determine the home directory")
            .with_hint("set HOME (or USERPROFILE on Windows)")
    })
}
