//! Command: print version information.

/// Version string: `DOTLINK_VERSION` from the build when set, otherwise the
/// crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("DOTLINK_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the dotlink version to stdout.
pub fn run() {
    println!("dotlink {}", version());
}
