//! Symlink-based dotfiles manager.
//!
//! Files live in a version-controlled repository and are linked into the
//! directories they configure. One or more mappings pair a repository
//! subtree with a target directory; gitignore-style patterns decide which
//! repository entries are never linked.
//!
//! The public API is organised into these layers:
//!
//! - **[`patterns`]** — compile and evaluate ignore patterns
//! - **[`links`]** — scan, plan, create, remove, adopt and orphan links
//! - **[`resources`]** — the idempotent symlink state machine and filesystem helpers
//! - **[`config`]** — repository discovery, `dotlink.toml` and the layered pattern set
//! - **[`commands`]** — top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod links;
pub mod logging;
pub mod operations;
pub mod patterns;
pub mod platform;
pub mod resources;
