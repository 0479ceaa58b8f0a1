use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI entry point for the dotfiles link manager.
#[derive(Parser, Debug)]
#[command(
    name = "dotlink",
    about = "Symlink-based dotfiles manager with gitignore-style ignore rules",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Dotfiles repository root (defaults to the current directory or ~/dotfiles)
    #[arg(long, global = true, env = "DOTLINK_REPO")]
    pub repo: Option<PathBuf>,

    /// Extra ignore pattern, evaluated after every configured one (repeatable,
    /// given before the subcommand)
    #[arg(long = "ignore", value_name = "PATTERN")]
    pub ignore: Vec<String>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Link every repository file into its mapping target
    Link,
    /// Remove every managed link
    Unlink,
    /// Remove managed links whose repository file is gone
    Prune,
    /// List managed links and files not yet linked
    Status,
    /// Move files into the repository and link them back
    Adopt(AdoptOpts),
    /// Replace managed links with real copies and drop them from the repository
    Orphan(OrphanOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Name used for the log file and the log header.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Unlink => "unlink",
            Self::Prune => "prune",
            Self::Status => "status",
            Self::Adopt(_) => "adopt",
            Self::Orphan(_) => "orphan",
            Self::Version => "version",
        }
    }
}

/// Options for the `adopt` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct AdoptOpts {
    /// Files or directories to adopt
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Adopt into this subdirectory of the mapping source
    #[arg(short, long)]
    pub package: Option<String>,
}

/// Options for the `orphan` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct OrphanOpts {
    /// Managed links, or directories containing them
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}
