// Shared helpers for integration tests.
//
// Provides a temporary repository and home directory side by side plus a
// fluent builder, so each integration test can set up an isolated
// environment without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dotlink::config::Config;
use dotlink::context::Context;
use dotlink::exec::{ExecResult, Executor};
use dotlink::logging::Logger;

/// An [`Executor`] on a machine with no external programs, so repository
/// removal always takes the plain-delete path.
#[derive(Debug)]
pub struct NoPrograms;

impl Executor for NoPrograms {
    fn run_in_with_timeout(
        &self,
        _dir: &Path,
        program: &str,
        _args: &[&str],
        _timeout: Duration,
    ) -> anyhow::Result<ExecResult> {
        anyhow::bail!("{program} is not installed")
    }

    fn which(&self, _program: &str) -> bool {
        false
    }
}

/// A repository and a home directory inside one [`tempfile::TempDir`].
///
/// Both paths are canonical so comparisons against resolved link targets
/// hold on systems where the temp directory is itself behind a symlink.
pub struct IntegrationTestContext {
    _root: tempfile::TempDir,
    /// The dotfiles repository.
    pub repo: PathBuf,
    /// The directory links are created in.
    pub home: PathBuf,
}

impl IntegrationTestContext {
    /// Create an empty repository and home.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let base = dunce::canonicalize(root.path()).expect("canonicalize temp dir");
        let repo = base.join("repo");
        let home = base.join("home");
        std::fs::create_dir_all(&repo).expect("create repo");
        std::fs::create_dir_all(&home).expect("create home");
        Self {
            _root: root,
            repo,
            home,
        }
    }

    /// Load `dotlink.toml` and `.dotlinkignore` with `home` as `~`.
    pub fn load_config(&self) -> Config {
        Config::load(&self.repo, &self.home, &[]).expect("load config")
    }

    /// A real-filesystem context rooted at `home`.
    pub fn context(&self, dry_run: bool) -> Context {
        Context::with_home(Arc::new(Logger::new("test")), dry_run, self.home.clone())
            .with_executor(Arc::new(NoPrograms))
    }

    /// Every entry under the repository and home, with file contents and
    /// link targets, for before/after comparisons.
    pub fn tree(&self) -> Vec<String> {
        let mut entries = Vec::new();
        for (label, root) in [("repo", &self.repo), ("home", &self.home)] {
            for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
                let entry = entry.expect("walk");
                let rel = entry.path().strip_prefix(root).expect("strip");
                let kind = if entry.path_is_symlink() {
                    format!(
                        "-> {}",
                        std::fs::read_link(entry.path()).expect("read link").display()
                    )
                } else if entry.file_type().is_file() {
                    std::fs::read_to_string(entry.path()).unwrap_or_default()
                } else {
                    "/".to_string()
                };
                entries.push(format!("{label}/{} {kind}", rel.display()));
            }
        }
        entries
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building a new context.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
        }
    }

    /// Write `content` to `<repo>/<rel>`.
    pub fn with_repo_file(self, rel: &str, content: &str) -> Self {
        write(&self.ctx.repo.join(rel), content);
        self
    }

    /// Write `content` to `<home>/<rel>`.
    pub fn with_home_file(self, rel: &str, content: &str) -> Self {
        write(&self.ctx.home.join(rel), content);
        self
    }

    /// Write `dotlink.toml`.
    pub fn with_config(self, content: &str) -> Self {
        write(&self.ctx.repo.join("dotlink.toml"), content);
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, content).expect("write file");
}
