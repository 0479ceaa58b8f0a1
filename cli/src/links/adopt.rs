//! Adoption: move a live file into the repository and link it back.
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use super::mapping::{
    SourceMapping, absolutize_link_target, canonicalize_lenient, is_strict_descendant,
    resolve_location,
};
use super::{BatchStats, report_failure, to_slash};
use crate::context::Context;
use crate::error::{ConflictKind, DotlinkError, Result};
use crate::patterns::PatternSet;
use crate::resources::helpers::fs::{ensure_parent_dir, move_path};

/// Where adopted files land in the repository.
struct Destination<'a> {
    mapping: &'a SourceMapping,
    package: Option<&'a str>,
    patterns: &'a PatternSet,
}

impl Destination<'_> {
    /// Path below the mapping source, as the planner will see it.
    fn repo_rel(&self, rel: &Path) -> PathBuf {
        self.package
            .map_or_else(|| rel.to_path_buf(), |name| Path::new(name).join(rel))
    }

    fn repo_path(&self, rel: &Path) -> PathBuf {
        self.mapping.source.join(self.repo_rel(rel))
    }

    fn ignores(&self, rel: &Path, is_dir: bool) -> bool {
        let text = to_slash(&self.repo_rel(rel));
        if is_dir {
            self.patterns.can_skip_dir(&text)
        } else {
            self.patterns.matches_entry(&text, false)
        }
    }
}

/// Adopt a file, or every file below a directory, into `mapping`.
///
/// The repository path mirrors the file's location relative to
/// `mapping.target`. Directories are never replaced by symlinks: each leaf
/// file is adopted on its own, and leaves that are already links into the
/// mapping are counted as skipped so re-adopting a directory is idempotent.
/// Entries `patterns` ignores are left in place and counted as skipped, so
/// the repository only ever holds what `link` would plan.
///
/// # Errors
///
/// For a single file, returns the adoption error: the file is already
/// adopted, is ignored, lies outside the home directory or the mapping
/// target, its repository destination exists, or the move/link sequence
/// failed. For a directory, only structural problems are returned; per-file
/// failures are logged and counted.
pub fn adopt(
    path: &Path,
    mapping: &SourceMapping,
    patterns: &PatternSet,
    ctx: &Context,
) -> Result<BatchStats> {
    let dest = Destination {
        mapping,
        package: None,
        patterns,
    };
    adopt_into(path, &dest, ctx)
}

fn adopt_into(path: &Path, dest: &Destination<'_>, ctx: &Context) -> Result<BatchStats> {
    let mapping = dest.mapping;
    let location = resolve_location(path)?;
    let meta = std::fs::symlink_metadata(&location)
        .map_err(|e| DotlinkError::path("adopt", &location, e))?;

    if meta.file_type().is_symlink() {
        return Err(if links_into(&location, mapping) {
            DotlinkError::conflict(ConflictKind::AlreadyAdopted, &location)
        } else {
            DotlinkError::validation(format!(
                "{} is a symlink into another location",
                location.display()
            ))
            .with_hint("only regular files and directories can be adopted")
        });
    }

    let home = canonicalize_lenient(&ctx.home);
    if !is_strict_descendant(&home, &location) {
        return Err(DotlinkError::validation(format!(
            "{} is outside the home directory",
            location.display()
        ))
        .with_hint(format!("only paths under {} can be adopted", home.display())));
    }

    let source = mapping.canonical_source();
    if location.starts_with(&source) || source.starts_with(&location) {
        return Err(DotlinkError::validation(format!(
            "{} overlaps the repository at {}",
            location.display(),
            source.display()
        )));
    }

    let target = canonicalize_lenient(&mapping.target);
    let rel = location
        .strip_prefix(&target)
        .ok()
        .filter(|rel| rel.components().next().is_some())
        .ok_or_else(|| {
            DotlinkError::validation(format!(
                "{} is not below {}",
                location.display(),
                mapping.target.display()
            ))
        })?;

    if dest.ignores(rel, meta.is_dir()) {
        return Err(DotlinkError::validation(format!(
            "{} matches an ignore pattern",
            location.display()
        ))
        .with_hint("link would never recreate it; adjust the ignore rules first"));
    }

    if !meta.is_dir() {
        adopt_file(&location, &dest.repo_path(rel), ctx)?;
        return Ok(BatchStats {
            changed: 1,
            ..BatchStats::new()
        });
    }
    Ok(adopt_dir(&location, &target, dest, ctx))
}

/// Adopt several paths, optionally into a package subdirectory of the
/// mapping source.
///
/// An already-adopted file counts as skipped; other per-path failures are
/// logged and counted without stopping the batch.
///
/// # Errors
///
/// Returns a validation error, before anything is moved, when `paths` is
/// empty or `package` is not a single plain directory name.
pub fn adopt_paths(
    paths: &[PathBuf],
    mapping: &SourceMapping,
    package: Option<&str>,
    patterns: &PatternSet,
    ctx: &Context,
) -> Result<BatchStats> {
    if paths.is_empty() {
        return Err(DotlinkError::validation("no paths specified")
            .with_hint("pass one or more files or directories to adopt"));
    }
    if let Some(name) = package {
        validate_package(name)?;
    }
    let dest = Destination {
        mapping,
        package,
        patterns,
    };

    let mut stats = BatchStats::new();
    for path in paths {
        match adopt_into(path, &dest, ctx) {
            Ok(s) => stats += s,
            Err(e) if e.conflict_kind() == Some(ConflictKind::AlreadyAdopted) => {
                ctx.log.info(&e.to_string());
                stats.skipped += 1;
            }
            Err(e) => {
                report_failure(ctx, &e);
                stats.failed += 1;
            }
        }
    }
    Ok(stats)
}

/// Move one file to `dest` and link it back, undoing the move if linking
/// fails.
fn adopt_file(location: &Path, dest: &Path, ctx: &Context) -> Result<()> {
    if std::fs::symlink_metadata(dest).is_ok() {
        return Err(
            DotlinkError::conflict(ConflictKind::DestinationExists, dest)
                .with_hint("rename or remove the repository copy, then adopt again"),
        );
    }
    if ctx.dry_run {
        ctx.log.dry_run(&format!(
            "would adopt {} -> {}",
            location.display(),
            dest.display()
        ));
        return Ok(());
    }

    let ops = &*ctx.fs_ops;
    ensure_parent_dir(dest)?;
    move_path(ops, location, dest)?;

    if let Err(e) = ops.symlink(dest, location) {
        let original = DotlinkError::link(dest, location, e);
        return match move_path(ops, dest, location) {
            Ok(()) => {
                ctx.log
                    .warn(&format!("restored {} after failed link", location.display()));
                Err(original)
            }
            Err(rollback) => Err(DotlinkError::RollbackFailed {
                path: location.to_path_buf(),
                original: Box::new(original),
                rollback: Box::new(rollback),
            }),
        };
    }
    ctx.log.debug(&format!(
        "adopted {} -> {}",
        location.display(),
        dest.display()
    ));
    Ok(())
}

fn adopt_dir(dir: &Path, target: &Path, dest: &Destination<'_>, ctx: &Context) -> BatchStats {
    let mut stats = BatchStats::new();
    let mut leaves = Vec::new();
    let mut walker = WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                ctx.log.warn(&format!("skipping unreadable entry: {err}"));
                stats.failed += 1;
                continue;
            }
        };
        let Ok(rel) = entry.path().strip_prefix(target) else {
            continue;
        };
        let is_dir = entry.file_type().is_dir();
        if entry.depth() > 0 && dest.ignores(rel, is_dir) {
            ctx.log.debug(&format!("ignoring {}", entry.path().display()));
            stats.skipped += 1;
            if is_dir {
                walker.skip_current_dir();
            }
            continue;
        }
        if !is_dir {
            leaves.push((entry.path().to_path_buf(), rel.to_path_buf()));
        }
    }

    for (leaf, rel) in leaves {
        let is_symlink = std::fs::symlink_metadata(&leaf).is_ok_and(|m| m.file_type().is_symlink());
        if is_symlink {
            if links_into(&leaf, dest.mapping) {
                ctx.log
                    .debug(&format!("already adopted: {}", leaf.display()));
            } else {
                ctx.log.warn(&format!(
                    "skipping {}: symlink into another location",
                    leaf.display()
                ));
            }
            stats.skipped += 1;
            continue;
        }
        match adopt_file(&leaf, &dest.repo_path(&rel), ctx) {
            Ok(()) => stats.changed += 1,
            Err(e) => {
                report_failure(ctx, &e);
                stats.failed += 1;
            }
        }
    }
    stats
}

/// Whether the symlink at `link` resolves strictly inside `mapping`.
fn links_into(link: &Path, mapping: &SourceMapping) -> bool {
    std::fs::read_link(link).is_ok_and(|stored| {
        mapping.contains(&canonicalize_lenient(&absolutize_link_target(link, &stored)))
    })
}

fn validate_package(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(DotlinkError::validation(format!(
            "invalid package name {name:?}"
        ))
        .with_hint("use a single directory name such as `zsh` or `nvim`")),
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::context::test_helpers::make_context;
    use crate::operations::test_helpers::{Fail, failing};
    use crate::operations::MockFileSystemOps;
    use crate::patterns::DEFAULT_PATTERNS;
    use std::os::unix::fs::PermissionsExt as _;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixture {
        _dir: tempfile::TempDir,
        repo: PathBuf,
        home: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let base = dunce::canonicalize(dir.path()).unwrap();
            let repo = base.join("repo");
            let home = base.join("home");
            std::fs::create_dir_all(&repo).unwrap();
            std::fs::create_dir_all(&home).unwrap();
            Self {
                _dir: dir,
                repo,
                home,
            }
        }

        fn mapping(&self) -> SourceMapping {
            SourceMapping::new(&self.repo, &self.home)
        }

        fn patterns(&self) -> PatternSet {
            PatternSet::compile(DEFAULT_PATTERNS).unwrap()
        }

        fn home_file(&self, rel: &str, content: &str) -> PathBuf {
            let path = self.home.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, content).unwrap();
            path
        }
    }

    #[test]
    fn adopts_file_and_links_back() {
        let f = Fixture::new();
        let file = f.home_file(".config/app/conf", "settings");
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o600)).unwrap();
        let (ctx, _log) = make_context(&f.home, false);

        let stats = adopt(&file, &f.mapping(), &f.patterns(), &ctx).unwrap();
        assert_eq!(stats.changed, 1);
        let dest = f.repo.join(".config/app/conf");
        assert_eq!(std::fs::read_link(&file).unwrap(), dest);
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "settings");
        let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn readopting_is_a_conflict() {
        let f = Fixture::new();
        let file = f.home_file(".vimrc", "x");
        let (ctx, _log) = make_context(&f.home, false);
        adopt(&file, &f.mapping(), &f.patterns(), &ctx).unwrap();

        let err = adopt(&file, &f.mapping(), &f.patterns(), &ctx).unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::AlreadyAdopted));
    }

    #[test]
    fn path_outside_home_is_rejected() {
        let f = Fixture::new();
        let outside = f.home.parent().unwrap().join("elsewhere");
        std::fs::write(&outside, "x").unwrap();
        let (ctx, _log) = make_context(&f.home, false);

        let err = adopt(&outside, &f.mapping(), &f.patterns(), &ctx).unwrap_err();
        assert!(err.to_string().contains("outside the home directory"));
        assert!(outside.is_file(), "nothing was moved");
    }

    #[test]
    fn existing_destination_is_a_conflict() {
        let f = Fixture::new();
        let file = f.home_file(".zshrc", "home copy");
        std::fs::write(f.repo.join(".zshrc"), "repo copy").unwrap();
        let (ctx, _log) = make_context(&f.home, false);

        let err = adopt(&file, &f.mapping(), &f.patterns(), &ctx).unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::DestinationExists));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "home copy");
    }

    #[test]
    fn dry_run_moves_nothing() {
        let f = Fixture::new();
        let file = f.home_file(".gitconfig", "x");
        let (ctx, log) = make_context(&f.home, true);

        let stats = adopt(&file, &f.mapping(), &f.patterns(), &ctx).unwrap();
        assert_eq!(stats.changed, 1);
        assert!(file.is_file() && !file.is_symlink());
        assert!(!f.repo.join(".gitconfig").exists());
        assert_eq!(log.at("dry_run").len(), 1);
    }

    #[test]
    fn failed_link_restores_the_original() {
        let f = Fixture::new();
        let file = f.home_file(".bashrc", "original");
        let (ctx, _log) = make_context(&f.home, false);
        let ctx = ctx.with_fs_ops(Arc::new(failing(Fail::Symlink)));

        let err = adopt(&file, &f.mapping(), &f.patterns(), &ctx).unwrap_err();
        assert!(matches!(err, DotlinkError::Link { .. }));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "original");
        assert!(!file.is_symlink());
        assert!(!f.repo.join(".bashrc").exists());
    }

    #[test]
    fn cross_device_move_falls_back_to_copy() {
        let f = Fixture::new();
        let file = f.home_file(".inputrc", "payload");
        let (ctx, _log) = make_context(&f.home, false);
        let ctx = ctx.with_fs_ops(Arc::new(failing(Fail::Rename)));

        adopt(&file, &f.mapping(), &f.patterns(), &ctx).unwrap();
        assert_eq!(
            std::fs::read_to_string(f.repo.join(".inputrc")).unwrap(),
            "payload"
        );
        assert!(file.is_symlink());
    }

    #[test]
    fn failed_rollback_is_reported_distinctly() {
        let f = Fixture::new();
        let file = f.home_file(".profile", "data");
        let (ctx, _log) = make_context(&f.home, false);

        let renames = Arc::new(AtomicUsize::new(0));
        let mut ops = MockFileSystemOps::new();
        let counter = Arc::clone(&renames);
        ops.expect_rename().returning(move |a, b| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                std::fs::rename(a, b)
            } else {
                Err(std::io::Error::other("rename back failed"))
            }
        });
        ops.expect_copy_file()
            .returning(|_, _| Err(std::io::Error::other("copy back failed")));
        ops.expect_symlink()
            .returning(|_, _| Err(std::io::Error::other("symlink failed")));
        let ctx = ctx.with_fs_ops(Arc::new(ops));

        let err = adopt(&file, &f.mapping(), &f.patterns(), &ctx).unwrap_err();
        assert!(matches!(err, DotlinkError::RollbackFailed { .. }));
        assert!(err.to_string().contains("missing from both"));
        assert!(err.hint().is_some());
        assert_eq!(renames.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn directory_adoption_is_per_file_and_idempotent() {
        let f = Fixture::new();
        f.home_file(".config/nvim/init.lua", "a");
        f.home_file(".config/nvim/lua/plugins.lua", "b");
        let dir = f.home.join(".config/nvim");
        let (ctx, _log) = make_context(&f.home, false);

        let first = adopt(&dir, &f.mapping(), &f.patterns(), &ctx).unwrap();
        assert_eq!(first.changed, 2);
        assert!(dir.is_dir() && !dir.is_symlink());
        assert!(dir.join("lua/plugins.lua").is_symlink());

        f.home_file(".config/nvim/new.lua", "c");
        let second = adopt(&dir, &f.mapping(), &f.patterns(), &ctx).unwrap();
        assert_eq!(
            second,
            BatchStats {
                changed: 1,
                skipped: 2,
                failed: 0
            }
        );
    }

    #[test]
    fn directory_adoption_leaves_ignored_entries_in_place() {
        let f = Fixture::new();
        f.home_file(".config/nvim/init.lua", "a");
        f.home_file(".config/nvim/.git/objects/ab", "blob");
        f.home_file(".config/nvim/.DS_Store", "junk");
        f.home_file(".config/nvim/lua/old.bak", "b");
        let dir = f.home.join(".config/nvim");
        let patterns = PatternSet::compile(DEFAULT_PATTERNS)
            .unwrap()
            .extend(PatternSet::compile(["*.bak"]).unwrap());
        let (ctx, _log) = make_context(&f.home, false);

        let stats = adopt(&dir, &f.mapping(), &patterns, &ctx).unwrap();
        assert_eq!(
            stats,
            BatchStats {
                changed: 1,
                skipped: 3,
                failed: 0
            }
        );
        assert!(f.repo.join(".config/nvim/init.lua").is_file());
        assert!(!f.repo.join(".config/nvim/.git").exists());
        assert!(!f.repo.join(".config/nvim/.DS_Store").exists());
        assert!(!f.repo.join(".config/nvim/lua/old.bak").exists());
        let blob = dir.join(".git/objects/ab");
        assert!(blob.is_file() && !blob.is_symlink());
    }

    #[test]
    fn ignored_file_is_rejected() {
        let f = Fixture::new();
        let file = f.home_file(".DS_Store", "junk");
        let (ctx, _log) = make_context(&f.home, false);

        let err = adopt(&file, &f.mapping(), &f.patterns(), &ctx).unwrap_err();
        assert!(matches!(err, DotlinkError::Validation { .. }));
        assert!(err.hint().is_some());
        assert!(file.is_file() && !file.is_symlink());
    }

    #[test]
    fn package_prefix_is_part_of_the_matched_path() {
        let f = Fixture::new();
        let file = f.home_file(".zshrc", "z");
        let patterns = PatternSet::compile(["zsh/"]).unwrap();
        let (ctx, _log) = make_context(&f.home, false);

        let stats =
            adopt_paths(&[file.clone()], &f.mapping(), Some("zsh"), &patterns, &ctx).unwrap();
        assert_eq!(stats.failed, 1);
        assert!(!file.is_symlink());

        let stats = adopt_paths(&[file.clone()], &f.mapping(), None, &patterns, &ctx).unwrap();
        assert_eq!(stats.changed, 1);
        assert!(file.is_symlink());
    }

    #[test]
    fn batch_requires_paths() {
        let f = Fixture::new();
        let (ctx, _log) = make_context(&f.home, false);
        let err = adopt_paths(&[], &f.mapping(), None, &f.patterns(), &ctx).unwrap_err();
        assert_eq!(err.to_string(), "no paths specified");
    }

    #[test]
    fn batch_adopts_into_package() {
        let f = Fixture::new();
        let a = f.home_file(".zshrc", "a");
        let b = f.home_file(".zshenv", "b");
        let (ctx, _log) = make_context(&f.home, false);

        let stats =
            adopt_paths(&[a.clone(), b], &f.mapping(), Some("zsh"), &f.patterns(), &ctx).unwrap();
        assert_eq!(stats.changed, 2);
        assert_eq!(std::fs::read_link(&a).unwrap(), f.repo.join("zsh/.zshrc"));
    }

    #[test]
    fn batch_counts_failures_and_continues() {
        let f = Fixture::new();
        let good = f.home_file(".good", "g");
        let missing = f.home.join(".missing");
        let (ctx, _log) = make_context(&f.home, false);

        let paths = [missing, good.clone()];
        let stats = adopt_paths(&paths, &f.mapping(), None, &f.patterns(), &ctx).unwrap();
        assert_eq!(stats.changed, 1);
        assert_eq!(stats.failed, 1);
        assert!(good.is_symlink());
    }

    #[test]
    fn package_names_must_be_plain() {
        assert!(validate_package("zsh").is_ok());
        assert!(validate_package("a/b").is_err());
        assert!(validate_package("..").is_err());
        assert!(validate_package("").is_err());
    }
}
