//! A single compiled ignore rule.
use globset::{GlobBuilder, GlobMatcher};

use crate::error::{DotlinkError, Result};

/// How a rule compares against a name or path.
#[derive(Debug, Clone)]
enum Matcher {
    /// Exact string comparison.
    Literal(String),
    /// Compiled shell glob; `*` never crosses `/`.
    Glob(GlobMatcher),
}

impl Matcher {
    fn is_match(&self, candidate: &str) -> bool {
        match self {
            Self::Literal(text) => text == candidate,
            Self::Glob(glob) => glob.is_match(candidate),
        }
    }
}

/// One line of ignore-pattern text, compiled.
///
/// Rules are immutable once built. Blank and `#` lines never produce a rule;
/// see [`IgnoreRule::compile`].
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    is_negation: bool,
    is_dir_only: bool,
    has_path_separator: bool,
    is_glob: bool,
    raw_pattern: String,
    matcher: Matcher,
}

impl IgnoreRule {
    /// Compile one raw pattern line.
    ///
    /// Returns `Ok(None)` for blank lines, comment lines and lines that are
    /// empty once their `!` and slash markers are stripped.
    ///
    /// # Errors
    ///
    /// Returns [`DotlinkError::Validation`] when the glob syntax is invalid
    /// (for example an unclosed `[` class).
    pub fn compile(line: &str) -> Result<Option<Self>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let (is_negation, body) = trimmed
            .strip_prefix('!')
            .map_or((false, trimmed), |rest| (true, rest));
        let (is_dir_only, body) = body
            .strip_suffix('/')
            .map_or((false, body), |rest| (true, rest));
        let (rooted, body) = body
            .strip_prefix('/')
            .map_or((false, body), |rest| (true, rest));
        let body = body.strip_prefix("./").unwrap_or(body);

        if body.is_empty() {
            return Ok(None);
        }

        let has_path_separator = rooted || body.contains('/');
        let is_glob = body.contains(['*', '?', '[']);
        let matcher = if is_glob {
            let glob = GlobBuilder::new(body)
                .literal_separator(true)
                .build()
                .map_err(|e| {
                    DotlinkError::validation(format!("invalid ignore pattern '{trimmed}': {e}"))
                        .with_hint("check for unbalanced '[' or misplaced '**'")
                })?;
            Matcher::Glob(glob.compile_matcher())
        } else {
            Matcher::Literal(body.to_string())
        };

        Ok(Some(Self {
            is_negation,
            is_dir_only,
            has_path_separator,
            is_glob,
            raw_pattern: body.to_string(),
            matcher,
        }))
    }

    /// Pattern began with `!`.
    #[must_use]
    pub const fn is_negation(&self) -> bool {
        self.is_negation
    }

    /// Pattern ended with `/`.
    #[must_use]
    pub const fn is_dir_only(&self) -> bool {
        self.is_dir_only
    }

    /// Pattern is anchored to the full relative path.
    #[must_use]
    pub const fn has_path_separator(&self) -> bool {
        self.has_path_separator
    }

    /// Pattern contains glob metacharacters.
    #[must_use]
    pub const fn is_glob(&self) -> bool {
        self.is_glob
    }

    /// Pattern text with the `!` and slash markers removed.
    #[must_use]
    pub fn raw_pattern(&self) -> &str {
        &self.raw_pattern
    }

    /// Whether this rule applies to `path`, which must already be normalised
    /// (no leading `./`, forward slashes only, no trailing slash).
    ///
    /// Anchored rules test the full path and every ancestor prefix, so
    /// `build/keep` also covers `build/keep/a/b.txt`. Unanchored rules test
    /// every segment, so `node_modules` matches at any depth. Ancestors are
    /// directories by construction; the final component only satisfies a
    /// directory-only rule when `is_dir` is set.
    pub(super) fn applies_to(&self, path: &str, is_dir: bool) -> bool {
        let last_counts = is_dir || !self.is_dir_only;
        if self.has_path_separator {
            if last_counts && self.matcher.is_match(path) {
                return true;
            }
            path.match_indices('/').any(|(idx, _)| {
                path.get(..idx)
                    .is_some_and(|prefix| self.matcher.is_match(prefix))
            })
        } else {
            let mut segments = path.rsplit('/');
            let last = segments.next().unwrap_or_default();
            (last_counts && self.matcher.is_match(last))
                || segments.any(|segment| self.matcher.is_match(segment))
        }
    }

    /// Whether this rule could apply to some path strictly below `dir`.
    ///
    /// Unanchored rules can match a segment at any depth. Anchored rules are
    /// compared on their literal prefix up to the first glob metacharacter.
    pub(super) fn could_match_below(&self, dir: &str) -> bool {
        if !self.has_path_separator {
            return true;
        }
        let literal = self
            .raw_pattern
            .split(['*', '?', '['])
            .next()
            .unwrap_or_default();
        let dir_prefix = format!("{dir}/");
        literal.starts_with(&dir_prefix) || dir_prefix.starts_with(literal)
    }
}
