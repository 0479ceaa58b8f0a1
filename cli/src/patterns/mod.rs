//! Gitignore-style ignore patterns.
//!
//! A [`PatternSet`] is compiled once per command and queried for every entry
//! of every tree walk. Rules are evaluated in order and the last rule that
//! applies decides the verdict, so a later `!pattern` re-includes what an
//! earlier rule excluded and a later plain pattern excludes it again.
//!
//! ```
//! use dotlink::patterns::PatternSet;
//!
//! let set = PatternSet::compile(["*.log", "!keep.log"]).unwrap();
//! assert!(set.matches("debug.log"));
//! assert!(!set.matches("keep.log"));
//! ```
mod rule;

pub use rule::IgnoreRule;

use std::borrow::Cow;

use crate::error::Result;

/// Patterns every repository ignores before any configured rule is applied.
pub const DEFAULT_PATTERNS: &[&str] = &[
    ".git",
    ".gitignore",
    ".gitmodules",
    ".DS_Store",
    "README*",
    "LICENSE*",
    "dotlink.toml",
    ".dotlinkignore",
];

/// An ordered, immutable sequence of compiled [`IgnoreRule`]s.
///
/// Evaluation is deterministic and side-effect free, so one set can be
/// shared across an entire walk.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    rules: Vec<IgnoreRule>,
}

impl PatternSet {
    /// Compile raw pattern lines in order.
    ///
    /// Blank lines and `#` comments are dropped.
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first pattern with invalid glob
    /// syntax.
    pub fn compile<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for pattern in patterns {
            if let Some(rule) = IgnoreRule::compile(pattern.as_ref())? {
                rules.push(rule);
            }
        }
        Ok(Self { rules })
    }

    /// Parse the contents of an ignore file (one pattern per line).
    ///
    /// # Errors
    ///
    /// Returns a validation error for the first line with invalid glob syntax.
    pub fn parse(text: &str) -> Result<Self> {
        Self::compile(text.lines())
    }

    /// Append the rules of `other` after this set's rules.
    #[must_use]
    pub fn extend(mut self, other: Self) -> Self {
        self.rules.extend(other.rules);
        self
    }

    /// Compiled rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// Number of compiled rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `path` (relative to the walk root) is ignored.
    ///
    /// The file type of `path` is unknown here, so directory-only rules are
    /// allowed to match its final component. Walkers that know the type use
    /// [`PatternSet::matches_entry`].
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.matches_entry(path, true)
    }

    /// Whether the entry at `path` is ignored, given whether it is a
    /// directory. A directory-only rule such as `logs/` never ignores a
    /// regular file named `logs`.
    ///
    /// ```
    /// use dotlink::patterns::PatternSet;
    ///
    /// let set = PatternSet::compile(["logs/"]).unwrap();
    /// assert!(set.matches_entry("logs", true));
    /// assert!(!set.matches_entry("logs", false));
    /// assert!(set.matches_entry("logs/today.txt", false));
    /// ```
    #[must_use]
    pub fn matches_entry(&self, path: &str, is_dir: bool) -> bool {
        let normalized = normalize(path);
        if normalized.is_empty() {
            return false;
        }
        self.last_applying(&normalized, is_dir)
            .is_some_and(|rule| !rule.is_negation())
    }

    /// Whether a walker may skip the whole subtree of directory `dir`.
    ///
    /// True when `dir` is ignored and no negation evaluated after the rule
    /// that ignores it could apply to anything below it. The rule that
    /// ignores a directory also applies to all of its descendants, so only
    /// later negations can change their verdict.
    #[must_use]
    pub fn can_skip_dir(&self, dir: &str) -> bool {
        let normalized = normalize(dir);
        if normalized.is_empty() {
            return false;
        }
        let Some(index) = self
            .rules
            .iter()
            .rposition(|rule| rule.applies_to(&normalized, true))
        else {
            return false;
        };
        let ignored = self
            .rules
            .get(index)
            .is_some_and(|rule| !rule.is_negation());
        ignored
            && !self
                .rules
                .iter()
                .skip(index + 1)
                .any(|rule| rule.is_negation() && rule.could_match_below(&normalized))
    }

    fn last_applying(&self, path: &str, is_dir: bool) -> Option<&IgnoreRule> {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.applies_to(path, is_dir))
    }
}

/// Normalise a candidate path: backslashes become `/`, leading `./` and
/// surrounding slashes are removed.
fn normalize(path: &str) -> Cow<'_, str> {
    let converted: Cow<'_, str> = if path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    };
    let mut trimmed: &str = &converted;
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    let trimmed = trimmed.trim_matches('/');
    if trimmed.len() == converted.len() {
        converted
    } else {
        Cow::Owned(trimmed.to_string())
    }
}
