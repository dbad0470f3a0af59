use crate::domain::{CommitRef, IncrementKind, Version};
use std::fmt;

/// A base version proposed by one strategy for one resolution run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseVersionCandidate {
    pub version: Version,
    /// Commit the version is anchored to
    pub anchor: CommitRef,
    pub should_increment: bool,
    /// Strategy precedence, higher wins ties
    pub priority: u8,
    /// Breadth-first hops from the current commit to `anchor`
    pub distance: usize,
    /// Name of the producing strategy
    pub source: &'static str,
}

/// Result of classifying the commits since the base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Increment {
    pub kind: IncrementKind,
    pub count: usize,
}

/// The resolved version for the current commit
///
/// Immutable once built by the formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveVersion {
    version: semver::Version,
    pre_release_tag: Option<String>,
    commits_since_base: usize,
    short_sha: String,
    sha: String,
    branch: String,
    base_source: &'static str,
}

impl EffectiveVersion {
    pub(crate) fn new(
        version: semver::Version,
        commits_since_base: usize,
        current: &CommitRef,
        short_sha: String,
        branch: String,
        base_source: &'static str,
    ) -> Self {
        let pre_release_tag = if version.pre.is_empty() {
            None
        } else {
            Some(version.pre.to_string())
        };
        EffectiveVersion {
            version,
            pre_release_tag,
            commits_since_base,
            short_sha,
            sha: current.id().to_string(),
            branch,
            base_source,
        }
    }

    pub fn semver(&self) -> &semver::Version {
        &self.version
    }

    /// `major.minor.patch` without pre-release or build metadata
    pub fn major_minor_patch(&self) -> Version {
        Version::new(self.version.major, self.version.minor, self.version.patch)
    }

    pub fn pre_release_tag(&self) -> Option<&str> {
        self.pre_release_tag.as_deref()
    }

    pub fn commits_since_base(&self) -> usize {
        self.commits_since_base
    }

    pub fn short_sha(&self) -> &str {
        &self.short_sha
    }

    pub fn sha(&self) -> &str {
        &self.sha
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Strategy that produced the winning base version
    pub fn base_source(&self) -> &'static str {
        self.base_source
    }
}

impl fmt::Display for EffectiveVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)
    }
}
