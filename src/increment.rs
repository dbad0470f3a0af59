//! Classifying the commits between a base version and the current commit

use crate::config::{compile_patterns, CommitMessageIncrementing, Config};
use crate::domain::{BaseVersionCandidate, CommitRef, Increment, IncrementKind};
use crate::error::Result;
use crate::walker::{CommitGraphWalker, Traversal};
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Compiled commit-message triggers, most severe first
#[derive(Debug)]
pub struct IncrementCalculator {
    triggers: Vec<(IncrementKind, Vec<Regex>)>,
    mode: CommitMessageIncrementing,
}

impl IncrementCalculator {
    pub fn new(config: &Config) -> Result<Self> {
        let patterns = &config.increments;
        let triggers = vec![
            (IncrementKind::Major, compile_patterns("increments.major", &patterns.major)?),
            (IncrementKind::Minor, compile_patterns("increments.minor", &patterns.minor)?),
            (IncrementKind::Patch, compile_patterns("increments.patch", &patterns.patch)?),
            (IncrementKind::None, compile_patterns("increments.none", &patterns.none)?),
        ];
        Ok(IncrementCalculator {
            triggers,
            mode: config.commit_message_incrementing,
        })
    }

    /// The most severe trigger in one commit message, if any
    pub fn classify(&self, message: &str) -> Option<IncrementKind> {
        self.triggers
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| p.is_match(message)))
            .map(|(kind, _)| *kind)
    }

    /// Count and classify the commits reachable from `current` but not from
    /// the base anchor (the base itself excluded).
    ///
    /// When no commit carries a trigger, `branch_increment` applies. A base
    /// that must not be incremented, or an empty range, yields `none`.
    pub fn increment_since(
        &self,
        walker: &CommitGraphWalker<'_, '_>,
        base: &BaseVersionCandidate,
        current: &CommitRef,
        branch_increment: IncrementKind,
    ) -> Result<Increment> {
        let range = self.commits_in_range(walker, &base.anchor, current)?;
        let count = range.len();

        let kind = if !base.should_increment || count == 0 {
            IncrementKind::None
        } else {
            self.triggered(&range).unwrap_or(branch_increment)
        };
        debug!(
            base = %base.version,
            count,
            %kind,
            should_increment = base.should_increment,
            "computed increment"
        );
        Ok(Increment { kind, count })
    }

    fn triggered(&self, commits: &[CommitRef]) -> Option<IncrementKind> {
        commits
            .iter()
            .filter(|commit| match self.mode {
                CommitMessageIncrementing::Enabled => true,
                CommitMessageIncrementing::Disabled => false,
                CommitMessageIncrementing::MergeMessageOnly => commit.is_merge(),
            })
            .filter_map(|commit| self.classify(commit.message()))
            .max()
    }

    /// Equivalent of `git log base..current`
    fn commits_in_range(
        &self,
        walker: &CommitGraphWalker<'_, '_>,
        base: &CommitRef,
        current: &CommitRef,
    ) -> Result<Vec<CommitRef>> {
        if base.id() == current.id() {
            return Ok(Vec::new());
        }
        let excluded = walker
            .ancestors(base, Traversal::AllParents)
            .map(|commit| commit.map(|c| c.id()))
            .collect::<Result<HashSet<_>>>()?;

        walker
            .ancestors_until(current, Traversal::AllParents, |c| excluded.contains(&c.id()))
            .filter(|commit| match commit {
                Ok(c) => !excluded.contains(&c.id()),
                Err(_) => true,
            })
            .collect()
    }
}
