use super::tagged_commit::TaggedCommitStrategy;
use super::{StrategyContext, VersionStrategy};
use crate::config::{compile_patterns, CommitMessageIncrementing, Config};
use crate::domain::{BaseVersionCandidate, CommitRef, TagPattern, Version};
use crate::error::{Result, VersionError};
use crate::walker::Traversal;
use regex::Regex;
use tracing::debug;

/// Versions embedded in merge commit messages such as
/// `Merge branch 'release/1.4.0'`
#[derive(Debug)]
pub struct MergeMessageStrategy {
    patterns: Vec<Regex>,
    tags: TagPattern,
    enabled: bool,
}

impl MergeMessageStrategy {
    pub const NAME: &'static str = "merge-message";

    pub fn new(config: &Config) -> Result<Self> {
        Ok(MergeMessageStrategy {
            patterns: compile_patterns("merge_message_patterns", &config.merge_message_patterns)?,
            tags: TagPattern::new(&config.tag_prefix)?,
            enabled: config.commit_message_incrementing != CommitMessageIncrementing::Disabled,
        })
    }

    /// Version named by a merge message, first matching pattern wins
    pub fn parse_message(&self, message: &str) -> Option<Version> {
        let subject = message.lines().next().unwrap_or_default();
        self.patterns.iter().find_map(|pattern| {
            let captures = pattern.captures(subject)?;
            Version::parse(captures.name("version")?.as_str()).ok()
        })
    }

    /// Whether the merged parents share any history
    fn parents_related(&self, ctx: &StrategyContext<'_, '_>, merge: &CommitRef) -> Result<bool> {
        let parents = ctx.repo.parents(merge)?;
        let [mainline, merged, ..] = parents.as_slice() else {
            return Ok(false);
        };
        match ctx.walker.merge_base(mainline, merged) {
            Ok(_) => Ok(true),
            Err(VersionError::UnrelatedHistory { .. }) => {
                debug!(merge = %merge.id(), "merged unrelated history, skipping");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

impl VersionStrategy for MergeMessageStrategy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn priority(&self) -> u8 {
        3
    }

    fn candidates(&self, ctx: &StrategyContext<'_, '_>) -> Result<Vec<BaseVersionCandidate>> {
        if !self.enabled {
            return Ok(Vec::new());
        }
        let tagged = TaggedCommitStrategy::versions_by_commit(&self.tags, ctx)?;

        let mut candidates = Vec::new();
        let walk = ctx
            .walker
            .ancestors_until(ctx.current, Traversal::FirstParent, |c| tagged.contains_key(&c.id()));
        for commit in walk {
            let commit = commit?;
            if !commit.is_merge() {
                continue;
            }
            let Some(version) = self.parse_message(commit.message()) else {
                continue;
            };
            if !self.parents_related(ctx, &commit)? {
                continue;
            }
            // The merge itself is the release; anything after it moves on
            let should_increment = commit.id() != ctx.current.id();
            debug!(commit = %commit.id(), %version, "merge message candidate");
            candidates.push(ctx.candidate(self, version, commit, should_increment)?);
        }
        Ok(candidates)
    }
}
