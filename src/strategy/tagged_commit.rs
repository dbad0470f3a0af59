use super::{StrategyContext, VersionStrategy};
use crate::config::Config;
use crate::domain::{BaseVersionCandidate, TagPattern, Version};
use crate::error::Result;
use crate::walker::Traversal;
use git2::Oid;
use std::collections::HashMap;
use tracing::debug;

/// Versions taken from tags on the current commit or its ancestors
#[derive(Debug)]
pub struct TaggedCommitStrategy {
    pattern: TagPattern,
}

impl TaggedCommitStrategy {
    pub const NAME: &'static str = "tagged-commit";

    pub fn new(config: &Config) -> Result<Self> {
        Ok(TaggedCommitStrategy {
            pattern: TagPattern::new(&config.tag_prefix)?,
        })
    }

    /// Highest version tag per commit reachable from the current commit
    pub(crate) fn versions_by_commit(
        pattern: &TagPattern,
        ctx: &StrategyContext<'_, '_>,
    ) -> Result<HashMap<Oid, Version>> {
        let mut versions: HashMap<Oid, Version> = HashMap::new();
        for (target, tags) in ctx.repo.tags_by_target(ctx.current)? {
            let best = pattern.annotate(tags).into_iter().filter_map(|t| t.version).max();
            if let Some(version) = best {
                versions.insert(target, version);
            }
        }
        Ok(versions)
    }
}

impl VersionStrategy for TaggedCommitStrategy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn priority(&self) -> u8 {
        4
    }

    fn candidates(&self, ctx: &StrategyContext<'_, '_>) -> Result<Vec<BaseVersionCandidate>> {
        let versions = Self::versions_by_commit(&self.pattern, ctx)?;
        if versions.is_empty() {
            return Ok(Vec::new());
        }

        // Tags on merged branches only count when the branch tracks merge targets
        let traversal = if ctx.branch.tracks_merge_target {
            Traversal::AllParents
        } else {
            Traversal::FirstParent
        };

        let mut candidates = Vec::new();
        for commit in ctx.walker.ancestors(ctx.current, traversal) {
            let commit = commit?;
            let Some(version) = versions.get(&commit.id()) else {
                continue;
            };
            let should_increment = commit.id() != ctx.current.id();
            debug!(commit = %commit.id(), %version, "tagged commit candidate");
            candidates.push(ctx.candidate(self, *version, commit, should_increment)?);
            if candidates.len() == versions.len() {
                break;
            }
        }
        Ok(candidates)
    }
}
