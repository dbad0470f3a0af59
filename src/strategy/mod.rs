//! Base version strategies
//!
//! Each strategy looks at the repository independently and proposes zero or
//! more [`BaseVersionCandidate`]s. [`VersionStrategyAggregator`] picks the
//! winner.

pub mod aggregator;
pub mod config_next_version;
pub mod mainline;
pub mod merge_message;
pub mod tagged_commit;

pub use aggregator::{candidate_precedence, VersionStrategyAggregator};
pub use config_next_version::ConfigNextVersionStrategy;
pub use mainline::MainlineStrategy;
pub use merge_message::MergeMessageStrategy;
pub use tagged_commit::TaggedCommitStrategy;

use crate::branch_config::EffectiveConfiguration;
use crate::domain::{BaseVersionCandidate, CommitRef, Version};
use crate::error::{Result, VersionError};
use crate::git::CachedRepository;
use crate::walker::CommitGraphWalker;
use git2::Oid;
use std::cell::OnceCell;
use std::collections::HashMap;

/// Everything a strategy may consult during one run
pub struct StrategyContext<'a, 'r> {
    pub repo: &'a CachedRepository<'r>,
    pub walker: CommitGraphWalker<'a, 'r>,
    pub current: &'a CommitRef,
    pub branch: &'a EffectiveConfiguration,
    distances: OnceCell<HashMap<Oid, usize>>,
}

impl<'a, 'r> StrategyContext<'a, 'r> {
    pub fn new(
        repo: &'a CachedRepository<'r>,
        current: &'a CommitRef,
        branch: &'a EffectiveConfiguration,
    ) -> Self {
        StrategyContext {
            repo,
            walker: CommitGraphWalker::new(repo),
            current,
            branch,
            distances: OnceCell::new(),
        }
    }

    /// Edges from the current commit back to `id`, if `id` is an ancestor.
    ///
    /// The ancestry is walked once per context and shared by every lookup.
    pub fn distance_to(&self, id: Oid) -> Result<Option<usize>> {
        let distances = match self.distances.get() {
            Some(distances) => distances,
            None => {
                let computed = self.walker.distances(self.current)?;
                self.distances.get_or_init(|| computed)
            }
        };
        Ok(distances.get(&id).copied())
    }

    /// Build a candidate for `strategy`, measuring its distance from HEAD
    pub fn candidate(
        &self,
        strategy: &dyn VersionStrategy,
        version: Version,
        anchor: CommitRef,
        should_increment: bool,
    ) -> Result<BaseVersionCandidate> {
        let distance = self.distance_to(anchor.id())?.ok_or_else(|| {
            VersionError::resolution(format!(
                "{} anchored {} outside the history of {}",
                strategy.name(),
                anchor.id(),
                self.current.id()
            ))
        })?;
        Ok(BaseVersionCandidate {
            version,
            anchor,
            should_increment,
            priority: strategy.priority(),
            distance,
            source: strategy.name(),
        })
    }
}

/// A pluggable source of base versions
pub trait VersionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Precedence among candidates with equal version and distance
    fn priority(&self) -> u8;

    fn candidates(&self, ctx: &StrategyContext<'_, '_>) -> Result<Vec<BaseVersionCandidate>>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::branch_config::{BranchConfigurationResolver, EffectiveConfiguration};
    use crate::config::Config;
    use crate::git::{CachedRepository, Repository};
    use crate::retry::RetryPolicy;
    use std::time::Duration;

    pub fn cached(repo: &dyn Repository) -> CachedRepository<'_> {
        CachedRepository::new(
            repo,
            RetryPolicy::with_thread_sleeper(0, Duration::from_millis(1)).unwrap(),
        )
    }

    pub fn branch(config: &Config, name: &str) -> EffectiveConfiguration {
        BranchConfigurationResolver::new(config).unwrap().effective(name)
    }
}
