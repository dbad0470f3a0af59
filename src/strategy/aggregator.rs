use super::{
    ConfigNextVersionStrategy, MainlineStrategy, MergeMessageStrategy, StrategyContext,
    TaggedCommitStrategy, VersionStrategy,
};
use crate::config::{Config, StrategyKind};
use crate::domain::{BaseVersionCandidate, Version};
use crate::error::{Result, VersionError};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Version used when no strategy proposes anything
pub const FALLBACK_VERSION: Version = Version {
    major: 0,
    minor: 1,
    patch: 0,
};

/// Ordering used to pick the winning candidate; the greatest wins.
///
/// Higher version first, then the anchor nearest the current commit, then
/// strategy priority. Anchor identity settles anything left so the choice
/// never depends on strategy output order.
pub fn candidate_precedence(a: &BaseVersionCandidate, b: &BaseVersionCandidate) -> Ordering {
    a.version
        .cmp(&b.version)
        .then_with(|| b.distance.cmp(&a.distance))
        .then_with(|| a.priority.cmp(&b.priority))
        .then_with(|| b.anchor.id().cmp(&a.anchor.id()))
}

/// Runs every enabled strategy and selects one base version
pub struct VersionStrategyAggregator {
    strategies: Vec<Box<dyn VersionStrategy>>,
}

impl VersionStrategyAggregator {
    pub fn new(strategies: Vec<Box<dyn VersionStrategy>>) -> Self {
        VersionStrategyAggregator { strategies }
    }

    /// Strategies listed in `config.strategies`, duplicates ignored
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut strategies: Vec<Box<dyn VersionStrategy>> = Vec::new();
        for kind in &config.strategies {
            if !seen.insert(*kind) {
                continue;
            }
            let strategy: Box<dyn VersionStrategy> = match kind {
                StrategyKind::TaggedCommit => Box::new(TaggedCommitStrategy::new(config)?),
                StrategyKind::MergeMessage => Box::new(MergeMessageStrategy::new(config)?),
                StrategyKind::ConfigNextVersion => Box::new(ConfigNextVersionStrategy::new(config)?),
                StrategyKind::Mainline => Box::new(MainlineStrategy::new(config)?),
            };
            strategies.push(strategy);
        }
        Ok(VersionStrategyAggregator::new(strategies))
    }

    #[instrument(skip_all, fields(current = %ctx.current.id()))]
    pub fn aggregate(&self, ctx: &StrategyContext<'_, '_>) -> Result<BaseVersionCandidate> {
        let mut candidates = Vec::new();
        for strategy in &self.strategies {
            match strategy.candidates(ctx) {
                Ok(found) => {
                    debug!(strategy = strategy.name(), count = found.len(), "strategy finished");
                    candidates.extend(found);
                }
                // No shared history means no base from this strategy
                Err(VersionError::UnrelatedHistory { left, right }) => {
                    debug!(strategy = strategy.name(), %left, %right, "unrelated history");
                }
                Err(e) => return Err(e),
            }
        }

        match candidates.into_iter().max_by(candidate_precedence) {
            Some(winner) => {
                debug!(
                    source = winner.source,
                    version = %winner.version,
                    anchor = %winner.anchor.id(),
                    "selected base version"
                );
                Ok(winner)
            }
            None => self.fallback(ctx),
        }
    }

    fn fallback(&self, ctx: &StrategyContext<'_, '_>) -> Result<BaseVersionCandidate> {
        let root = ctx.walker.first_parent_root(ctx.current)?;
        let distance = ctx.distance_to(root.id())?.unwrap_or_default();
        debug!(root = %root.id(), "no candidates, using fallback version");
        Ok(BaseVersionCandidate {
            version: FALLBACK_VERSION,
            anchor: root,
            should_increment: false,
            priority: 0,
            distance,
            source: "fallback",
        })
    }
}
