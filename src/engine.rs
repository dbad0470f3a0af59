//! End-to-end version resolution

use crate::branch_config::BranchConfigurationResolver;
use crate::config::Config;
use crate::domain::EffectiveVersion;
use crate::error::Result;
use crate::formatter::VersionFormatter;
use crate::git::{CachedRepository, Repository};
use crate::increment::IncrementCalculator;
use crate::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use crate::strategy::{StrategyContext, VersionStrategyAggregator};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Per-call settings that are not part of the configuration document
#[derive(Clone)]
pub struct ResolveOptions {
    /// Use this branch name instead of the one the repository reports
    pub branch_override: Option<String>,
    pub sleeper: Arc<dyn Sleeper>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ResolveOptions {
            branch_override: None,
            sleeper: Arc::new(ThreadSleeper),
        }
    }
}

/// Resolve the version of the repository's current commit
pub fn resolve_version(repo: &dyn Repository, config: &Config) -> Result<EffectiveVersion> {
    resolve_version_with(repo, config, &ResolveOptions::default())
}

/// [`resolve_version`] with explicit options.
///
/// Each call builds its own cache, so concurrent calls never share state.
#[instrument(skip_all, fields(branch_override = options.branch_override.as_deref()))]
pub fn resolve_version_with(
    repo: &dyn Repository,
    config: &Config,
    options: &ResolveOptions,
) -> Result<EffectiveVersion> {
    config.validate()?;
    let retry = RetryPolicy::new(
        Some(Arc::clone(&options.sleeper)),
        config.retry.max_retries,
        Duration::from_millis(config.retry.base_delay_ms),
    )?;
    let resolver = BranchConfigurationResolver::new(config)?;
    let aggregator = VersionStrategyAggregator::from_config(config)?;
    let calculator = IncrementCalculator::new(config)?;
    let formatter = VersionFormatter::new(&config.format);

    let cached = CachedRepository::new(repo, retry);
    let current = cached.head()?;
    let branch_name = match &options.branch_override {
        Some(name) => name.clone(),
        None => cached.branch_name()?,
    };
    let branch = resolver.effective(&branch_name);

    let ctx = StrategyContext::new(&cached, &current, &branch);
    let base = aggregator.aggregate(&ctx)?;
    let increment = calculator.increment_since(&ctx.walker, &base, &current, branch.increment)?;
    let version = formatter.format(&base, increment, &branch, &current)?;

    let stats = cached.stats();
    debug!(hits = stats.hits, misses = stats.misses, "repository cache");
    info!(
        version = %version,
        base = %base.version,
        source = base.source,
        increment = %increment.kind,
        "resolved version"
    );
    Ok(version)
}
