//! Matching the current branch to its configuration

use crate::config::{compile_branch_pattern, BranchConfig, Config};
use crate::domain::{BranchContext, IncrementKind};
use crate::error::Result;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// The single branch configuration selected for a run, with `inherit`
/// already resolved to a concrete increment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfiguration {
    /// Short branch name, without `refs/heads/` or remote prefix
    pub branch_name: String,
    /// Name of the matched branch configuration
    pub config_name: String,
    pub increment: IncrementKind,
    pub label: String,
    pub is_release_branch: bool,
    pub tracks_merge_target: bool,
    pub source_branches: Vec<String>,
}

/// First-match-wins lookup over the configured branch patterns
#[derive(Debug)]
pub struct BranchConfigurationResolver {
    branches: Vec<(Regex, BranchConfig)>,
    fallback: BranchConfig,
}

impl BranchConfigurationResolver {
    /// Compile every pattern up front; an invalid one is a configuration error
    pub fn new(config: &Config) -> Result<Self> {
        let branches = config
            .branches
            .iter()
            .map(|branch| Ok((compile_branch_pattern(branch)?, branch.clone())))
            .collect::<Result<Vec<_>>>()?;
        Ok(BranchConfigurationResolver {
            branches,
            fallback: config.default_branch.clone(),
        })
    }

    /// The first configuration whose pattern matches, else the default
    pub fn resolve(&self, branch_name: &str) -> &BranchConfig {
        let branch = BranchContext::new(branch_name);
        self.branches
            .iter()
            .find(|(pattern, _)| pattern.is_match(&branch.name))
            .map(|(_, config)| config)
            .unwrap_or(&self.fallback)
    }

    /// Resolve and flatten into the configuration used for the run
    pub fn effective(&self, branch_name: &str) -> EffectiveConfiguration {
        let branch = BranchContext::new(branch_name);
        let matched = self.resolve(&branch.name);
        let increment = self
            .inherited(matched, &mut HashSet::new())
            .unwrap_or_else(|| self.fallback_increment());
        debug!(
            branch = %branch.name,
            config = %matched.name,
            %increment,
            "resolved branch configuration"
        );
        EffectiveConfiguration {
            branch_name: branch.name,
            config_name: matched.name.clone(),
            increment,
            label: matched.label.clone(),
            is_release_branch: matched.is_release_branch,
            tracks_merge_target: matched.tracks_merge_target,
            source_branches: matched.source_branches.clone(),
        }
    }

    /// Follow `source_branches` until a concrete increment is found
    fn inherited<'a>(
        &'a self,
        config: &'a BranchConfig,
        visited: &mut HashSet<&'a str>,
    ) -> Option<IncrementKind> {
        if let Some(kind) = config.increment.concrete() {
            return Some(kind);
        }
        if !visited.insert(config.name.as_str()) {
            return None;
        }
        config
            .source_branches
            .iter()
            .filter_map(|name| self.by_name(name))
            .find_map(|source| self.inherited(source, visited))
    }

    fn by_name(&self, name: &str) -> Option<&BranchConfig> {
        self.branches
            .iter()
            .map(|(_, config)| config)
            .find(|config| config.name == name)
    }

    fn fallback_increment(&self) -> IncrementKind {
        // Config::validate rejects an inheriting default
        self.fallback.increment.concrete().unwrap_or(IncrementKind::Patch)
    }
}
