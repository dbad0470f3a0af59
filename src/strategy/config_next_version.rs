use super::{StrategyContext, VersionStrategy};
use crate::config::Config;
use crate::domain::{BaseVersionCandidate, Version};
use crate::error::Result;

/// The `next_version` literal from configuration, taken as-is
#[derive(Debug)]
pub struct ConfigNextVersionStrategy {
    next_version: Option<Version>,
}

impl ConfigNextVersionStrategy {
    pub const NAME: &'static str = "config-next-version";

    pub fn new(config: &Config) -> Result<Self> {
        let next_version = config.next_version.as_deref().map(Version::parse).transpose()?;
        Ok(ConfigNextVersionStrategy { next_version })
    }
}

impl VersionStrategy for ConfigNextVersionStrategy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn priority(&self) -> u8 {
        2
    }

    fn candidates(&self, ctx: &StrategyContext<'_, '_>) -> Result<Vec<BaseVersionCandidate>> {
        match self.next_version {
            Some(version) => Ok(vec![ctx.candidate(self, version, ctx.current.clone(), false)?]),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use crate::strategy::test_support::{branch, cached};

    #[test]
    fn test_anchored_at_current_commit() {
        let mut mock = MockRepository::new();
        mock.commits_on_head(&["initial", "work"]);
        let config = Config {
            next_version: Some("3.0.0".to_string()),
            ..Config::default()
        };
        let repo = cached(&mock);
        let head = repo.head().unwrap();
        let effective = branch(&config, "main");
        let ctx = StrategyContext::new(&repo, &head, &effective);

        let candidates = ConfigNextVersionStrategy::new(&config)
            .unwrap()
            .candidates(&ctx)
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].version, Version::new(3, 0, 0));
        assert_eq!(candidates[0].anchor.id(), head.id());
        assert_eq!(candidates[0].distance, 0);
        assert!(!candidates[0].should_increment);
    }

    #[test]
    fn test_absent_without_override() {
        let mut mock = MockRepository::new();
        mock.commit_on_head("initial");
        let config = Config::default();
        let repo = cached(&mock);
        let head = repo.head().unwrap();
        let effective = branch(&config, "main");
        let ctx = StrategyContext::new(&repo, &head, &effective);

        let strategy = ConfigNextVersionStrategy::new(&config).unwrap();
        assert!(strategy.candidates(&ctx).unwrap().is_empty());
    }
}
