use super::{StrategyContext, VersionStrategy};
use crate::config::Config;
use crate::domain::{BaseVersionCandidate, Version};
use crate::error::Result;

/// `initial_version` at the start of the mainline, incremented by the
/// history on top of it
#[derive(Debug)]
pub struct MainlineStrategy {
    initial_version: Version,
}

impl MainlineStrategy {
    pub const NAME: &'static str = "mainline";

    pub fn new(config: &Config) -> Result<Self> {
        Ok(MainlineStrategy {
            initial_version: Version::parse(&config.initial_version)?,
        })
    }
}

impl VersionStrategy for MainlineStrategy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn priority(&self) -> u8 {
        1
    }

    fn candidates(&self, ctx: &StrategyContext<'_, '_>) -> Result<Vec<BaseVersionCandidate>> {
        let root = ctx.walker.first_parent_root(ctx.current)?;
        Ok(vec![ctx.candidate(self, self.initial_version, root, true)?])
    }
}
