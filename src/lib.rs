//! Deterministic semantic versions from git history
//!
//! [`resolve_version`] reads the current commit, matches the branch against
//! the configured patterns, picks a base version from tags, merge messages
//! or configuration, and bumps it according to the commits since.

pub mod branch_config;
pub mod cache;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod formatter;
pub mod git;
pub mod increment;
pub mod retry;
pub mod strategy;
pub mod ui;
pub mod walker;

pub use config::{load_config, Config};
pub use domain::EffectiveVersion;
pub use engine::{resolve_version, resolve_version_with, ResolveOptions};
pub use error::{Result, VersionError};
pub use git::{Git2Repository, Repository};
