//! Domain types - pure data and rules independent of git access

pub mod branch;
pub mod candidate;
pub mod commit;
pub mod prerelease;
pub mod tag;
pub mod version;

pub use branch::BranchContext;
pub use candidate::{BaseVersionCandidate, EffectiveVersion, Increment};
pub use commit::CommitRef;
pub use prerelease::{Template, TemplateVars};
pub use tag::{TagPattern, TagRef};
pub use version::{IncrementKind, Version};
