//! Repository access abstraction layer
//!
//! The engine reads history only through the [`Repository`] trait. Two
//! implementations ship with the crate:
//!
//! - [`repository::Git2Repository`]: backed by the `git2` crate
//! - [`mock::MockRepository`]: an in-memory graph for tests
//!
//! During a run every query goes through [`cached::CachedRepository`], which
//! adds memoization and retry on top of whichever implementation is used.

pub mod cached;
pub mod mock;
pub mod repository;

pub use cached::CachedRepository;
pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::{CommitRef, TagRef};
use crate::error::Result;
use git2::Oid;

/// Read-only view of a repository
///
/// ## Thread Safety
///
/// Implementors must be `Send + Sync` so one adapter can serve concurrent
/// lookups within a run.
///
/// ## Error Handling
///
/// Lock contention and short reads should surface as errors for which
/// [`crate::error::VersionError::is_transient`] returns `true`; the caching
/// layer retries those.
pub trait Repository: Send + Sync {
    /// The commit HEAD points at
    fn head_commit(&self) -> Result<CommitRef>;

    /// Look up one commit by identity
    fn find_commit(&self, id: Oid) -> Result<CommitRef>;

    /// Parents of `commit` in recorded order, empty for a root commit
    fn parents_of(&self, commit: &CommitRef) -> Result<Vec<CommitRef>> {
        commit
            .parent_ids()
            .iter()
            .map(|id| self.find_commit(*id))
            .collect()
    }

    /// Tags pointing at `commit` or at any of its ancestors
    ///
    /// Annotated tags are peeled to the commit they reference.
    fn tags_reachable_from(&self, commit: &CommitRef) -> Result<Vec<TagRef>>;

    /// Name of the checked-out branch (`HEAD` when detached)
    fn current_branch_name(&self) -> Result<String>;
}
