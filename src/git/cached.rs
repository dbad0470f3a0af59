use crate::cache::{CacheStats, RepositoryQueryCache};
use crate::domain::{CommitRef, TagRef};
use crate::error::Result;
use crate::git::Repository;
use crate::retry::RetryPolicy;
use git2::Oid;
use std::collections::HashMap;

/// One run's view of a repository: memoized, with transient failures retried
///
/// A lookup is `cache.get_or_compute(key, || retry.run(|| adapter call))`, so
/// retries happen inside the single computation for a key and a failure
/// that exhausts its retries is not remembered.
pub struct CachedRepository<'r> {
    repo: &'r dyn Repository,
    cache: RepositoryQueryCache,
    retry: RetryPolicy,
}

impl<'r> CachedRepository<'r> {
    pub fn new(repo: &'r dyn Repository, retry: RetryPolicy) -> Self {
        CachedRepository {
            repo,
            cache: RepositoryQueryCache::new(),
            retry,
        }
    }

    /// The commit HEAD points at; also seeds the commit cache
    pub fn head(&self) -> Result<CommitRef> {
        let head = self.retry.run("read HEAD", || self.repo.head_commit())?;
        self.cache
            .commits
            .get_or_compute(head.id(), || Ok(head.clone()))
    }

    pub fn branch_name(&self) -> Result<String> {
        self.retry
            .run("read branch name", || self.repo.current_branch_name())
    }

    pub fn commit(&self, id: Oid) -> Result<CommitRef> {
        self.cache.commits.get_or_compute(id, || {
            self.retry.run("find commit", || self.repo.find_commit(id))
        })
    }

    /// Parents in recorded order.
    ///
    /// Served from the commit cache when every parent is already there,
    /// otherwise read in one adapter call and stored.
    pub fn parents(&self, commit: &CommitRef) -> Result<Vec<CommitRef>> {
        let ids = commit.parent_ids();
        if ids.iter().all(|id| self.cache.commits.contains(id)) {
            return ids.iter().map(|id| self.commit(*id)).collect();
        }
        let parents = self
            .retry
            .run("read parents", || self.repo.parents_of(commit))?;
        parents
            .into_iter()
            .map(|parent| self.cache.commits.get_or_compute(parent.id(), || Ok(parent)))
            .collect()
    }

    pub fn tags_reachable_from(&self, commit: &CommitRef) -> Result<Vec<TagRef>> {
        self.cache.tags.get_or_compute(commit.id(), || {
            self.retry
                .run("read tags", || self.repo.tags_reachable_from(commit))
        })
    }

    /// Tags reachable from `commit`, grouped by the commit they point at
    pub fn tags_by_target(&self, commit: &CommitRef) -> Result<HashMap<Oid, Vec<TagRef>>> {
        let mut by_target: HashMap<Oid, Vec<TagRef>> = HashMap::new();
        for tag in self.tags_reachable_from(commit)? {
            by_target.entry(tag.target).or_default().push(tag);
        }
        Ok(by_target)
    }

    pub fn cache(&self) -> &RepositoryQueryCache {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
