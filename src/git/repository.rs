use crate::domain::{CommitRef, TagRef};
use crate::error::{Result, VersionError};
use git2::{Oid, Repository as Git2Repo};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Wrapper around git2::Repository with our trait interface
///
/// `git2::Repository` is `Send` but not `Sync`; the mutex serialises access
/// so the adapter can be shared between threads.
pub struct Git2Repository {
    repo: Mutex<Git2Repo>,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;
        Ok(Git2Repository::from_git2(repo))
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository {
            repo: Mutex::new(repo),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Git2Repo> {
        self.repo.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn to_commit_ref(commit: &git2::Commit<'_>) -> CommitRef {
    CommitRef::new(
        commit.id(),
        commit.parent_ids().collect(),
        commit.message().unwrap_or_default(),
        commit.author().when().seconds(),
    )
}

impl super::Repository for Git2Repository {
    fn head_commit(&self) -> Result<CommitRef> {
        let repo = self.lock();
        let commit = repo.head()?.peel_to_commit()?;
        Ok(to_commit_ref(&commit))
    }

    fn find_commit(&self, id: Oid) -> Result<CommitRef> {
        let repo = self.lock();
        let commit = match repo.find_commit(id) {
            Ok(commit) => Ok(to_commit_ref(&commit)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Err(VersionError::CommitNotFound(id)),
            Err(e) => Err(e.into()),
        };
        commit
    }

    fn tags_reachable_from(&self, commit: &CommitRef) -> Result<Vec<TagRef>> {
        let repo = self.lock();
        let names = repo.tag_names(None)?;
        let mut tags = Vec::new();

        for name in names.iter().flatten() {
            let reference = repo.find_reference(&format!("refs/tags/{}", name))?;
            // Tags on trees or blobs are not versions of anything
            let target = match reference.peel_to_commit() {
                Ok(target) => target.id(),
                Err(e) if e.code() == git2::ErrorCode::Peel => continue,
                Err(e) if e.class() == git2::ErrorClass::Object => continue,
                Err(e) => return Err(e.into()),
            };
            if target == commit.id() || repo.graph_descendant_of(commit.id(), target)? {
                tags.push(TagRef::new(name, target));
            }
        }

        tags.sort_by(|a, b| a.name.cmp(&b.name));
        trace!(commit = %commit.id(), count = tags.len(), "tags reachable");
        Ok(tags)
    }

    fn current_branch_name(&self) -> Result<String> {
        let repo = self.lock();
        if repo.head_detached()? {
            return Ok("HEAD".to_string());
        }
        let head = repo.head()?;
        Ok(head.shorthand().unwrap_or("HEAD").to_string())
    }
}
