use crate::domain::{CommitRef, TagRef};
use crate::error::{Result, VersionError};
use crate::git::Repository;
use git2::Oid;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory repository for tests
///
/// Commits get deterministic identities from an internal counter. Every
/// new commit moves HEAD, like `git commit` would.
pub struct MockRepository {
    commits: HashMap<Oid, CommitRef>,
    tags: Vec<TagRef>,
    head: Option<Oid>,
    branch: String,
    next_id: u64,
    fail_next: AtomicUsize,
    find_commit_calls: AtomicUsize,
    tag_queries: AtomicUsize,
}

impl MockRepository {
    /// Create a new empty mock repository on branch `main`
    pub fn new() -> Self {
        MockRepository {
            commits: HashMap::new(),
            tags: Vec::new(),
            head: None,
            branch: "main".to_string(),
            next_id: 1,
            fail_next: AtomicUsize::new(0),
            find_commit_calls: AtomicUsize::new(0),
            tag_queries: AtomicUsize::new(0),
        }
    }

    /// Add a commit with the given parents and move HEAD to it
    pub fn commit(&mut self, message: &str, parents: &[Oid]) -> Oid {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&self.next_id.to_be_bytes());
        bytes[0] = 0xc0;
        let id = Oid::from_bytes(&bytes).unwrap_or_else(|_| Oid::zero());
        let timestamp = 1_700_000_000 + self.next_id as i64 * 60;
        self.next_id += 1;

        self.commits
            .insert(id, CommitRef::new(id, parents.to_vec(), message, timestamp));
        self.head = Some(id);
        id
    }

    /// Add a commit on top of HEAD (or a root commit if empty)
    pub fn commit_on_head(&mut self, message: &str) -> Oid {
        let parents: Vec<Oid> = self.head.into_iter().collect();
        self.commit(message, &parents)
    }

    /// Add a linear chain of commits on top of HEAD, returning them in order
    pub fn commits_on_head(&mut self, messages: &[&str]) -> Vec<Oid> {
        messages.iter().map(|m| self.commit_on_head(m)).collect()
    }

    /// Add a tag pointing to a commit
    pub fn tag(&mut self, name: impl Into<String>, target: Oid) {
        self.tags.push(TagRef::new(name, target));
    }

    pub fn set_head(&mut self, id: Oid) {
        self.head = Some(id);
    }

    pub fn set_branch(&mut self, name: impl Into<String>) {
        self.branch = name.into();
    }

    /// Make the next `count` lookups fail with a transient error
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Number of `find_commit` calls that reached this repository
    pub fn find_commit_calls(&self) -> usize {
        self.find_commit_calls.load(Ordering::SeqCst)
    }

    /// Number of `tags_reachable_from` calls that reached this repository
    pub fn tag_queries(&self) -> usize {
        self.tag_queries.load(Ordering::SeqCst)
    }

    fn injected_failure(&self, operation: &str) -> Result<()> {
        let consumed = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match consumed {
            Ok(_) => Err(VersionError::transient(operation, "injected lock contention")),
            Err(_) => Ok(()),
        }
    }

    fn ancestors(&self, start: Oid) -> HashSet<Oid> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(commit) = self.commits.get(&id) {
                queue.extend(commit.parent_ids().iter().copied());
            }
        }
        seen
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn head_commit(&self) -> Result<CommitRef> {
        self.injected_failure("head commit")?;
        let head = self
            .head
            .ok_or_else(|| VersionError::resolution("repository has no commits"))?;
        self.commits
            .get(&head)
            .cloned()
            .ok_or(VersionError::CommitNotFound(head))
    }

    fn find_commit(&self, id: Oid) -> Result<CommitRef> {
        self.find_commit_calls.fetch_add(1, Ordering::SeqCst);
        self.injected_failure("find commit")?;
        self.commits
            .get(&id)
            .cloned()
            .ok_or(VersionError::CommitNotFound(id))
    }

    fn tags_reachable_from(&self, commit: &CommitRef) -> Result<Vec<TagRef>> {
        self.tag_queries.fetch_add(1, Ordering::SeqCst);
        self.injected_failure("read tags")?;
        let reachable = self.ancestors(commit.id());
        Ok(self
            .tags
            .iter()
            .filter(|tag| reachable.contains(&tag.target))
            .cloned()
            .collect())
    }

    fn current_branch_name(&self) -> Result<String> {
        Ok(self.branch.clone())
    }
}
