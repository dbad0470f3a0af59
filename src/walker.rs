//! Ancestry traversal over the cached repository view
//!
//! Walks are breadth-first and lazy: parents are fetched only when the
//! iterator reaches them. Every walk keeps an identity seen-set, so a
//! malformed graph with a cycle still terminates.

use crate::domain::CommitRef;
use crate::error::{Result, VersionError};
use crate::git::CachedRepository;
use crate::cache::RepositoryQueryCache;
use git2::Oid;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::trace;

/// Which parent edges a walk follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Mainline history only
    FirstParent,
    /// Every parent, including merged branches
    AllParents,
}

impl Traversal {
    fn edges(self, commit: &CommitRef) -> &[Oid] {
        match self {
            Traversal::FirstParent => {
                let parents = commit.parent_ids();
                &parents[..parents.len().min(1)]
            }
            Traversal::AllParents => commit.parent_ids(),
        }
    }
}

/// Graph queries built on [`CachedRepository`]
#[derive(Clone, Copy)]
pub struct CommitGraphWalker<'a, 'r> {
    repo: &'a CachedRepository<'r>,
}

impl<'a, 'r> CommitGraphWalker<'a, 'r> {
    pub fn new(repo: &'a CachedRepository<'r>) -> Self {
        CommitGraphWalker { repo }
    }

    /// Lazily enumerate `start` and its ancestors.
    ///
    /// A commit for which `stop` returns `true` is still yielded, but the
    /// walk does not continue past it along that path.
    pub fn ancestors_until<P>(&self, start: &CommitRef, traversal: Traversal, stop: P) -> Ancestors<'a, 'r, P>
    where
        P: FnMut(&CommitRef) -> bool,
    {
        Ancestors {
            repo: self.repo,
            queue: VecDeque::from([start.id()]),
            seen: HashSet::from([start.id()]),
            traversal,
            stop,
            failed: false,
        }
    }

    /// Enumerate every ancestor reachable through `traversal`
    pub fn ancestors(&self, start: &CommitRef, traversal: Traversal) -> Ancestors<'a, 'r, fn(&CommitRef) -> bool> {
        fn never(_: &CommitRef) -> bool {
            false
        }
        self.ancestors_until(start, traversal, never as fn(&CommitRef) -> bool)
    }

    /// The root reached by following first parents from `start`
    pub fn first_parent_root(&self, start: &CommitRef) -> Result<CommitRef> {
        let mut last = start.clone();
        for commit in self.ancestors(start, Traversal::FirstParent) {
            last = commit?;
        }
        Ok(last)
    }

    /// Fewest parent edges from `from` back to each of its ancestors,
    /// `from` itself at zero
    pub fn distances(&self, from: &CommitRef) -> Result<HashMap<Oid, usize>> {
        let mut depths = HashMap::from([(from.id(), 0)]);
        let mut queue = VecDeque::from([(from.clone(), 0)]);
        while let Some((commit, depth)) = queue.pop_front() {
            for parent in commit.parent_ids() {
                if depths.contains_key(parent) {
                    continue;
                }
                depths.insert(*parent, depth + 1);
                queue.push_back((self.repo.commit(*parent)?, depth + 1));
            }
        }
        trace!(from = %from.id(), count = depths.len(), "distances");
        Ok(depths)
    }

    /// Nearest common ancestor of `a` and `b`.
    ///
    /// Fails with [`VersionError::UnrelatedHistory`] when the histories share
    /// no commit. Results, including "unrelated", are memoized per pair.
    pub fn merge_base(&self, a: &CommitRef, b: &CommitRef) -> Result<CommitRef> {
        let key = RepositoryQueryCache::merge_base_key(a.id(), b.id());
        let base = self
            .repo
            .cache()
            .merge_bases
            .get_or_compute(key, || self.search_merge_base(a, b))?;
        match base {
            Some(id) => self.repo.commit(id),
            None => Err(VersionError::UnrelatedHistory {
                left: a.id(),
                right: b.id(),
            }),
        }
    }

    /// Best common ancestor, as `git merge-base` picks it.
    ///
    /// Every commit reached from `b` that is also an ancestor of `a` is a
    /// common ancestor; the walk from `b` stops at the first such commit on
    /// each path. Candidates reachable from another candidate are then
    /// dropped, and among the rest the newest wins.
    fn search_merge_base(&self, a: &CommitRef, b: &CommitRef) -> Result<Option<Oid>> {
        if a.id() == b.id() {
            return Ok(Some(a.id()));
        }
        let left = self
            .ancestors(a, Traversal::AllParents)
            .map(|commit| commit.map(|c| c.id()))
            .collect::<Result<HashSet<_>>>()?;

        let mut candidates = Vec::new();
        for commit in self.ancestors_until(b, Traversal::AllParents, |c| left.contains(&c.id())) {
            let commit = commit?;
            if left.contains(&commit.id()) {
                candidates.push(commit);
            }
        }

        let redundant = self.strict_ancestors_of(&candidates)?;
        candidates.retain(|c| !redundant.contains(&c.id()));
        let best = candidates
            .into_iter()
            .max_by(|x, y| (x.timestamp(), x.id()).cmp(&(y.timestamp(), y.id())))
            .map(|c| c.id());
        if let Some(base) = best {
            trace!(left = %a.id(), right = %b.id(), %base, "merge base");
        }
        Ok(best)
    }

    /// Every commit reachable from the parents of `commits`
    fn strict_ancestors_of(&self, commits: &[CommitRef]) -> Result<HashSet<Oid>> {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<Oid> = commits
            .iter()
            .flat_map(|c| c.parent_ids().iter().copied())
            .collect();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            queue.extend(self.repo.commit(id)?.parent_ids());
        }
        Ok(seen)
    }
}

/// Lazy breadth-first ancestry iterator returned by
/// [`CommitGraphWalker::ancestors_until`]
///
/// Finite by construction; stops after the first lookup error.
pub struct Ancestors<'a, 'r, P> {
    repo: &'a CachedRepository<'r>,
    queue: VecDeque<Oid>,
    seen: HashSet<Oid>,
    traversal: Traversal,
    stop: P,
    failed: bool,
}

impl<P> Iterator for Ancestors<'_, '_, P>
where
    P: FnMut(&CommitRef) -> bool,
{
    type Item = Result<CommitRef>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let id = self.queue.pop_front()?;
        let commit = match self.repo.commit(id) {
            Ok(commit) => commit,
            Err(e) => {
                self.failed = true;
                return Some(Err(e));
            }
        };
        if !(self.stop)(&commit) {
            for parent in self.traversal.edges(&commit) {
                if self.seen.insert(*parent) {
                    self.queue.push_back(*parent);
                }
            }
        }
        Some(Ok(commit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TagRef;
    use crate::git::{MockRepository, Repository};
    use crate::retry::RetryPolicy;
    use std::time::Duration;

    fn cached(repo: &dyn Repository) -> CachedRepository<'_> {
        CachedRepository::new(
            repo,
            RetryPolicy::with_thread_sleeper(0, Duration::from_millis(1)).unwrap(),
        )
    }

    fn messages(walk: impl Iterator<Item = Result<CommitRef>>) -> Vec<String> {
        walk.map(|c| c.unwrap().message().to_string()).collect()
    }

    /// root - a1 - a2 - a3 - merge
    ///    \              /
    ///     b1 --- b2 ---
    fn merged_history() -> (MockRepository, HashMap<&'static str, Oid>) {
        let mut repo = MockRepository::new();
        let root = repo.commit_on_head("root");
        let a1 = repo.commit("a1", &[root]);
        let a2 = repo.commit("a2", &[a1]);
        let a3 = repo.commit("a3", &[a2]);
        let b1 = repo.commit("b1", &[root]);
        let b2 = repo.commit("b2", &[b1]);
        let merge = repo.commit("merge", &[a3, b2]);
        let ids = HashMap::from([
            ("root", root),
            ("a1", a1),
            ("a3", a3),
            ("b2", b2),
            ("merge", merge),
        ]);
        (repo, ids)
    }

    #[test]
    fn test_first_parent_walk() {
        let (mock, _) = merged_history();
        let repo = cached(&mock);
        let walker = CommitGraphWalker::new(&repo);
        let head = repo.head().unwrap();

        let walk = walker.ancestors(&head, Traversal::FirstParent);
        assert_eq!(messages(walk), ["merge", "a3", "a2", "a1", "root"]);
    }

    #[test]
    fn test_all_parents_walk_is_breadth_first() {
        let (mock, _) = merged_history();
        let repo = cached(&mock);
        let walker = CommitGraphWalker::new(&repo);
        let head = repo.head().unwrap();

        let walk = walker.ancestors(&head, Traversal::AllParents);
        assert_eq!(messages(walk), ["merge", "a3", "b2", "a2", "b1", "a1", "root"]);
    }

    #[test]
    fn test_stop_predicate_halts_expansion() {
        let (mock, ids) = merged_history();
        let repo = cached(&mock);
        let walker = CommitGraphWalker::new(&repo);
        let head = repo.head().unwrap();
        let stop_at = ids["a3"];

        let walk = walker.ancestors_until(&head, Traversal::FirstParent, |c| c.id() == stop_at);
        assert_eq!(messages(walk), ["merge", "a3"]);
    }

    #[test]
    fn test_merge_base_three_hops_back() {
        let mut mock = MockRepository::new();
        let base = mock.commit_on_head("base");
        let left = mock.commits_on_head(&["l1", "l2", "l3"]);
        mock.set_head(base);
        let right = mock.commits_on_head(&["r1", "r2", "r3"]);

        let repo = cached(&mock);
        let walker = CommitGraphWalker::new(&repo);
        let a = repo.commit(left[2]).unwrap();
        let b = repo.commit(right[2]).unwrap();

        assert_eq!(walker.merge_base(&a, &b).unwrap().id(), base);
        assert_eq!(walker.merge_base(&b, &a).unwrap().id(), base);
        assert!(repo.cache().merge_bases.contains(&RepositoryQueryCache::merge_base_key(a.id(), b.id())));
    }

    #[test]
    fn test_merge_base_of_ancestor() {
        let (mock, ids) = merged_history();
        let repo = cached(&mock);
        let walker = CommitGraphWalker::new(&repo);
        let merge = repo.commit(ids["merge"]).unwrap();
        let a1 = repo.commit(ids["a1"]).unwrap();

        assert_eq!(walker.merge_base(&merge, &a1).unwrap().id(), ids["a1"]);
    }

    #[test]
    fn test_merge_base_of_merged_parents() {
        let (mock, ids) = merged_history();
        let repo = cached(&mock);
        let walker = CommitGraphWalker::new(&repo);
        let a3 = repo.commit(ids["a3"]).unwrap();
        let b2 = repo.commit(ids["b2"]).unwrap();

        assert_eq!(walker.merge_base(&a3, &b2).unwrap().id(), ids["root"]);
    }

    #[test]
    fn test_merge_base_ignores_older_ancestor_reached_through_merge() {
        // m2 - m1 - M - b
        //       \    \
        //        \    a1 - a2 - a3
        //         \             \
        //          ------------- a
        let mut mock = MockRepository::new();
        let m2 = mock.commit_on_head("m2");
        let m1 = mock.commit("m1", &[m2]);
        let base = mock.commit("M", &[m1]);
        let b = mock.commit("b", &[base]);
        let a1 = mock.commit("a1", &[base]);
        let a2 = mock.commit("a2", &[a1]);
        let a3 = mock.commit("a3", &[a2]);
        let a = mock.commit("a", &[a3, m1]);

        let repo = cached(&mock);
        let walker = CommitGraphWalker::new(&repo);
        let a = repo.commit(a).unwrap();
        let b = repo.commit(b).unwrap();

        assert_eq!(walker.merge_base(&a, &b).unwrap().id(), base);
        assert_eq!(walker.merge_base(&b, &a).unwrap().id(), base);
    }

    #[test]
    fn test_merge_base_criss_cross_prefers_newest() {
        // x and y fork from root; p merges y into x and q merges x into y
        let mut mock = MockRepository::new();
        let root = mock.commit_on_head("root");
        let x = mock.commit("x", &[root]);
        let y = mock.commit("y", &[root]);
        let p = mock.commit("p", &[x, y]);
        let q = mock.commit("q", &[y, x]);

        let repo = cached(&mock);
        let walker = CommitGraphWalker::new(&repo);
        let p = repo.commit(p).unwrap();
        let q = repo.commit(q).unwrap();

        // x and y are both best common ancestors; y is newer
        assert_eq!(walker.merge_base(&p, &q).unwrap().id(), y);
    }

    #[test]
    fn test_merge_base_unrelated_histories() {
        let mut mock = MockRepository::new();
        let one = mock.commits_on_head(&["x1", "x2"]);
        let other_root = mock.commit("y1", &[]);
        let other = mock.commit("y2", &[other_root]);

        let repo = cached(&mock);
        let walker = CommitGraphWalker::new(&repo);
        let a = repo.commit(one[1]).unwrap();
        let b = repo.commit(other).unwrap();

        assert!(matches!(
            walker.merge_base(&a, &b),
            Err(VersionError::UnrelatedHistory { .. })
        ));
    }

    #[test]
    fn test_distances() {
        let (mock, ids) = merged_history();
        let repo = cached(&mock);
        let walker = CommitGraphWalker::new(&repo);
        let head = repo.head().unwrap();

        let distances = walker.distances(&head).unwrap();
        assert_eq!(distances[&ids["merge"]], 0);
        assert_eq!(distances[&ids["b2"]], 1);
        assert_eq!(distances[&ids["a1"]], 3);
        // root is three edges away through b1, four through the a side
        assert_eq!(distances[&ids["root"]], 3);
        assert_eq!(distances.len(), 7);

        let orphan = Oid::from_bytes(&[7; 20]).unwrap();
        assert_eq!(distances.get(&orphan), None);
    }

    #[test]
    fn test_first_parent_root() {
        let (mock, ids) = merged_history();
        let repo = cached(&mock);
        let walker = CommitGraphWalker::new(&repo);
        let head = repo.head().unwrap();

        assert_eq!(walker.first_parent_root(&head).unwrap().id(), ids["root"]);
    }

    /// A malformed graph where two commits list each other as parent
    struct CyclicRepository {
        a: CommitRef,
        b: CommitRef,
    }

    impl Repository for CyclicRepository {
        fn head_commit(&self) -> Result<CommitRef> {
            Ok(self.a.clone())
        }

        fn find_commit(&self, id: Oid) -> Result<CommitRef> {
            [&self.a, &self.b]
                .into_iter()
                .find(|c| c.id() == id)
                .cloned()
                .ok_or(VersionError::CommitNotFound(id))
        }

        fn tags_reachable_from(&self, _commit: &CommitRef) -> Result<Vec<TagRef>> {
            Ok(Vec::new())
        }

        fn current_branch_name(&self) -> Result<String> {
            Ok("main".to_string())
        }
    }

    #[test]
    fn test_cycle_terminates() {
        let a_id = Oid::from_bytes(&[1; 20]).unwrap();
        let b_id = Oid::from_bytes(&[2; 20]).unwrap();
        let mock = CyclicRepository {
            a: CommitRef::new(a_id, vec![b_id], "a", 0),
            b: CommitRef::new(b_id, vec![a_id], "b", 0),
        };
        let repo = cached(&mock);
        let walker = CommitGraphWalker::new(&repo);
        let head = repo.head().unwrap();

        let walk = walker.ancestors(&head, Traversal::AllParents);
        assert_eq!(messages(walk), ["a", "b"]);
    }

    #[test]
    fn test_walk_stops_after_lookup_error() {
        let mut mock = MockRepository::new();
        let missing = Oid::from_bytes(&[5; 20]).unwrap();
        mock.commit("dangling", &[missing]);
        let repo = cached(&mock);
        let walker = CommitGraphWalker::new(&repo);
        let head = repo.head().unwrap();

        let results: Vec<_> = walker.ancestors(&head, Traversal::AllParents).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(VersionError::CommitNotFound(_))));
    }
}
