use git2::Oid;

/// A commit as seen by the engine
///
/// Plain owned data copied out of the repository. The engine never holds a
/// library handle, so identity comparisons go through [`CommitRef::id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRef {
    id: Oid,
    parents: Vec<Oid>,
    message: String,
    timestamp: i64,
}

impl CommitRef {
    pub fn new(id: Oid, parents: Vec<Oid>, message: impl Into<String>, timestamp: i64) -> Self {
        CommitRef {
            id,
            parents,
            message: message.into(),
            timestamp,
        }
    }

    pub fn id(&self) -> Oid {
        self.id
    }

    /// Parent identities in recorded order; the first parent is the mainline
    pub fn parent_ids(&self) -> &[Oid] {
        &self.parents
    }

    pub fn first_parent(&self) -> Option<Oid> {
        self.parents.first().copied()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Author time in seconds since the epoch
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Abbreviated hex identity
    pub fn short_id(&self, len: usize) -> String {
        let full = self.id.to_string();
        full[..len.min(full.len())].to_string()
    }
}
