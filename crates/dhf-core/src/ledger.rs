//! Commit ledger helpers.
//!
//! The ledger is stored oldest first. Array position is the only ordering
//! authority: commit dates are never compared.

use std::collections::HashSet;

use crate::model::Commit;

/// Read-only view over a document's commit ledger.
#[derive(Debug, Clone, Copy)]
pub struct Ledger<'a> {
    commits: &'a [Commit],
}

impl<'a> Ledger<'a> {
    /// Wrap a chronologically ordered slice of commits.
    #[must_use]
    pub fn new(commits: &'a [Commit]) -> Self {
        Self { commits }
    }

    /// Chronological index of the commit with the given id.
    ///
    /// When ids are duplicated the first occurrence is used.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.commits.iter().position(|c| c.id == id)
    }

    /// Look up a commit by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&'a Commit> {
        self.commits.iter().find(|c| c.id == id)
    }

    /// The most recent commit.
    #[must_use]
    pub fn latest(&self) -> Option<&'a Commit> {
        self.commits.last()
    }

    /// Whether `id` names the most recent commit.
    #[must_use]
    pub fn is_latest(&self, id: &str) -> bool {
        self.latest().is_some_and(|c| c.id == id)
    }

    /// Ids of all commits up to and including index `index`.
    #[must_use]
    pub fn prefix(&self, index: usize) -> HashSet<&'a str> {
        self.commits
            .iter()
            .take(index.saturating_add(1))
            .map(|c| c.id.as_str())
            .collect()
    }

    /// Ids of all commits chronologically at or before `id`.
    ///
    /// Returns `None` if `id` is not in the ledger.
    #[must_use]
    pub fn at_or_before(&self, id: &str) -> Option<HashSet<&'a str>> {
        self.position(id).map(|index| self.prefix(index))
    }

    /// Number of commits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Whether the ledger has no commits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Iterate over commits oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &'a Commit> {
        self.commits.iter()
    }
}
