//! Memoized reconstructions for one document.
//!
//! Reconstruction is pure, so results can be shared between callers and
//! threads. The cache returns exactly what the engine would.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::engine::{Reconstruction, Reconstructor};
use crate::model::Document;

type Entries<'a> = HashMap<String, Arc<Reconstruction<'a>>>;

/// Per-commit reconstruction cache bound to one document snapshot.
#[derive(Debug)]
pub struct ReconstructionCache<'a> {
    document: &'a Document,
    engine: Reconstructor,
    entries: RwLock<Entries<'a>>,
}

impl<'a> ReconstructionCache<'a> {
    /// Create an empty cache over `document`.
    #[must_use]
    pub fn new(document: &'a Document, engine: Reconstructor) -> Self {
        Self {
            document,
            engine,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The document this cache reconstructs.
    #[must_use]
    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// Reconstruction at `target`, computed on first request.
    #[must_use]
    pub fn get(&self, target: &str) -> Arc<Reconstruction<'a>> {
        if let Some(hit) = self.read().get(target) {
            return Arc::clone(hit);
        }

        let computed = Arc::new(self.engine.reconstruct_at(self.document, target));
        tracing::debug!(
            target_commit = target,
            segments = computed.len(),
            "Cached reconstruction"
        );
        // A concurrent caller may have filled the slot; keep the first value.
        Arc::clone(self.write().entry(target.to_string()).or_insert(computed))
    }

    /// Number of cached commits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop all cached reconstructions.
    pub fn clear(&self) {
        self.write().clear();
    }

    // Entries are immutable once inserted, so a poisoned lock still holds
    // consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Entries<'a>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries<'a>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
