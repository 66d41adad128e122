use std::sync::{Arc, RwLock};

use crate::models::Document;

/// Shared, replace-wholesale document collection. Readers take a cheap `Arc`
/// snapshot and keep ranking against it even while an ingestion swaps the
/// contents underneath them.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: RwLock<Arc<Vec<Document>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current collection. The snapshot is immutable; later `replace` calls
    /// do not affect it.
    pub fn snapshot(&self) -> Arc<Vec<Document>> {
        let guard = self
            .documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Swaps in a freshly ingested collection. Single atomic replacement, no
    /// incremental mutation.
    pub fn replace(&self, documents: Vec<Document>) {
        let mut guard = self
            .documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(documents);
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }
}
