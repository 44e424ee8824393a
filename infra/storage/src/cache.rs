use crate::record::FileRecord;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Concurrent map from stored name to [`FileRecord`].
///
/// Clones share the same entries, so a cache can be created up front and handed to several
/// stores or inspected from tests. Holds exactly what the store last observed; the directory
/// remains the source of truth.
#[derive(Debug, Clone, Default)]
pub struct MetadataCache {
    entries: Arc<RwLock<FxHashMap<String, FileRecord>>>,
}

impl MetadataCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, stored_name: &str) -> Option<FileRecord> {
        self.entries.read().get(stored_name).cloned()
    }

    /// Inserts or replaces the entry keyed by the record's stored name.
    pub fn put(&self, record: FileRecord) -> Option<FileRecord> {
        self.entries.write().insert(record.stored_name.clone(), record)
    }

    /// Inserts only when no entry exists and returns whichever record ends up cached.
    ///
    /// Reconstructed records go through here so they never clobber a richer record a
    /// concurrent upload put in place.
    pub fn fill(&self, record: FileRecord) -> FileRecord {
        self.entries.write().entry(record.stored_name.clone()).or_insert(record).clone()
    }

    pub fn remove(&self, stored_name: &str) -> Option<FileRecord> {
        self.entries.write().remove(stored_name)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    #[must_use]
    pub fn contains(&self, stored_name: &str) -> bool {
        self.entries.read().contains_key(stored_name)
    }

    /// Snapshot of the cached keys.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}
