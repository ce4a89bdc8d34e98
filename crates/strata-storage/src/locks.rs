//! Per-region-file mutual exclusion.
//!
//! Every region read or write holds the lock for that file's path from open
//! to close, so concurrent saves into one region cannot interleave their
//! slot-table updates. Clones share one table. An entry is dropped again
//! once no caller holds or waits on it, so the table stays as small as the
//! set of regions in use.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;

/// Lock table keyed by region file path.
#[derive(Clone, Debug, Default)]
pub struct RegionLocks {
    table: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl RegionLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex guarding `path`, created on first use.
    pub fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        if let Some(lock) = self.table.get(path) {
            return Arc::clone(lock.value());
        }
        Arc::clone(self.table.entry(path.to_path_buf()).or_default().value())
    }

    /// Runs `f` while holding the lock for `path`, then evicts the entry if
    /// nobody else is using it. A poisoned lock is recovered.
    pub fn with_lock<T>(&self, path: &Path, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(path);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        drop(lock);
        self.release(path);
        result
    }

    /// Removes the entry for `path` if the table holds the only reference.
    fn release(&self, path: &Path) {
        self.table.remove_if(path, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Number of region files currently locked or awaited.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True if no region file is in use.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
