//! Per-path locking for sidecar access
//!
//! Serializes every read-modify-write of a file's metadata and preview
//! sidecars. Different paths never contend with each other; the map itself is
//! only locked for lookup and insertion.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-path lock manager keyed by canonical relative path
pub struct PathLockManager {
    /// Map from canonical path to its async mutex
    /// Async so a guard can be held across enrichment and transcoding
    locks: Arc<RwLock<HashMap<String, Arc<Mutex<()>>>>>,
}

impl PathLockManager {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn get_path_lock(&self, path: &str) -> Arc<Mutex<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(path) {
                return lock.clone();
            }
        }

        let mut map = self.locks.write();
        // Another task may have inserted it between the two map locks
        map.entry(path.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Get the lock for a path
    pub fn get_lock(&self, path: &str) -> Arc<Mutex<()>> {
        self.get_path_lock(path)
    }

    /// Acquire exclusive access to a path's sidecars.
    pub async fn lock(&self, path: &str) -> OwnedMutexGuard<()> {
        self.get_path_lock(path).lock_owned().await
    }

    /// Drop map entries nobody currently holds or waits on.
    pub fn prune_idle(&self) -> usize {
        let mut map = self.locks.write();
        let before = map.len();
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - map.len()
    }

    pub fn len(&self) -> usize {
        self.locks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PathLockManager {
    fn default() -> Self {
        Self::new()
    }
}
