//! Per-part exclusive locks.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use partview_core::types::PartId;

/// One async mutex per part, created on demand.
///
/// Entries are removed when the last holder releases them, so the map
/// only contains parts with a sync in flight.
#[derive(Debug, Default)]
pub struct PartLocks {
    locks: DashMap<PartId, Arc<Mutex<()>>>,
}

impl PartLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `part_id`.
    pub async fn acquire(&self, part_id: PartId) -> PartGuard<'_> {
        let mutex = Arc::clone(&self.locks.entry(part_id).or_default());
        let guard = mutex.lock_owned().await;
        PartGuard {
            locks: self,
            part_id,
            guard: Some(guard),
        }
    }

    /// Number of parts with a lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Holds a part's lock until dropped.
#[derive(Debug)]
pub struct PartGuard<'a> {
    locks: &'a PartLocks,
    part_id: PartId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PartGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // only the map's own reference left: nobody holds or waits
        self.locks
            .locks
            .remove_if(&self.part_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
