use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Hands out one mutex per proposal id, created lazily and shared between
/// callers. Ledger mutations for the same proposal take this mutex for the
/// whole insert-recompute-write unit; mutations for different proposals run
/// in parallel.
#[derive(Debug, Default)]
pub(crate) struct LockRegistry {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    pub fn lock_for(&self, proposal_id: i64) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(proposal_id)
            .or_default()
            .clone()
    }

    pub fn forget(&self, proposal_id: i64) {
        self.locks.lock().remove(&proposal_id);
    }
}
