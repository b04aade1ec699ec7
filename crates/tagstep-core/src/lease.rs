use crate::error::{Result, TagstepError};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Process-local advisory leases, one per list id.
///
/// Only one advancement run may hold a given list at a time. Runs in other
/// processes are not seen.
#[derive(Debug, Default, Clone)]
pub struct ListLeases {
    held: Arc<Mutex<HashSet<String>>>,
}

impl ListLeases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, list_id: &str) -> Result<ListLease> {
        if !lock(&self.held).insert(list_id.to_string()) {
            return Err(TagstepError::ListBusy(list_id.to_string()));
        }
        debug!(list_id, "lease acquired");
        Ok(ListLease {
            list_id: list_id.to_string(),
            held: Arc::clone(&self.held),
        })
    }

    pub fn is_held(&self, list_id: &str) -> bool {
        lock(&self.held).contains(list_id)
    }
}

/// Released on drop.
#[derive(Debug)]
pub struct ListLease {
    list_id: String,
    held: Arc<Mutex<HashSet<String>>>,
}

impl ListLease {
    pub fn list_id(&self) -> &str {
        &self.list_id
    }
}

impl Drop for ListLease {
    fn drop(&mut self) {
        lock(&self.held).remove(&self.list_id);
        debug!(list_id = %self.list_id, "lease released");
    }
}

// A panic while holding the set cannot leave it half-updated, so a poisoned
// lock is still usable.
fn lock(held: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
