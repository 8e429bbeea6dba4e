//! Per-key advisory locks for look-up-or-create sequences

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Key = (String, String);

/// Serializes async critical sections per `(parent_id, name)`.
///
/// Idle entries are pruned on the next acquisition.
#[derive(Default)]
pub struct KeyedLocks {
    entries: Mutex<HashMap<Key, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, parent_id: &str, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut entries = self
                .entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            entries.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(
                entries
                    .entry((parent_id.to_string(), name.to_string()))
                    .or_default(),
            )
        };

        lock.lock_owned().await
    }

    /// Number of keys currently held or awaited
    pub fn active(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}
