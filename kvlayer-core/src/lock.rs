//! Per-key mutual exclusion for read-modify-write operations.

use mea::mutex::Mutex;
use std::{collections::HashMap, future::Future, sync::Arc};

type LockTable = parking_lot::Mutex<HashMap<String, Arc<Mutex<()>>>>;

/// Lock table mapping keys to async mutexes.
///
/// Entries are created on demand and removed once the last caller holding or
/// waiting on a key finishes or is cancelled. The table itself is only held
/// for map updates, never across an await.
#[derive(Debug, Default)]
pub(crate) struct KeyLocks {
    table: LockTable,
}

/// Releases a caller's interest in a table entry when dropped.
struct Entry<'a> {
    table: &'a LockTable,
    key: &'a str,
    lock: Arc<Mutex<()>>,
}

impl Drop for Entry<'_> {
    fn drop(&mut self) {
        let mut table = self.table.lock();
        // One reference in the table, one here: nobody else is waiting.
        if Arc::strong_count(&self.lock) == 2 {
            table.remove(self.key);
        }
    }
}

impl KeyLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Runs `operation` while holding the lock for `key`.
    pub(crate) async fn run<F, T>(&self, key: &str, operation: F) -> T
    where
        F: Future<Output = T>,
    {
        let entry = Entry {
            table: &self.table,
            key,
            lock: self.table.lock().entry(key.to_string()).or_default().clone(),
        };

        let _guard = entry.lock.lock().await;
        operation.await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table.lock().len()
    }
}
