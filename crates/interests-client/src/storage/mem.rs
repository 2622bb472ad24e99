use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{ClientStorage, expiry_unix, now_unix};
use crate::error::{DisabledSnafu, StorageResult};

/// In-memory [`ClientStorage`]
///
/// Used in tests, and for sessions that should leave nothing behind.
#[derive(Debug, Default)]
pub struct MemStorage {
    entries: Mutex<BTreeMap<String, (String, i64)>>,
    disabled: bool,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that refuses every operation, like a browser with
    /// storage turned off
    pub fn disabled() -> Self {
        Self {
            entries: Mutex::default(),
            disabled: true,
        }
    }

    /// Number of live (non-expired) entries
    pub fn len(&self) -> usize {
        let now = now_unix();
        self.entries
            .lock()
            .expect("Locking failed")
            .values()
            .filter(|(_, expiry)| now <= *expiry)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ClientStorage for MemStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        if self.disabled {
            return DisabledSnafu.fail();
        }
        let now = now_unix();
        Ok(self
            .entries
            .lock()
            .expect("Locking failed")
            .get(key)
            .filter(|(_, expiry)| now <= *expiry)
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> StorageResult<()> {
        if self.disabled {
            return DisabledSnafu.fail();
        }
        self.entries
            .lock()
            .expect("Locking failed")
            .insert(key.to_owned(), (value.to_owned(), expiry_unix(ttl)));
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        if self.disabled {
            return DisabledSnafu.fail();
        }
        self.entries.lock().expect("Locking failed").remove(key);
        Ok(())
    }
}
