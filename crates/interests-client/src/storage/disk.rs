use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bincode::{Decode, Encode};
use redb_bincode::TableDefinition;
use snafu::ResultExt as _;
use tracing::{debug, instrument};

use super::{ClientStorage, expiry_unix, now_unix};
use crate::error::{CommitSnafu, DatabaseSnafu, JoinSnafu, StorageResult, TransactionSnafu};

const LOG_TARGET: &str = "interests::storage";

#[derive(Debug, Clone, Encode, Decode)]
struct StoredEntry {
    value: String,
    /// Expiry as Unix timestamp (seconds since epoch)
    expiry_unix: i64,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.expiry_unix < now_unix()
    }
}

const ENTRIES_TABLE: TableDefinition<String, StoredEntry> =
    TableDefinition::new("interests_client::entries");

/// [`ClientStorage`] persisted in a redb database file
#[derive(Debug, Clone)]
pub struct RedbStorage {
    db: Arc<redb_bincode::Database>,
}

impl RedbStorage {
    #[instrument(skip_all)]
    pub async fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        debug!(target: LOG_TARGET, path = %path.display(), "Opening storage");
        let db = tokio::task::spawn_blocking(move || redb_bincode::Database::create(path))
            .await
            .context(JoinSnafu)?
            .context(DatabaseSnafu)?;

        Self::new(Arc::new(db)).await
    }

    /// Use an already opened database, creating the entries table if missing
    pub async fn new(db: Arc<redb_bincode::Database>) -> StorageResult<Self> {
        let s = Self { db };
        s.write_with(|tx| {
            let _ = tx.open_table(&ENTRIES_TABLE)?;
            Ok(())
        })
        .await?;
        Ok(s)
    }

    async fn write_with<T>(
        &self,
        f: impl FnOnce(&redb_bincode::WriteTransaction) -> StorageResult<T> + Send + 'static,
    ) -> StorageResult<T>
    where
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let tx = db.begin_write().context(TransactionSnafu)?;
            let res = f(&tx)?;
            tx.commit().context(CommitSnafu)?;
            Ok(res)
        })
        .await
        .context(JoinSnafu)?
    }

    async fn read_with<T>(
        &self,
        f: impl FnOnce(&redb_bincode::ReadTransaction) -> StorageResult<T> + Send + 'static,
    ) -> StorageResult<T>
    where
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let tx = db.begin_read().context(TransactionSnafu)?;
            f(&tx)
        })
        .await
        .context(JoinSnafu)?
    }
}

#[async_trait]
impl ClientStorage for RedbStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let key = key.to_owned();
        self.read_with(move |tx| {
            let table = tx.open_table(&ENTRIES_TABLE)?;
            let Some(entry) = table.get(&key)?.map(|g| g.value()) else {
                return Ok(None);
            };
            if entry.is_expired() {
                debug!(target: LOG_TARGET, %key, "Entry expired");
                return Ok(None);
            }
            Ok(Some(entry.value))
        })
        .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> StorageResult<()> {
        let key = key.to_owned();
        let entry = StoredEntry {
            value: value.to_owned(),
            expiry_unix: expiry_unix(ttl),
        };
        self.write_with(move |tx| {
            let mut table = tx.open_table(&ENTRIES_TABLE)?;
            table.insert(&key, &entry)?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let key = key.to_owned();
        self.write_with(move |tx| {
            let mut table = tx.open_table(&ENTRIES_TABLE)?;
            table.remove(&key)?;
            Ok(())
        })
        .await
    }
}
