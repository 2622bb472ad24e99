use std::sync::Arc;

use async_trait::async_trait;
use interests_core::{ItemId, VoteKind, VoteRecord};
use interests_util_error::FmtCompact as _;
use snafu::ResultExt as _;
use tracing::{debug, warn};

use crate::error::{EncodeSnafu, StorageResult};
use crate::storage::{ClientStorage, VOTES_KEY, VOTES_TTL};

const LOG_TARGET: &str = "interests::votes";

/// Local memory of the votes a visitor has cast
#[async_trait]
pub trait VotePersistence: Send + Sync {
    /// Empty record when nothing (readable) is stored
    async fn load_votes(&self) -> VoteRecord;

    /// `current` with `item_id` mapped to `kind`
    ///
    /// The returned record reflects the vote even if it could not be
    /// persisted.
    async fn save_vote(&self, item_id: ItemId, kind: VoteKind, current: VoteRecord) -> VoteRecord;
}

/// Vote record persisted in [`ClientStorage`] as a JSON object
pub struct VoteStore {
    storage: Arc<dyn ClientStorage>,
}

impl VoteStore {
    pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
        Self { storage }
    }

    async fn persist(&self, votes: &VoteRecord) -> StorageResult<()> {
        let raw = serde_json::to_string(votes).context(EncodeSnafu)?;
        self.storage.set(VOTES_KEY, &raw, VOTES_TTL).await
    }
}

#[async_trait]
impl VotePersistence for VoteStore {
    async fn load_votes(&self) -> VoteRecord {
        let raw = match self.storage.get(VOTES_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return VoteRecord::new(),
            Err(err) => {
                warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Can't read stored votes");
                return VoteRecord::new();
            }
        };

        serde_json::from_str(&raw)
            .inspect_err(|err| {
                debug!(target: LOG_TARGET, err = %err.fmt_compact(), "Invalid stored votes value");
            })
            .unwrap_or_default()
    }

    async fn save_vote(&self, item_id: ItemId, kind: VoteKind, current: VoteRecord) -> VoteRecord {
        let updated = current.with_vote(item_id.clone(), kind);

        if let Err(err) = self.persist(&updated).await {
            warn!(
                target: LOG_TARGET,
                err = %err.fmt_compact(),
                %item_id,
                %kind,
                "Vote could not be persisted, keeping it for this session only"
            );
        }

        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemStorage;

    #[test_log::test(tokio::test)]
    async fn nothing_stored_loads_empty() {
        let store = VoteStore::new(Arc::new(MemStorage::new()));
        assert!(store.load_votes().await.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn corrupt_value_loads_empty() {
        let storage = Arc::new(MemStorage::new());
        storage.set(VOTES_KEY, "{not json", VOTES_TTL).await.unwrap();

        let store = VoteStore::new(storage);
        assert!(store.load_votes().await.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn saved_votes_reload() {
        let storage = Arc::new(MemStorage::new());
        let store = VoteStore::new(storage.clone());

        let votes = store
            .save_vote(ItemId::from("i1"), VoteKind::Like, VoteRecord::new())
            .await;
        let votes = store
            .save_vote(ItemId::from("i2"), VoteKind::Dislike, votes)
            .await;

        let reloaded = VoteStore::new(storage).load_votes().await;
        assert_eq!(reloaded, votes);
        assert_eq!(reloaded.get(&ItemId::from("i1")), Some(VoteKind::Like));
    }

    #[test_log::test(tokio::test)]
    async fn persistence_failure_still_updates_in_memory() {
        let store = VoteStore::new(Arc::new(MemStorage::disabled()));

        let votes = store
            .save_vote(ItemId::from("i3"), VoteKind::Like, VoteRecord::new())
            .await;

        assert_eq!(votes.get(&ItemId::from("i3")), Some(VoteKind::Like));
        assert!(store.load_votes().await.is_empty());
    }
}
