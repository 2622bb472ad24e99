use std::sync::Arc;

use interests_core::InterestSelection;
use interests_util_error::FmtCompact as _;
use snafu::ResultExt as _;
use tracing::{debug, info, warn};

use crate::error::{EncodeSnafu, StorageResult};
use crate::storage::{ClientStorage, INTERESTS_KEY, INTERESTS_TTL};

const LOG_TARGET: &str = "interests::interests";

/// Interest categories picked during onboarding
///
/// Kept for a week only; the visitor is expected to be asked again.
pub struct InterestStore {
    storage: Arc<dyn ClientStorage>,
}

impl InterestStore {
    pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
        Self { storage }
    }

    pub async fn load_interests(&self) -> InterestSelection {
        match self.storage.get(INTERESTS_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw)
                .inspect_err(|err| {
                    debug!(target: LOG_TARGET, err = %err.fmt_compact(), "Invalid stored interests value");
                })
                .unwrap_or_default(),
            Ok(None) => InterestSelection::new(),
            Err(err) => {
                warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Can't read stored interests");
                InterestSelection::new()
            }
        }
    }

    pub async fn try_save_interests(&self, selection: &InterestSelection) -> StorageResult<()> {
        let raw = serde_json::to_string(selection).context(EncodeSnafu)?;
        self.storage.set(INTERESTS_KEY, &raw, INTERESTS_TTL).await?;
        info!(target: LOG_TARGET, count = selection.as_slice().len(), "Saved interests");
        Ok(())
    }

    /// Persist `selection`, logging (and otherwise ignoring) failures
    pub async fn save_interests(&self, selection: &InterestSelection) {
        if let Err(err) = self.try_save_interests(selection).await {
            warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Interests could not be persisted");
        }
    }
}

#[cfg(test)]
mod tests {
    use interests_core::Interest;

    use super::*;
    use crate::storage::MemStorage;

    #[test_log::test(tokio::test)]
    async fn selection_round_trips_through_storage() {
        let storage = Arc::new(MemStorage::new());
        let store = InterestStore::new(storage);

        let mut selection = store.load_interests().await;
        assert!(selection.is_empty());

        selection.toggle(Interest::from("Наука"));
        selection.toggle(Interest::from("Спорт"));
        store.save_interests(&selection).await;

        assert_eq!(store.load_interests().await, selection);
    }

    #[test_log::test(tokio::test)]
    async fn disabled_storage_is_not_fatal() {
        let store = InterestStore::new(Arc::new(MemStorage::disabled()));
        let mut selection = InterestSelection::new();
        selection.toggle(Interest::from("Музыка"));

        assert!(store.try_save_interests(&selection).await.is_err());
        store.save_interests(&selection).await;
        assert!(store.load_interests().await.is_empty());
    }
}
