use std::sync::Arc;

use async_trait::async_trait;
use interests_core::VisitorId;
use interests_util_error::FmtCompact as _;
use snafu::ResultExt as _;
use tracing::{debug, info, warn};

use crate::error::{IdentityUnavailable, IdentityUnavailableSnafu};
use crate::storage::{ClientStorage, IDENTITY_KEY, IDENTITY_TTL};

const LOG_TARGET: &str = "interests::identity";

/// Something that can hand out the visitor's identity
#[async_trait]
pub trait IdentitySource: Send + Sync {
    /// Never fails: when persistence is unavailable, a fresh identity is
    /// returned that only lives for this session.
    async fn get_or_create_identity(&self) -> VisitorId;
}

/// Visitor identity persisted in [`ClientStorage`]
pub struct IdentityStore {
    storage: Arc<dyn ClientStorage>,
}

impl IdentityStore {
    pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
        Self { storage }
    }

    /// Like [`IdentitySource::get_or_create_identity`], but reports storage
    /// failures instead of degrading
    pub async fn try_get_or_create_identity(&self) -> Result<VisitorId, IdentityUnavailable> {
        if let Some(existing) = self
            .storage
            .get(IDENTITY_KEY)
            .await
            .context(IdentityUnavailableSnafu)?
            .filter(|s| !s.is_empty())
        {
            debug!(target: LOG_TARGET, id = %existing, "Using stored identity");
            return Ok(VisitorId::from(existing));
        }

        let id = VisitorId::generate();
        self.storage
            .set(IDENTITY_KEY, id.as_str(), IDENTITY_TTL)
            .await
            .context(IdentityUnavailableSnafu)?;
        info!(target: LOG_TARGET, %id, "Created new visitor identity");
        Ok(id)
    }
}

impl IdentityStore {
    /// Forget the stored identity and persist a freshly generated one
    pub async fn reset_identity(&self) -> Result<VisitorId, IdentityUnavailable> {
        self.storage
            .remove(IDENTITY_KEY)
            .await
            .context(IdentityUnavailableSnafu)?;
        info!(target: LOG_TARGET, "Stored identity removed");
        self.try_get_or_create_identity().await
    }
}

#[async_trait]
impl IdentitySource for IdentityStore {
    async fn get_or_create_identity(&self) -> VisitorId {
        match self.try_get_or_create_identity().await {
            Ok(id) => id,
            Err(err) => {
                let id = VisitorId::generate();
                warn!(
                    target: LOG_TARGET,
                    err = %err.fmt_compact(),
                    %id,
                    "Identity can't be persisted, using a session-only identity"
                );
                id
            }
        }
    }
}
