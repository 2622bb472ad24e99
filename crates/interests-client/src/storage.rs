//! Persisted client-side key/value storage with per-entry expiry
//!
//! This is the local "cookie jar" of the visitor: a handful of string
//! entries, each written with a time to live.

mod mem;
mod disk;

use std::time::Duration;

use async_trait::async_trait;

pub use self::mem::MemStorage;
pub use self::disk::RedbStorage;
use crate::error::StorageResult;

/// Storage key of the visitor identity
pub const IDENTITY_KEY: &str = "userToken";
/// Storage key of the vote record
pub const VOTES_KEY: &str = "votes";
/// Storage key of the selected interests
pub const INTERESTS_KEY: &str = "interests";

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

pub const IDENTITY_TTL: Duration = DAY.saturating_mul(365);
pub const VOTES_TTL: Duration = DAY.saturating_mul(365);
pub const INTERESTS_TTL: Duration = DAY.saturating_mul(7);

#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Read an entry; expired entries read as `None`
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write (or overwrite) an entry, expiring `ttl` from now
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> StorageResult<()>;

    async fn remove(&self, key: &str) -> StorageResult<()>;
}

fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

fn expiry_unix(ttl: Duration) -> i64 {
    now_unix().saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
}
