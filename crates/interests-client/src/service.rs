//! Remote recommendation service: page fetching and vote submission

mod http;

use async_trait::async_trait;
use interests_core::{FeedItem, FeedPage, ItemId, VisitorId, VoteKind};
use interests_util_error::FmtCompact as _;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

pub use self::http::HttpFeedService;
use crate::error::{FetchError, FetchResult, SubmitResult};

const LOG_TARGET: &str = "interests::service";

pub const RECOMMENDATIONS_PATH: &[&str] = &["api", "v1", "recommendations"];
pub const INTERACTION_PATH: &[&str] = &["api", "v1", "interaction"];

/// Source of recommendation pages
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_page(&self, visitor: &VisitorId, page: FeedPage) -> FetchResult<Vec<FeedItem>>;
}

/// Destination of vote mutations
#[async_trait]
pub trait VoteSink: Send + Sync {
    async fn submit_vote(
        &self,
        visitor: &VisitorId,
        item_id: &ItemId,
        kind: VoteKind,
    ) -> SubmitResult<()>;
}

/// Successful recommendation response
///
/// The service answers with either a bare array of items, or an object
/// carrying the array under `results`. Both are valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedResponse {
    Bare(Vec<FeedItem>),
    Enveloped { results: Vec<FeedItem> },
}

impl FeedResponse {
    pub fn decode(body: &[u8]) -> FetchResult<Self> {
        let value: serde_json::Value = serde_json::from_slice(body).map_err(|err| {
            debug!(target: LOG_TARGET, err = %err.fmt_compact(), "Response is not JSON");
            FetchError::UnexpectedFormat
        })?;

        match value {
            serde_json::Value::Array(items) => Ok(Self::Bare(decode_items(items)?)),
            serde_json::Value::Object(mut map) => match map.remove("results") {
                Some(serde_json::Value::Array(items)) => Ok(Self::Enveloped {
                    results: decode_items(items)?,
                }),
                _ => Err(FetchError::UnexpectedFormat),
            },
            _ => Err(FetchError::UnexpectedFormat),
        }
    }

    pub fn into_items(self) -> Vec<FeedItem> {
        match self {
            FeedResponse::Bare(items) => items,
            FeedResponse::Enveloped { results } => results,
        }
    }
}

fn decode_items(items: Vec<serde_json::Value>) -> FetchResult<Vec<FeedItem>> {
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item).map_err(|err| {
                debug!(target: LOG_TARGET, err = %err.fmt_compact(), "Invalid feed item");
                FetchError::UnexpectedFormat
            })
        })
        .collect()
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl FetchError {
    /// Error for a non-success `status`, using the service's message from
    /// `body` when there is one
    pub fn from_error_body(status: StatusCode, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(ErrorBody {
                message: Some(message),
            }) if !message.is_empty() => FetchError::Status { status, message },
            _ => FetchError::StatusNoMessage { status },
        }
    }
}
