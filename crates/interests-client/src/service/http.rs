use async_trait::async_trait;
use interests_core::{FeedItem, FeedPage, ItemId, VisitorId, VoteKind};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use snafu::ResultExt as _;
use tracing::{debug, trace};
use url::Url;

use super::{FeedResponse, FeedSource, INTERACTION_PATH, LOG_TARGET, RECOMMENDATIONS_PATH, VoteSink};
use crate::config::ServiceConfig;
use crate::error::{
    FetchError, FetchNetworkSnafu, FetchResult, HttpClientSnafu, InitResult, InvalidBaseUrlSnafu,
    SubmitNetworkSnafu, SubmitResult, SubmitStatusSnafu,
};

const TUNNEL_WARNING_HEADER: &str = "ngrok-skip-browser-warning";

#[derive(Serialize)]
struct RecommendationsRequest<'a> {
    user_id: &'a VisitorId,
}

#[derive(Serialize)]
struct InteractionRequest<'a> {
    user_id: &'a VisitorId,
    video_id: serde_json::Value,
    #[serde(rename = "type")]
    kind: VoteKind,
}

/// HTTP client of the recommendation service
#[derive(Debug, Clone)]
pub struct HttpFeedService {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpFeedService {
    pub fn new(config: &ServiceConfig) -> InitResult<Self> {
        if config.base_url.cannot_be_a_base() {
            return InvalidBaseUrlSnafu {
                url: config.base_url.clone(),
            }
            .fail();
        }

        let mut headers = HeaderMap::new();
        if config.skip_tunnel_warning {
            headers.insert(TUNNEL_WARNING_HEADER, HeaderValue::from_static("true"));
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("interests/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build().context(HttpClientSnafu)?,
            base_url: config.base_url.clone(),
        })
    }

    fn endpoint(&self, path: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .expect("Checked in new")
            .pop_if_empty()
            .extend(path);
        url
    }
}

#[async_trait]
impl FeedSource for HttpFeedService {
    async fn fetch_page(&self, visitor: &VisitorId, page: FeedPage) -> FetchResult<Vec<FeedItem>> {
        let url = self.endpoint(RECOMMENDATIONS_PATH);
        debug!(target: LOG_TARGET, %url, offset = page.offset, limit = page.limit, "Fetching recommendations");

        let response = self
            .client
            .post(url)
            .query(&[("limit", page.limit), ("offset", page.offset)])
            .json(&RecommendationsRequest { user_id: visitor })
            .send()
            .await
            .context(FetchNetworkSnafu)?;

        let status = response.status();
        let body = response.bytes().await.context(FetchNetworkSnafu)?;

        if !status.is_success() {
            return Err(FetchError::from_error_body(status, &body));
        }

        let items = FeedResponse::decode(&body)?.into_items();
        debug!(target: LOG_TARGET, count = items.len(), offset = page.offset, "Fetched recommendations");
        Ok(items)
    }
}

#[async_trait]
impl VoteSink for HttpFeedService {
    async fn submit_vote(
        &self,
        visitor: &VisitorId,
        item_id: &ItemId,
        kind: VoteKind,
    ) -> SubmitResult<()> {
        let url = self.endpoint(INTERACTION_PATH);
        debug!(target: LOG_TARGET, %url, %item_id, %kind, "Submitting vote");

        let response = self
            .client
            .put(url)
            .json(&InteractionRequest {
                user_id: visitor,
                video_id: item_id.to_wire(),
                kind,
            })
            .send()
            .await
            .context(SubmitNetworkSnafu)?;

        let status = response.status();
        if !status.is_success() {
            return SubmitStatusSnafu { status }.fail();
        }

        let ack = response.text().await.context(SubmitNetworkSnafu)?;
        trace!(target: LOG_TARGET, %item_id, %ack, "Vote acknowledged");
        Ok(())
    }
}
