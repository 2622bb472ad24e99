#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use interests_client::ServiceConfig;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// What the stub answers to recommendation requests
#[derive(Debug, Clone)]
pub enum FeedReply {
    /// Numbered items from a catalog of `total`, as a bare array
    Paged { total: usize },
    /// Fixed status and raw body
    Fixed { status: StatusCode, body: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub query: Option<PageQuery>,
    pub tunnel_header: Option<String>,
    pub body: serde_json::Value,
}

struct StubState {
    feed_reply: Mutex<FeedReply>,
    vote_status: Mutex<StatusCode>,
    feed_requests: Mutex<Vec<RecordedRequest>>,
    vote_requests: Mutex<Vec<RecordedRequest>>,
}

/// Recommendation service stub on a random local port
pub struct StubServer {
    addr: SocketAddr,
    state: Arc<StubState>,
    handle: JoinHandle<()>,
}

impl StubServer {
    pub async fn start(feed_reply: FeedReply) -> Self {
        let state = Arc::new(StubState {
            feed_reply: Mutex::new(feed_reply),
            vote_status: Mutex::new(StatusCode::OK),
            feed_requests: Mutex::default(),
            vote_requests: Mutex::default(),
        });

        let router = Router::new()
            .route("/api/v1/recommendations", post(recommendations))
            .route("/api/v1/interaction", put(interaction))
            .with_state(state.clone());

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("Failed to bind stub server");
        let addr = listener.local_addr().expect("Failed to get local addr");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Stub server failed");
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).expect("Valid URL")
    }

    pub fn config(&self) -> ServiceConfig {
        ServiceConfig::builder()
            .base_url(self.base_url())
            .skip_tunnel_warning(true)
            .build()
    }

    pub fn set_feed_reply(&self, reply: FeedReply) {
        *self.state.feed_reply.lock().expect("Locking failed") = reply;
    }

    pub fn set_vote_status(&self, status: StatusCode) {
        *self.state.vote_status.lock().expect("Locking failed") = status;
    }

    pub fn feed_requests(&self) -> Vec<RecordedRequest> {
        self.state
            .feed_requests
            .lock()
            .expect("Locking failed")
            .clone()
    }

    pub fn vote_requests(&self) -> Vec<RecordedRequest> {
        self.state
            .vote_requests
            .lock()
            .expect("Locking failed")
            .clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn tunnel_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get("ngrok-skip-browser-warning")
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

async fn recommendations(
    State(state): State<Arc<StubState>>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<serde_json::Value>,
) -> Response {
    state
        .feed_requests
        .lock()
        .expect("Locking failed")
        .push(RecordedRequest {
            query: Some(query.clone()),
            tunnel_header: tunnel_header(&headers),
            body,
        });

    let reply = state.feed_reply.lock().expect("Locking failed").clone();
    match reply {
        FeedReply::Paged { total } => {
            let end = (query.offset + query.limit).min(total);
            let items: Vec<_> = (query.offset..end)
                .map(|i| serde_json::json!({ "id": i, "title": format!("Video {i}") }))
                .collect();
            axum::Json(items).into_response()
        }
        FeedReply::Fixed { status, body } => (status, body).into_response(),
    }
}

async fn interaction(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<serde_json::Value>,
) -> Response {
    state
        .vote_requests
        .lock()
        .expect("Locking failed")
        .push(RecordedRequest {
            query: None,
            tunnel_header: tunnel_header(&headers),
            body,
        });

    let status = *state.vote_status.lock().expect("Locking failed");
    (status, "ok").into_response()
}
