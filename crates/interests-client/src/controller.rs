//! Feed state machine
//!
//! ```text
//! AwaitingIdentity -> LoadingInitial -> Idle <-> LoadingMore
//! ```
//!
//! A failed fetch records an error message and returns to `Idle` with the
//! accumulated items untouched.

use std::sync::{Arc, Mutex, MutexGuard};

use interests_core::{
    DEFAULT_PAGE_SIZE, FeedItem, FeedPage, ItemId, VisitorId, VoteColor, VoteKind, VoteRecord,
};
use interests_util_error::FmtCompact as _;
use serde::Serialize;
use snafu::OptionExt as _;
use tokio::sync::{OnceCell, watch};
use tracing::{debug, info, warn};

use crate::error::{IdentityNotReadySnafu, SubmitResult};
use crate::identity::IdentitySource;
use crate::service::{FeedSource, VoteSink};
use crate::votes::VotePersistence;

const LOG_TARGET: &str = "interests::controller";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedState {
    AwaitingIdentity,
    LoadingInitial,
    Idle,
    LoadingMore,
}

impl FeedState {
    pub fn is_loading_initial(self) -> bool {
        self == FeedState::LoadingInitial
    }

    pub fn is_loading_more(self) -> bool {
        self == FeedState::LoadingMore
    }

    pub fn is_loading(self) -> bool {
        self.is_loading_initial() || self.is_loading_more()
    }
}

/// Snapshot of everything the presentation layer needs
#[derive(Debug, Clone, Serialize)]
pub struct FeedView {
    pub state: FeedState,
    pub items: Vec<FeedItem>,
    pub votes: VoteRecord,
    /// Message of the last failed fetch, cleared when a new fetch starts
    pub error: Option<String>,
    /// Message of the last failed vote, cleared by the next successful one
    pub vote_error: Option<String>,
}

impl FeedView {
    pub fn vote_color(&self, item_id: &ItemId, button: VoteKind) -> VoteColor {
        self.votes.color(item_id, button)
    }
}

#[derive(Debug)]
struct Inner {
    state: FeedState,
    /// Set once `start` was first called
    starting: bool,
    /// Offset of the most recently requested page
    offset: usize,
    /// Whether the first page was ever fetched successfully
    initial_loaded: bool,
    items: Vec<FeedItem>,
    votes: VoteRecord,
    error: Option<String>,
    vote_error: Option<String>,
}

impl Inner {
    fn view(&self) -> FeedView {
        FeedView {
            state: self.state,
            items: self.items.clone(),
            votes: self.votes.clone(),
            error: self.error.clone(),
            vote_error: self.vote_error.clone(),
        }
    }
}

pub struct FeedController {
    page_size: usize,
    identity: Arc<dyn IdentitySource>,
    vote_store: Arc<dyn VotePersistence>,
    source: Arc<dyn FeedSource>,
    sink: Arc<dyn VoteSink>,

    visitor: OnceCell<VisitorId>,
    inner: Mutex<Inner>,
    /// Serializes read-modify-write of the persisted vote record
    vote_lock: tokio::sync::Mutex<()>,
    view_tx: watch::Sender<FeedView>,
}

#[bon::bon]
impl FeedController {
    #[builder]
    pub fn new(
        #[builder(default = DEFAULT_PAGE_SIZE)] page_size: usize,
        identity: Arc<dyn IdentitySource>,
        vote_store: Arc<dyn VotePersistence>,
        source: Arc<dyn FeedSource>,
        sink: Arc<dyn VoteSink>,
    ) -> Arc<Self> {
        let inner = Inner {
            state: FeedState::AwaitingIdentity,
            starting: false,
            offset: 0,
            initial_loaded: false,
            items: vec![],
            votes: VoteRecord::new(),
            error: None,
            vote_error: None,
        };
        let (view_tx, _) = watch::channel(inner.view());

        Arc::new(Self {
            page_size: page_size.max(1),
            identity,
            vote_store,
            source,
            sink,
            visitor: OnceCell::new(),
            inner: Mutex::new(inner),
            vote_lock: tokio::sync::Mutex::new(()),
            view_tx,
        })
    }
}

impl FeedController {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("Locking failed")
    }

    fn publish(&self, inner: &Inner) {
        self.view_tx.send_replace(inner.view());
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedView> {
        self.view_tx.subscribe()
    }

    pub fn view(&self) -> FeedView {
        self.lock().view()
    }

    pub fn state(&self) -> FeedState {
        self.lock().state
    }

    pub fn visitor(&self) -> Option<VisitorId> {
        self.visitor.get().cloned()
    }

    pub fn offset(&self) -> usize {
        self.lock().offset
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn vote_color(&self, item_id: &ItemId, button: VoteKind) -> VoteColor {
        self.lock().votes.color(item_id, button)
    }

    /// Resolve the visitor identity and load the stored votes
    ///
    /// Only the first call does any work. Needed before voting; `start`
    /// calls it too.
    pub async fn prepare(&self) -> VisitorId {
        self.visitor
            .get_or_init(|| async {
                let visitor = self.identity.get_or_create_identity().await;
                let votes = self.vote_store.load_votes().await;
                debug!(target: LOG_TARGET, %visitor, votes = votes.len(), "Identity ready");

                {
                    let mut inner = self.lock();
                    inner.votes = votes;
                    self.publish(&inner);
                }
                visitor
            })
            .await
            .clone()
    }

    /// Resolve the identity and stored votes, then fetch the first page
    ///
    /// If the first page failed to load, calling this again retries it.
    /// Otherwise repeated calls do nothing. Returns whether a fetch was
    /// issued.
    pub async fn start(&self) -> bool {
        {
            let mut inner = self.lock();
            if inner.starting && (inner.state != FeedState::Idle || inner.initial_loaded) {
                return false;
            }
            if inner.starting {
                // Retry: identity is already resolved, claim the fetch now
                inner.state = FeedState::LoadingInitial;
            }
            inner.starting = true;
        }

        let visitor = self.prepare().await;

        let page = FeedPage::first(self.page_size);
        {
            let mut inner = self.lock();
            inner.state = FeedState::LoadingInitial;
            inner.offset = page.offset;
            inner.error = None;
            self.publish(&inner);
        }

        self.fetch_and_merge(&visitor, page, page.offset).await;
        true
    }

    /// Fetch the page after the last one requested
    ///
    /// Ignored while a fetch is in flight, and until the first page was
    /// loaded. Returns whether a fetch was issued.
    pub async fn request_more(&self) -> bool {
        let (visitor, page, prev_offset) = {
            let mut inner = self.lock();
            if inner.state != FeedState::Idle || !inner.initial_loaded {
                debug!(target: LOG_TARGET, state = ?inner.state, "Ignoring request for more");
                return false;
            }
            let Some(visitor) = self.visitor.get().cloned() else {
                return false;
            };

            let prev_offset = inner.offset;
            let page = FeedPage {
                offset: prev_offset,
                limit: self.page_size,
            }
            .next();

            inner.offset = page.offset;
            inner.state = FeedState::LoadingMore;
            inner.error = None;
            self.publish(&inner);

            (visitor, page, prev_offset)
        };

        self.fetch_and_merge(&visitor, page, prev_offset).await;
        true
    }

    async fn fetch_and_merge(&self, visitor: &VisitorId, page: FeedPage, prev_offset: usize) {
        let res = self.source.fetch_page(visitor, page).await;

        let mut inner = self.lock();
        match res {
            Ok(items) => {
                info!(
                    target: LOG_TARGET,
                    offset = page.offset,
                    count = items.len(),
                    "Page loaded"
                );
                inner.items.extend(items);
                if page.offset == 0 {
                    inner.initial_loaded = true;
                }
            }
            Err(err) => {
                warn!(
                    target: LOG_TARGET,
                    offset = page.offset,
                    err = %err.fmt_compact(),
                    "Page fetch failed"
                );
                inner.error = Some(err.to_string());
                inner.offset = prev_offset;
            }
        }
        inner.state = FeedState::Idle;
        self.publish(&inner);
    }

    /// Send a vote, and remember it locally once the service accepted it
    ///
    /// On failure the local vote record is left as it was. Fails when the
    /// identity was not resolved yet by [`Self::prepare`] or [`Self::start`].
    pub async fn cast_vote(&self, item_id: ItemId, kind: VoteKind) -> SubmitResult<VoteRecord> {
        let visitor = self.visitor().context(IdentityNotReadySnafu)?;

        if let Err(err) = self.sink.submit_vote(&visitor, &item_id, kind).await {
            warn!(
                target: LOG_TARGET,
                %item_id,
                %kind,
                err = %err.fmt_compact(),
                "Vote submission failed"
            );
            let mut inner = self.lock();
            inner.vote_error = Some(err.to_string());
            self.publish(&inner);
            return Err(err);
        }

        let _guard = self.vote_lock.lock().await;
        let current = self.lock().votes.clone();
        let updated = self
            .vote_store
            .save_vote(item_id.clone(), kind, current)
            .await;

        let mut inner = self.lock();
        inner.votes = updated.clone();
        inner.vote_error = None;
        self.publish(&inner);
        debug!(target: LOG_TARGET, %item_id, %kind, "Vote recorded");

        Ok(updated)
    }
}
