mod cli;

use std::io;
use std::sync::Arc;

use clap::Parser;
use cli::{GlobalOpts, InterestsCmd, Opts, OptsCmd};
use interests_client::error::{IdentityUnavailable, InitError, StorageError, SubmitError};
use interests_client::{
    ClientStorage, FeedController, FeedView, HttpFeedService, IdentitySource as _, IdentityStore,
    InterestStore, MemStorage, RedbStorage, VotePersistence as _, VoteStore,
};
use interests_core::{FeedItem, Interest, VoteKind, interest};
use interests_util_error::WhateverResult;
use serde::Serialize;
use snafu::{FromString, OptionExt as _, ResultExt, Snafu, Whatever};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub const LOG_TARGET: &str = "interests::cli";

const DB_FILE_NAME: &str = "interests.redb";

#[derive(Debug, Snafu)]
pub enum CliError {
    #[snafu(display("Initialization error: {source}"))]
    Init { source: InitError },
    #[snafu(display("Storage error: {source}"))]
    Storage { source: StorageError },
    #[snafu(display("Identity error: {source}"))]
    Identity { source: IdentityUnavailable },
    #[snafu(display("Vote failed: {source}"))]
    Vote { source: SubmitError },
    #[snafu(display("Base URL not set (use --base-url or INTERESTS_BASE_URL)"))]
    MissingBaseUrl,
    #[snafu(display("Data dir error: {source:?}"))]
    DataDir { source: io::Error },
    #[snafu(display("Miscellaneous error: {source}"))]
    Whatever { source: Whatever },
}

pub type CliResult<T> = std::result::Result<T, CliError>;

#[snafu::report]
#[tokio::main]
async fn main() -> CliResult<()> {
    init_logging().context(WhateverSnafu)?;

    let opts = Opts::parse();
    let v = handle_cmd(opts).await?;
    println!("{}", serde_json::to_string_pretty(&v).expect("Can't fail"));
    Ok(())
}

async fn open_storage(global: &GlobalOpts) -> CliResult<Arc<dyn ClientStorage>> {
    if global.ephemeral {
        return Ok(Arc::new(MemStorage::new()));
    }

    let data_dir = global.data_dir();
    tokio::fs::create_dir_all(data_dir)
        .await
        .context(DataDirSnafu)?;

    let storage = RedbStorage::open(data_dir.join(DB_FILE_NAME))
        .await
        .context(StorageSnafu)?;
    Ok(Arc::new(storage))
}

fn make_controller(
    global: &GlobalOpts,
    storage: Arc<dyn ClientStorage>,
) -> CliResult<Arc<FeedController>> {
    let config = global.service_config().context(MissingBaseUrlSnafu)?;
    let service = Arc::new(HttpFeedService::new(&config).context(InitSnafu)?);

    Ok(FeedController::builder()
        .page_size(config.page_size)
        .identity(Arc::new(IdentityStore::new(storage.clone())))
        .vote_store(Arc::new(VoteStore::new(storage)))
        .source(service.clone())
        .sink(service)
        .build())
}

#[derive(Serialize)]
struct FeedItemOut<'a> {
    #[serde(flatten)]
    item: &'a FeedItem,
    like_color: &'static str,
    dislike_color: &'static str,
}

#[derive(Serialize)]
struct FeedOut<'a> {
    visitor_id: Option<String>,
    offset: usize,
    error: Option<&'a str>,
    items: Vec<FeedItemOut<'a>>,
}

fn feed_output(view: &FeedView, visitor_id: Option<String>, offset: usize) -> serde_json::Value {
    let items = view
        .items
        .iter()
        .map(|item| FeedItemOut {
            item,
            like_color: view.vote_color(&item.id, VoteKind::Like).css_name(),
            dislike_color: view.vote_color(&item.id, VoteKind::Dislike).css_name(),
        })
        .collect();

    serde_json::to_value(FeedOut {
        visitor_id,
        offset,
        error: view.error.as_deref(),
        items,
    })
    .expect("Can't fail")
}

async fn handle_cmd(opts: Opts) -> CliResult<serde_json::Value> {
    Ok(match opts.cmd {
        OptsCmd::Id { reset } => {
            let storage = open_storage(&opts.global).await?;
            let store = IdentityStore::new(storage);
            let visitor = if reset {
                store.reset_identity().await.context(IdentitySnafu)?
            } else {
                store.get_or_create_identity().await
            };

            serde_json::json!({ "visitor_id": visitor })
        }
        OptsCmd::Feed { pages } => {
            let storage = open_storage(&opts.global).await?;
            let controller = make_controller(&opts.global, storage)?;

            controller.start().await;
            for _ in 1..pages {
                if controller.view().error.is_some() || !controller.request_more().await {
                    break;
                }
            }

            let view = controller.view();
            if let Some(err) = view.error.as_deref() {
                warn!(target: LOG_TARGET, %err, "Feed did not load completely");
            }
            info!(target: LOG_TARGET, count = view.items.len(), "Feed loaded");

            feed_output(
                &view,
                controller.visitor().map(|v| v.to_string()),
                controller.offset(),
            )
        }
        OptsCmd::Vote {
            item_id,
            kind,
            string_id,
        } => {
            let item_id = cli::vote_item_id(&item_id, string_id);
            let storage = open_storage(&opts.global).await?;
            let controller = make_controller(&opts.global, storage)?;

            controller.prepare().await;
            let votes = controller
                .cast_vote(item_id, kind)
                .await
                .context(VoteSnafu)?;

            serde_json::to_value(votes).expect("Can't fail")
        }
        OptsCmd::Votes => {
            let storage = open_storage(&opts.global).await?;
            let votes = VoteStore::new(storage).load_votes().await;

            serde_json::to_value(votes).expect("Can't fail")
        }
        OptsCmd::Interests(cmd) => {
            let storage = open_storage(&opts.global).await?;
            let store = InterestStore::new(storage);

            match cmd {
                InterestsCmd::List => {
                    serde_json::to_value(store.load_interests().await).expect("Can't fail")
                }
                InterestsCmd::Toggle { name } => {
                    let mut selection = store.load_interests().await;
                    let selected = selection.toggle(Interest::from(name.as_str()));
                    store
                        .try_save_interests(&selection)
                        .await
                        .context(StorageSnafu)?;
                    if selected && !interest::DEFAULT_INTEREST_CATALOG.contains(&name.as_str()) {
                        warn!(target: LOG_TARGET, %name, "Selected interest is not in the catalog");
                    }

                    serde_json::json!({
                        "selected": selected,
                        "interests": selection,
                    })
                }
                InterestsCmd::Catalog => {
                    serde_json::to_value(interest::default_catalog()).expect("Can't fail")
                }
            }
        }
    })
}

pub fn init_logging() -> WhateverResult<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|_| Whatever::without_source("Failed to initialize logging".to_string()))?;

    Ok(())
}
