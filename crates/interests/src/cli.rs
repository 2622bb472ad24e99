use std::path::{Path, PathBuf};
use std::str::FromStr as _;
use std::sync::LazyLock;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use interests_client::ServiceConfig;
use interests_core::{DEFAULT_PAGE_SIZE, ItemId, VoteKind};
use url::Url;

/// Command line options of the recommendation feed client
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Opts {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub cmd: OptsCmd,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Directory holding the client storage database
    #[arg(env = "INTERESTS_DATA_DIR", long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Keep client storage in memory only, forgetting it on exit
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Root URL of the recommendation service
    #[arg(env = "INTERESTS_BASE_URL", long, global = true)]
    pub base_url: Option<Url>,

    /// Number of items requested per page
    #[arg(env = "INTERESTS_PAGE_SIZE", long, global = true, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Send the header that skips ngrok's browser warning page
    #[arg(env = "INTERESTS_SKIP_TUNNEL_WARNING", long, global = true)]
    pub skip_tunnel_warning: bool,

    /// Per-request timeout in seconds
    #[arg(env = "INTERESTS_REQUEST_TIMEOUT_SECS", long, global = true)]
    pub request_timeout_secs: Option<u64>,
}

static PROJECTS_DIR: LazyLock<directories::ProjectDirs> = LazyLock::new(|| {
    directories::ProjectDirs::from("org", "Interests", "interests")
        .expect("Unable to determine project's dir")
});

impl GlobalOpts {
    pub fn data_dir(&self) -> &Path {
        self.data_dir.as_deref().unwrap_or_else(|| {
            PROJECTS_DIR
                .state_dir()
                .unwrap_or_else(|| PROJECTS_DIR.data_local_dir())
        })
    }

    /// `None` when no base URL was given
    pub fn service_config(&self) -> Option<ServiceConfig> {
        let base_url = self.base_url.clone()?;
        Some(
            ServiceConfig::builder()
                .base_url(base_url)
                .page_size(self.page_size)
                .skip_tunnel_warning(self.skip_tunnel_warning)
                .maybe_request_timeout(self.request_timeout_secs.map(Duration::from_secs))
                .build(),
        )
    }
}

#[derive(Debug, Subcommand)]
pub enum OptsCmd {
    /// Print the visitor identity, creating it if needed
    Id {
        /// Forget the stored identity and start over with a new one
        #[arg(long)]
        reset: bool,
    },
    /// Load the recommendation feed
    Feed {
        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: usize,
    },
    /// Like or dislike an item
    ///
    /// The id is sent back to the service as a JSON number when it is a
    /// canonical decimal (`17`, not `017`), and as a string otherwise.
    Vote {
        item_id: String,
        /// `like` or `dislike`
        kind: VoteKind,
        /// Always send the id as a JSON string
        #[arg(long)]
        string_id: bool,
    },
    /// Print the locally remembered votes
    Votes,
    /// Manage interest categories
    #[command(subcommand)]
    Interests(InterestsCmd),
}

/// Item id of a `vote` command, in the JSON shape it will be sent in
pub fn vote_item_id(raw: &str, string_id: bool) -> ItemId {
    if string_id {
        ItemId::from(raw)
    } else {
        match ItemId::from_str(raw) {
            Ok(id) => id,
            Err(never) => match never {},
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum InterestsCmd {
    /// Print the selected interests
    List,
    /// Select an interest, or deselect it if already selected
    Toggle { name: String },
    /// Print the categories offered for selection
    Catalog,
}
