use std::time::Duration;

use interests_core::DEFAULT_PAGE_SIZE;
use url::Url;

/// Where and how to talk to the recommendation service
#[derive(Debug, Clone, bon::Builder)]
pub struct ServiceConfig {
    /// Root URL of the service; `api/v1/...` paths are appended to it
    pub base_url: Url,

    #[builder(default = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Send `ngrok-skip-browser-warning: true` with every request
    ///
    /// Needed when the service is exposed through an ngrok tunnel, which
    /// otherwise answers with an HTML interstitial page.
    #[builder(default)]
    pub skip_tunnel_warning: bool,

    /// Per-request timeout; no timeout when not set
    pub request_timeout: Option<Duration>,
}
