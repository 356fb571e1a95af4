use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::data::TransferObserver;

pub const DEFAULT_USER_AGENT: &str = concat!("quarry/", env!("CARGO_PKG_VERSION"));

/// Session-wide knobs for a connector instance.
///
/// One observer per session; workers from one batch may call it from
/// several tasks, but never concurrently for the same transfer.
#[derive(Clone)]
pub struct SessionConfig {
    /// Value of the `User-Agent` header on all requests.
    pub user_agent: String,
    /// TCP/TLS connect deadline.
    pub connect_timeout: Duration,
    /// Per-request deadline.
    pub request_timeout: Duration,
    /// If true, never scan for existing partials and never emit Range
    /// requests; every GET starts from byte zero.
    pub disable_resumable: bool,
    /// If false, send `Pragma: no-cache` on GETs.
    pub use_cache: bool,
    /// Lifecycle event sink for all transfers of this session.
    pub observer: Option<Arc<dyn TransferObserver>>,
    /// Cancels batches in flight: pending transfers finalize as cancelled
    /// while active network I/O drains.
    pub cancel_token: CancellationToken,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(1800),
            disable_resumable: false,
            use_cache: false,
            observer: None,
            cancel_token: CancellationToken::new(),
        }
    }
}

impl SessionConfig {
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_resumable_disabled(mut self, disabled: bool) -> Self {
        self.disable_resumable = disabled;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn TransferObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }
}
