//! Console configuration resolved from CLI flags and environment.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::core::identity::IdentityTiers;
use crate::core::notify::DEFAULT_DISPLAY_DURATION;
use crate::core::scheduler::PollIntervals;

/// Backend address used when none is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Everything needed to build a [`crate::Dashboard`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Backend base URL.
    pub api_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Poll periods.
    pub intervals: PollIntervals,
    /// How long notifications stay visible.
    pub notification_ttl: Duration,
    /// Operator identity sources.
    pub identity: IdentityTiers,
}

impl ConsoleConfig {
    /// Config pointing at `api_url` with default timings.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            intervals: PollIntervals::default(),
            notification_ttl: DEFAULT_DISPLAY_DURATION,
            identity: IdentityTiers::default(),
        }
    }

    /// Resolve identity tiers from the session value and an optional file.
    #[must_use]
    pub fn with_identity(mut self, session: Option<String>, identity_file: Option<&PathBuf>) -> Self {
        self.identity = IdentityTiers::load(session, identity_file.map(PathBuf::as_path));
        self
    }
}
