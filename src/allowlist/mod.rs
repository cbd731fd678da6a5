//! allowlist
//!
//! External list of supported chains used to filter candidate directories.
//!
//! # Architecture
//!
//! [`AllowlistFetcher`] is the seam. [`HttpAllowlistFetcher`] reads the
//! production endpoint; [`StaticAllowlist`] serves a fixed list. The list
//! is fetched fresh on every refresh whose registry policy needs it and is
//! never cached between refreshes.
//!
//! # Example
//!
//! ```no_run
//! use registry_mirror::allowlist::{Allowlist, AllowlistFetcher, AllowlistSettings, HttpAllowlistFetcher};
//!
//! # tokio_test::block_on(async {
//! let fetcher = HttpAllowlistFetcher::new(AllowlistSettings::default()).unwrap();
//! let allowlist = Allowlist::new(fetcher.fetch().await.unwrap());
//! assert!(allowlist.admits_name("cosmoshub", false));
//! # });
//! ```

mod fixed;
mod http;
pub mod traits;

use std::time::Duration;

pub use fixed::StaticAllowlist;
pub use http::HttpAllowlistFetcher;
pub use traits::{Allowlist, AllowlistEntry, AllowlistError, AllowlistFetcher};

/// Default allowlist endpoint.
pub const DEFAULT_ALLOWLIST_URL: &str =
    "https://raw.githubusercontent.com/nodejumper-org/jumper-assets/master/chains.json";

/// Endpoint and retry settings for [`HttpAllowlistFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowlistSettings {
    pub url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries after the first attempt
    pub retries: u32,
    /// Multiplied by the attempt number between retries
    pub retry_backoff: Duration,
}

impl Default for AllowlistSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_ALLOWLIST_URL.to_string(),
            timeout: Duration::from_millis(5000),
            retries: 3,
            retry_backoff: Duration::from_millis(250),
        }
    }
}
