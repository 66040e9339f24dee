//! Search endpoint settings.

use std::time::Duration;

use anyhow::Context;
use url::Url;

pub const DEFAULT_SEARCH_URL: &str = "http://127.0.0.1:9200/_search";
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

pub const SEARCH_URL_VAR: &str = "FACETVIEW_SEARCH_URL";
pub const SEARCH_TIMEOUT_VAR: &str = "FACETVIEW_SEARCH_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEndpointConfig {
    pub search_url: Url,
    /// Upper bound on one search round trip.
    pub timeout: Duration,
}

impl SearchEndpointConfig {
    pub fn new(search_url: Url) -> Self {
        Self { search_url, timeout: DEFAULT_SEARCH_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the settings through `lookup`, falling back to the defaults for
    /// unset variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let search_url = lookup(SEARCH_URL_VAR).unwrap_or(DEFAULT_SEARCH_URL.to_string());
        let search_url =
            Url::parse(&search_url).with_context(|| format!("invalid {SEARCH_URL_VAR}: {search_url}"))?;

        let timeout = match lookup(SEARCH_TIMEOUT_VAR) {
            Some(ms) => {
                let ms: u64 = ms.trim().parse().with_context(|| format!("invalid {SEARCH_TIMEOUT_VAR}: {ms}"))?;
                Duration::from_millis(ms)
            }
            None => DEFAULT_SEARCH_TIMEOUT,
        };

        Ok(Self { search_url, timeout })
    }
}
