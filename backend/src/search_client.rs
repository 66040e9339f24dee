//! Handle on one search endpoint.

use common::search_result::RawSearchResponse;

use crate::config::SearchEndpointConfig;
use crate::db_utils::search_engine_utils::search_engine_get;
use crate::error::SearchError;

#[derive(Debug, Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    config: SearchEndpointConfig,
}

impl SearchClient {
    pub fn new(config: SearchEndpointConfig) -> Self {
        Self { http: reqwest::Client::new(), config }
    }

    pub fn config(&self) -> &SearchEndpointConfig {
        &self.config
    }

    /// Send one serialized query document, giving up after the configured timeout.
    pub async fn get(&self, source: &str) -> Result<RawSearchResponse, SearchError> {
        let request = search_engine_get(&self.http, &self.config.search_url, source);
        match tokio::time::timeout(self.config.timeout, request).await {
            Ok(response) => response,
            Err(_) => {
                tracing::error!("search timed out after {:?}", self.config.timeout);
                Err(SearchError::Timeout(self.config.timeout))
            }
        }
    }
}
