//! Errors raised while talking to the search engine.

use std::time::Duration;

use common::FacetviewError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// The request never produced a response (connection refused, reset, ...).
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search engine returned {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },

    #[error("could not decode search response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("search timed out after {0:?}")]
    Timeout(Duration),

    /// The state could not be turned into a query document.
    #[error(transparent)]
    Query(#[from] FacetviewError),
}
