//! Search engine transport: endpoint configuration and the search calls
//! made on behalf of the widget.

pub mod api;
pub mod config;
pub mod error;
pub mod search_client;
pub(crate) mod db_utils;

pub use config::SearchEndpointConfig;
pub use error::SearchError;
pub use search_client::SearchClient;
