//! Search state, query translation and result handling shared between the
//! search client and the widget.

extern crate serde;

pub mod data_series;
pub mod error;
pub mod facet;
pub mod facet_registry;
pub mod fuzzify;
pub mod query_builder;
pub mod query_document;
pub mod query_parser;
pub mod search_result;
pub mod search_state;
pub mod serializer;
pub mod share_url;

pub use error::{FacetviewError, Result};
