//! Error type shared by the translation functions.

use thiserror::Error;

use crate::facet::FacetType;

#[derive(Debug, Error)]
pub enum FacetviewError {
    /// A filter or UI action names a field that has no facet definition.
    #[error("filter references undefined facet: {field}")]
    UndefinedFacet { field: String },

    /// The stored filter does not have the shape its facet type needs
    /// (a value list on a range facet, a range on a terms facet).
    #[error("filter on {field} does not match its {facet_type} facet")]
    FilterShapeMismatch { field: String, facet_type: FacetType },

    /// Statistical facets only count, they cannot constrain a search.
    #[error("{facet_type} facet {field} cannot be used as a filter")]
    UnsupportedFilter { field: String, facet_type: FacetType },

    #[error("malformed search source: {0}")]
    MalformedSource(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("url error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T, E = FacetviewError> = std::result::Result<T, E>;
