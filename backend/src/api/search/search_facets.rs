//! Facet-only search, used by the report view.

use common::facet::FacetDefinition;
use common::query_builder::{BuildOptions, build_query};
use common::search_result::{apply_facet_values, normalize};
use common::search_state::SearchState;
use common::serializer::serialize;

use crate::error::SearchError;
use crate::search_client::SearchClient;

/// Run the facet requests of `state` without fetching records and return its
/// facets with their display values filled in.
pub async fn search_facets(client: &SearchClient, state: &SearchState) -> Result<Vec<FacetDefinition>, SearchError> {
    let mut doc = build_query(state, BuildOptions { include_facets: true, include_fields: false })?;
    doc.from = None;
    doc.size = Some(0);

    let raw = client.get(&serialize(&doc)?).await?;
    let results = normalize(raw);

    let mut facets = state.facets.clone();
    apply_facet_values(&mut facets, &results);
    Ok(facets)
}
