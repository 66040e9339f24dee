use common::query_builder::{BuildOptions, build_query};
use common::search_state::SearchState;
use common::serializer::serialize;

use crate::error::SearchError;
use crate::search_client::SearchClient;

/// Number of records matching `state`, without fetching records or facets.
pub async fn search_for_results_hit_count(client: &SearchClient, state: &SearchState) -> Result<u64, SearchError> {
    let mut doc = build_query(state, BuildOptions { include_facets: false, include_fields: false })?;
    doc.from = None;
    doc.size = Some(0);

    let raw = client.get(&serialize(&doc)?).await?;
    Ok(raw.hits.total.value())
}
