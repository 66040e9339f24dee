//! Full search: one page of records plus every facet.

use common::query_builder::{BuildOptions, build_query};
use common::search_result::{ResultSet, normalize};
use common::search_state::SearchState;
use common::serializer::serialize;

use crate::error::SearchError;
use crate::search_client::SearchClient;

pub async fn search_for_results(client: &SearchClient, state: &SearchState) -> Result<ResultSet, SearchError> {
    let doc = build_query(state, BuildOptions::default())?;
    let source = serialize(&doc)?;
    tracing::info!("search for results: q={:?} from={} size={}", state.q, state.from, state.page_size);

    let raw = client.get(&source).await?;
    let results = normalize(raw);
    tracing::info!("search found {} records, {} facets", results.found, results.facets.len());
    Ok(results)
}
