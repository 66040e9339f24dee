use common::search_result::RawSearchResponse;
use common::share_url::SOURCE_PARAM;
use url::Url;

use crate::error::SearchError;

/// `GET <search_url>?source=<query document>` and decode the raw response.
pub async fn search_engine_get(
    client: &reqwest::Client,
    search_url: &Url,
    source: &str,
) -> Result<RawSearchResponse, SearchError> {
    tracing::debug!("SEARCH SOURCE: {}", source);
    let t0 = std::time::Instant::now();

    let response = client.get(search_url.clone()).query(&[(SOURCE_PARAM, source)]).send().await?;
    let status = response.status();
    let response_txt = response.text().await?;
    if status.is_client_error() || status.is_server_error() {
        tracing::error!("SEARCH FAILED: {}: {}", status, response_txt);
        return Err(SearchError::Status { status, body: response_txt });
    }

    let dt_ms = t0.elapsed().as_millis();
    tracing::info!("SEARCH RESPONSE: len = {} (searched in {}ms)", response_txt.len(), dt_ms);
    let response: RawSearchResponse = serde_json::from_str(&response_txt)?;
    Ok(response)
}
