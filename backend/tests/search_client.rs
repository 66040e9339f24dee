use std::time::Duration;

use backend::api::search::{search_facets, search_for_results, search_for_results_hit_count};
use backend::{SearchClient, SearchEndpointConfig, SearchError};
use common::facet::{FacetDefinition, FacetLogic};
use common::search_result::FacetResult;
use common::search_state::SearchState;
use common::serializer::deserialize;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> SearchClient {
    let url = Url::parse(&format!("{}/_search", server.uri())).unwrap();
    SearchClient::new(SearchEndpointConfig::new(url))
}

fn state() -> SearchState {
    let mut state = SearchState::with_facets(vec![FacetDefinition::terms("category").with_logic(FacetLogic::Or)]);
    state.set_query_text("rust");
    state
}

fn response() -> Value {
    let terms: Vec<Value> = (0..15).map(|i| json!({"term": format!("c{i}"), "count": 100 - i})).collect();
    json!({
        "took": 3,
        "timed_out": false,
        "hits": {"total": 2, "hits": [
            {"_id": "1", "_source": {"title": "Programming Rust"}},
            {"_id": "2", "_source": {"title": "Rust in Action"}}
        ]},
        "facets": {"category": {"_type": "terms", "terms": terms}}
    })
}

async fn sent_source(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let (_, source) = requests[0].url.query_pairs().find(|(k, _)| k == "source").unwrap();
    serde_json::to_value(deserialize(&source).unwrap()).unwrap()
}

#[tokio::test]
async fn search_sends_the_query_as_source_and_normalizes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response()))
        .expect(1)
        .mount(&server)
        .await;

    let results = search_for_results(&client_for(&server), &state()).await.unwrap();
    assert_eq!(results.found, 2);
    assert_eq!(results.records[1]["title"], json!("Rust in Action"));
    assert!(matches!(&results.facets["category"], FacetResult::Terms(t) if t.len() == 15));

    let source = sent_source(&server).await;
    assert_eq!(source["query"], json!({"query_string": {"query": "rust"}}));
    assert_eq!(source["facets"]["category"]["terms"]["size"], json!(110));
    assert_eq!(source["size"], json!(10));
}

#[tokio::test]
async fn error_status_keeps_the_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("shard failure"))
        .mount(&server)
        .await;

    let err = search_for_results(&client_for(&server), &state()).await.unwrap_err();
    match err {
        SearchError::Status { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "shard failure");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreadable_response_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let err = search_for_results(&client_for(&server), &state()).await.unwrap_err();
    assert!(matches!(err, SearchError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn slow_engine_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response()).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/_search", server.uri())).unwrap();
    let client = SearchClient::new(SearchEndpointConfig::new(url).with_timeout(Duration::from_millis(50)));
    let err = search_for_results(&client, &state()).await.unwrap_err();
    assert!(matches!(err, SearchError::Timeout(t) if t == Duration::from_millis(50)), "{err:?}");
}

#[tokio::test]
async fn unreachable_engine_is_a_transport_error() {
    let client = SearchClient::new(SearchEndpointConfig::new(Url::parse("http://127.0.0.1:1/_search").unwrap()));
    let err = search_for_results(&client, &state()).await.unwrap_err();
    assert!(matches!(err, SearchError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn undefined_facet_fails_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response()))
        .expect(0)
        .mount(&server)
        .await;

    let mut state = state();
    state.active_filters.insert("publisher".to_string(), common::search_state::ActiveFilter::terms(["x"]));
    let err = search_for_results(&client_for(&server), &state).await.unwrap_err();
    assert!(matches!(err, SearchError::Query(_)), "{err:?}");
}

#[tokio::test]
async fn hit_count_asks_for_no_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": {"total": {"value": 42}, "hits": []}})))
        .mount(&server)
        .await;

    let count = search_for_results_hit_count(&client_for(&server), &state()).await.unwrap();
    assert_eq!(count, 42);

    let source = sent_source(&server).await;
    assert_eq!(source["size"], json!(0));
    assert_eq!(source.get("facets"), None);
}

#[tokio::test]
async fn facet_search_truncates_to_facet_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response()))
        .mount(&server)
        .await;

    let facets = search_facets(&client_for(&server), &state()).await.unwrap();
    let Some(FacetResult::Terms(values)) = &facets[0].values else {
        panic!("terms values expected");
    };
    assert_eq!(values.len(), 10);
    assert_eq!(values[0].term.to_string(), "c0");
}
