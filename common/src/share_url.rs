//! Shareable links: a search encoded as the `source` URL parameter.

use std::collections::BTreeMap;

use serde_json::Value;
use url::Url;

use crate::error::{FacetviewError, Result};
use crate::query_document::QueryDocument;
use crate::query_parser::parse_query;
use crate::search_state::SearchState;
use crate::serializer::{deserialize_value, serialize};

pub const SOURCE_PARAM: &str = "source";
pub const ANCHOR_PARAM: &str = "facetview_url_anchor";

/// `base` with its query string replaced by `source=<doc>`. The fragment is kept.
pub fn shareable_url(base: &Url, doc: &QueryDocument) -> Result<Url> {
    let source = serialize(doc)?;
    let mut url = base.clone();
    url.query_pairs_mut().clear().append_pair(SOURCE_PARAM, &source);
    Ok(url)
}

/// Every query parameter, percent-decoded. Values that look like JSON arrays
/// or objects are decoded as JSON; the fragment, if any, is reported under
/// [`ANCHOR_PARAM`] with its leading `#`.
pub fn url_params(url: &Url) -> BTreeMap<String, Value> {
    let mut params = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        params.insert(key.into_owned(), param_value(&value));
    }
    if let Some(fragment) = url.fragment() {
        params.insert(ANCHOR_PARAM.to_string(), Value::String(format!("#{fragment}")));
    }
    params
}

fn param_value(raw: &str) -> Value {
    let unquoted = raw.strip_prefix('"').unwrap_or(raw);
    let unquoted = unquoted.strip_suffix('"').unwrap_or(unquoted);
    if unquoted.starts_with('[') || unquoted.starts_with('{') {
        match serde_json::from_str(unquoted) {
            Ok(value) => return value,
            Err(e) => tracing::warn!("url parameter is not valid json, keeping it as text: {e}"),
        }
    }
    Value::String(raw.to_string())
}

/// State described by the `source` parameter of `url`, merged over
/// `defaults`. A missing parameter yields the defaults; an unreadable one
/// is logged and also yields the defaults.
pub fn state_from_url(url: &Url, defaults: &SearchState) -> SearchState {
    let mut params = url_params(url);
    let Some(source) = params.remove(SOURCE_PARAM) else {
        return defaults.clone();
    };

    match restore(source, defaults) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!("ignoring unreadable shared search in {url}: {e}");
            defaults.clone()
        }
    }
}

fn restore(source: Value, defaults: &SearchState) -> Result<SearchState> {
    if !source.is_object() {
        return Err(FacetviewError::MalformedSource(format!("expected a json object, got {source}")));
    }
    let doc = deserialize_value(source)?;
    let mut state = defaults.clone();
    state.apply_parsed(parse_query(&doc))?;
    Ok(state)
}
