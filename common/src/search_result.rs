//! Raw search engine responses and the normalized result set built from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::facet::{FacetDefinition, TermValue};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSearchResponse {
    pub hits: RawSearchResultHits,
    #[serde(default)]
    pub facets: BTreeMap<String, Value>,
    #[serde(default)]
    pub took: Option<u64>,
    #[serde(default)]
    pub timed_out: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSearchResultHits {
    pub total: RawHitsTotal,
    #[serde(default)]
    pub hits: Vec<RawSearchResultHit>,
}

/// Older engines report a bare number, newer ones `{"value": n, "relation": ...}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawHitsTotal {
    Count(u64),
    Object { value: u64 },
}

impl RawHitsTotal {
    pub fn value(&self) -> u64 {
        match self {
            RawHitsTotal::Count(n) => *n,
            RawHitsTotal::Object { value } => *value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSearchResultHit {
    #[serde(default)]
    pub _id: Option<String>,
    #[serde(default)]
    pub _score: Option<f64>,
    #[serde(default)]
    pub _source: Option<Map<String, Value>>,
    /// Present when fields or partial fields were requested.
    #[serde(default)]
    pub fields: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResultSet {
    pub records: Vec<Map<String, Value>>,
    pub found: u64,
    pub facets: BTreeMap<String, FacetResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermCount {
    pub term: TermValue,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeCount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<TermValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<TermValue>,
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
}

impl RangeCount {
    pub fn bounds(&self) -> crate::facet::RangeValue {
        crate::facet::RangeValue::new(self.from.clone(), self.to.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StatisticalSummary {
    pub count: u64,
    pub total: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub sum_of_squares: f64,
    pub variance: f64,
    pub std_deviation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsStatsEntry {
    pub term: TermValue,
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateHistogramEntry {
    pub time: i64,
    pub count: u64,
}

/// Buckets of one facet, by facet kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", content = "values", rename_all = "snake_case")]
pub enum FacetResult {
    Terms(Vec<TermCount>),
    Ranges(Vec<RangeCount>),
    Statistical(StatisticalSummary),
    TermsStats(Vec<TermsStatsEntry>),
    DateHistogram(Vec<DateHistogramEntry>),
}

impl FacetResult {
    pub fn len(&self) -> usize {
        match self {
            FacetResult::Terms(v) => v.len(),
            FacetResult::Ranges(v) => v.len(),
            FacetResult::Statistical(_) => 1,
            FacetResult::TermsStats(v) => v.len(),
            FacetResult::DateHistogram(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every bucket as a JSON object, for label/value lookups by field name.
    pub fn entries(&self) -> Vec<Value> {
        fn to_values<T: Serialize>(items: &[T]) -> Vec<Value> {
            items.iter().filter_map(|item| serde_json::to_value(item).ok()).collect()
        }
        match self {
            FacetResult::Terms(v) => to_values(v),
            FacetResult::Ranges(v) => to_values(v),
            FacetResult::Statistical(s) => to_values(std::slice::from_ref(s)),
            FacetResult::TermsStats(v) => to_values(v),
            FacetResult::DateHistogram(v) => to_values(v),
        }
    }

    /// Drop empty buckets (when asked) and cut term lists down to `size`.
    /// Range and histogram buckets are kept whole.
    fn for_display(&self, size: usize, hide_empty: bool) -> FacetResult {
        match self {
            FacetResult::Terms(v) => FacetResult::Terms(
                v.iter().filter(|t| !(hide_empty && t.term.is_empty_string())).take(size).cloned().collect(),
            ),
            FacetResult::Ranges(v) => FacetResult::Ranges(
                v.iter().filter(|r| !(hide_empty && r.count == 0)).cloned().collect(),
            ),
            FacetResult::Statistical(s) => FacetResult::Statistical(s.clone()),
            FacetResult::TermsStats(v) => FacetResult::TermsStats(
                v.iter().filter(|t| !(hide_empty && t.term.is_empty_string())).take(size).cloned().collect(),
            ),
            FacetResult::DateHistogram(v) => FacetResult::DateHistogram(
                v.iter().filter(|e| !(hide_empty && e.count == 0)).cloned().collect(),
            ),
        }
    }
}

pub fn normalize(raw: RawSearchResponse) -> ResultSet {
    let found = raw.hits.total.value();
    let records = raw
        .hits
        .hits
        .into_iter()
        .map(|hit| hit.fields.or(hit._source).unwrap_or_default())
        .collect();

    let mut facets = BTreeMap::new();
    for (name, bucket) in raw.facets {
        match normalize_facet(&bucket) {
            Some(result) => {
                facets.insert(name, result);
            }
            None => tracing::warn!("skipping unrecognised facet bucket {name}: {bucket}"),
        }
    }

    ResultSet { records, found, facets }
}

fn normalize_facet(bucket: &Value) -> Option<FacetResult> {
    fn list<T: serde::de::DeserializeOwned>(bucket: &Value, key: &str) -> Option<Vec<T>> {
        serde_json::from_value(bucket.get(key)?.clone()).ok()
    }

    let facet_type = bucket.get("_type").and_then(Value::as_str);
    match facet_type {
        Some("terms") => list(bucket, "terms").map(FacetResult::Terms),
        Some("range") | Some("geo_distance") => list(bucket, "ranges").map(FacetResult::Ranges),
        Some("statistical") => serde_json::from_value(bucket.clone()).ok().map(FacetResult::Statistical),
        Some("terms_stats") => list(bucket, "terms").map(FacetResult::TermsStats),
        Some("date_histogram") => list(bucket, "entries").map(FacetResult::DateHistogram),
        _ => {
            if bucket.get("terms").is_some() {
                list(bucket, "terms").map(FacetResult::Terms)
            } else if bucket.get("ranges").is_some() {
                list(bucket, "ranges").map(FacetResult::Ranges)
            } else if bucket.get("entries").is_some() {
                list(bucket, "entries").map(FacetResult::DateHistogram)
            } else {
                None
            }
        }
    }
}

/// Store each facet's display values: empty buckets dropped when the facet
/// asks for it, then truncated to the facet size, which undoes the inflation
/// of the request. Facets below their `deactivate_threshold` get disabled.
pub fn apply_facet_values(facets: &mut [FacetDefinition], results: &ResultSet) {
    for facet in facets.iter_mut() {
        let values = results
            .facets
            .get(&facet.field)
            .map(|result| result.for_display(facet.size(), facet.hides_empty()));

        if let Some(threshold) = facet.deactivate_threshold {
            let count = values.as_ref().map(FacetResult::len).unwrap_or(0);
            facet.disabled = Some(count < threshold);
        }
        facet.values = values;
    }
}
