//! Typed shape of the query document sent to the search engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::facet::{FacetLogic, FacetOrder, RangeValue, TermValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QueryDocument {
    pub query: Query,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_fields: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets: Option<BTreeMap<String, FacetRequest>>,
}

impl QueryDocument {
    pub fn free_text(&self) -> &FreeText {
        match &self.query {
            Query::Filtered(filtered) => &filtered.query,
            Query::FreeText(free_text) => free_text,
        }
    }

    pub fn must(&self) -> &[FilterClause] {
        match &self.query {
            Query::Filtered(filtered) => &filtered.filter.bool_filter.must,
            Query::FreeText(_) => &[],
        }
    }
}

/// Either a filtered query or, with no filters, the free-text clause itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    Filtered(Box<FilteredQuery>),
    #[serde(untagged)]
    FreeText(FreeText),
}

impl Default for Query {
    fn default() -> Self {
        Query::FreeText(FreeText::MatchAll(MatchAll {}))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredQuery {
    pub filter: BoolFilter,
    pub query: FreeText,
}

impl FilteredQuery {
    pub fn new(must: Vec<FilterClause>, query: FreeText) -> Self {
        Self { filter: BoolFilter { bool_filter: MustClauses { must } }, query }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolFilter {
    #[serde(rename = "bool")]
    pub bool_filter: MustClauses,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MustClauses {
    #[serde(default)]
    pub must: Vec<FilterClause>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeText {
    QueryString(QueryString),
    MatchAll(MatchAll),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryString {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_operator: Option<FacetLogic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MatchAll {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterClause {
    Term(BTreeMap<String, TermValue>),
    Terms(BTreeMap<String, Vec<TermValue>>),
    Range(BTreeMap<String, RangeBounds>),
    GeoDistanceRange(GeoDistanceRange),
    /// Any other clause, kept verbatim.
    #[serde(untagged)]
    Raw(Value),
}

impl FilterClause {
    pub fn term(field: impl Into<String>, value: TermValue) -> Self {
        FilterClause::Term(BTreeMap::from([(field.into(), value)]))
    }

    pub fn terms(field: impl Into<String>, values: Vec<TermValue>) -> Self {
        FilterClause::Terms(BTreeMap::from([(field.into(), values)]))
    }

    pub fn range(field: impl Into<String>, bounds: RangeBounds) -> Self {
        FilterClause::Range(BTreeMap::from([(field.into(), bounds)]))
    }
}

/// `lt` is the exclusive upper bound, `gte` the inclusive lower bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RangeBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<TermValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<TermValue>,
}

/// Keys of a `geo_distance_range` clause that are not the field name.
const GEO_RANGE_KEYWORDS: [&str; 12] = [
    "lt",
    "lte",
    "gt",
    "gte",
    "from",
    "to",
    "include_lower",
    "include_upper",
    "unit",
    "distance_type",
    "optimize_bbox",
    "_name",
];

/// `{"lt": "10km", "gte": "5km", "<field>": [lon, lat]}`: bounds sit beside the
/// field, which maps to the origin the distance is measured from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct GeoDistanceRange {
    pub field: String,
    pub origin: Value,
    pub lt: Option<String>,
    pub gte: Option<String>,
}

fn bound_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl TryFrom<Map<String, Value>> for GeoDistanceRange {
    type Error = String;

    fn try_from(mut map: Map<String, Value>) -> Result<Self, Self::Error> {
        let lt = map.get("lt").and_then(bound_string);
        let gte = map.get("gte").and_then(bound_string);
        let field = map
            .keys()
            .find(|key| !GEO_RANGE_KEYWORDS.contains(&key.as_str()))
            .cloned()
            .ok_or("geo_distance_range clause names no field")?;
        let origin = map.remove(&field).unwrap_or(Value::Null);
        Ok(GeoDistanceRange { field, origin, lt, gte })
    }
}

impl From<GeoDistanceRange> for Map<String, Value> {
    fn from(value: GeoDistanceRange) -> Self {
        let mut map = Map::new();
        if let Some(lt) = value.lt {
            map.insert("lt".to_string(), Value::String(lt));
        }
        if let Some(gte) = value.gte {
            map.insert("gte".to_string(), Value::String(gte));
        }
        map.insert(value.field, value.origin);
        map
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetRequest {
    Terms(TermsFacetRequest),
    /// `{"<field>": [{from?, to?}, ...]}`
    Range(BTreeMap<String, Vec<RangeValue>>),
    GeoDistance(GeoDistanceFacetRequest),
    Statistical(StatisticalFacetRequest),
    TermsStats(TermsStatsFacetRequest),
    DateHistogram(DateHistogramFacetRequest),
    /// Caller supplied facet, merged verbatim.
    #[serde(untagged)]
    Raw(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsFacetRequest {
    pub field: String,
    pub size: usize,
    pub order: FacetOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoDistanceFacetRequest {
    /// Field name mapped to its `[lon, lat]` origin.
    #[serde(flatten)]
    pub origin: BTreeMap<String, [f64; 2]>,
    pub unit: String,
    pub ranges: Vec<RangeValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalFacetRequest {
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsStatsFacetRequest {
    pub key_field: String,
    pub value_field: String,
    pub size: usize,
    pub order: FacetOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateHistogramFacetRequest {
    pub field: String,
    pub interval: String,
}
