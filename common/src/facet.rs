//! Facet definitions and the values a search fills into them.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::facet_registry::{
    DEFAULT_DISTANCE_LAT, DEFAULT_DISTANCE_LON, DEFAULT_DISTANCE_UNIT, DEFAULT_FACET_LABEL_FIELD,
    DEFAULT_FACET_SIZE, DEFAULT_FACET_VALUE_FIELD,
};
use crate::search_result::FacetResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FacetType {
    #[default]
    Terms,
    Range,
    GeoDistance,
    Statistical,
    TermsStats,
    DateHistogram,
}

impl FacetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacetType::Terms => "terms",
            FacetType::Range => "range",
            FacetType::GeoDistance => "geo_distance",
            FacetType::Statistical => "statistical",
            FacetType::TermsStats => "terms_stats",
            FacetType::DateHistogram => "date_histogram",
        }
    }

    /// Active filters on these facets hold one `{from, to}` range instead of a value list.
    pub fn is_range_like(&self) -> bool {
        match self {
            FacetType::Range | FacetType::GeoDistance | FacetType::DateHistogram => true,
            FacetType::Terms | FacetType::Statistical | FacetType::TermsStats => false,
        }
    }
}

impl Display for FacetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FacetLogic {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl FacetLogic {
    pub fn toggled(self) -> Self {
        match self {
            FacetLogic::And => FacetLogic::Or,
            FacetLogic::Or => FacetLogic::And,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FacetLogic::And => "AND",
            FacetLogic::Or => "OR",
        }
    }
}

impl Display for FacetLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering the search engine applies to facet buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FacetOrder {
    #[default]
    Count,
    ReverseCount,
    Term,
    ReverseTerm,
}

impl FacetOrder {
    /// Next order in the facet sort button cycle.
    pub fn next(self) -> Self {
        match self {
            FacetOrder::Term => FacetOrder::ReverseTerm,
            FacetOrder::ReverseTerm => FacetOrder::Count,
            FacetOrder::Count => FacetOrder::ReverseCount,
            FacetOrder::ReverseCount => FacetOrder::Term,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FacetOrder::Count => "count",
            FacetOrder::ReverseCount => "reverse_count",
            FacetOrder::Term => "term",
            FacetOrder::ReverseTerm => "reverse_term",
        }
    }
}

/// A single filter value. The search engine stores keyword, numeric and boolean
/// fields, and shared URLs may carry any of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl TermValue {
    pub fn is_empty_string(&self) -> bool {
        match self {
            TermValue::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl Display for TermValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermValue::Bool(b) => write!(f, "{b}"),
            TermValue::Int(i) => write!(f, "{i}"),
            TermValue::Float(x) => write!(f, "{x}"),
            TermValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for TermValue {
    fn from(value: &str) -> Self {
        TermValue::String(value.to_string())
    }
}

impl From<String> for TermValue {
    fn from(value: String) -> Self {
        TermValue::String(value)
    }
}

impl From<i64> for TermValue {
    fn from(value: i64) -> Self {
        TermValue::Int(value)
    }
}

impl From<i32> for TermValue {
    fn from(value: i32) -> Self {
        TermValue::Int(value.into())
    }
}

impl From<f64> for TermValue {
    fn from(value: f64) -> Self {
        TermValue::Float(value)
    }
}

impl From<bool> for TermValue {
    fn from(value: bool) -> Self {
        TermValue::Bool(value)
    }
}

/// `{from?, to?}` bounds: `from` is inclusive, `to` exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RangeValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<TermValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<TermValue>,
}

impl RangeValue {
    pub fn new(from: Option<TermValue>, to: Option<TermValue>) -> Self {
        Self { from, to }
    }

    pub fn between(from: impl Into<TermValue>, to: impl Into<TermValue>) -> Self {
        Self { from: Some(from.into()), to: Some(to.into()) }
    }
}

/// Bounds compare by their printed form: ranges rehydrated from a URL carry
/// strings where the facet configuration carries numbers.
fn same_bound(a: &Option<TermValue>, b: &Option<TermValue>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.to_string() == b.to_string(),
        _ => false,
    }
}

/// One configured bucket of a range or geo distance facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RangeBucket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<TermValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<TermValue>,
    #[serde(default)]
    pub display: String,
}

impl RangeBucket {
    pub fn new(from: Option<TermValue>, to: Option<TermValue>, display: impl Into<String>) -> Self {
        Self { from, to, display: display.into() }
    }

    pub fn bounds(&self) -> RangeValue {
        RangeValue { from: self.from.clone(), to: self.to.clone() }
    }

    pub fn matches(&self, value: &RangeValue) -> bool {
        same_bound(&self.from, &value.from) && same_bound(&self.to, &value.to)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FacetDefinition {
    pub field: String,
    pub display: Option<String>,
    #[serde(rename = "type")]
    pub facet_type: Option<FacetType>,
    pub size: Option<usize>,
    pub logic: Option<FacetLogic>,
    pub order: Option<FacetOrder>,
    pub open: Option<bool>,
    pub hidden: Option<bool>,
    pub disabled: Option<bool>,
    /// Facets returning fewer values than this are disabled after a search.
    pub deactivate_threshold: Option<usize>,
    pub range: Vec<RangeBucket>,
    pub distance: Vec<RangeBucket>,
    pub unit: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub interval: Option<String>,
    pub value_field: Option<String>,
    pub facet_label_field: Option<String>,
    pub facet_value_field: Option<String>,
    pub hide_empty_range: Option<bool>,
    pub hide_empty_distance: Option<bool>,
    pub hide_empty_date_bin: Option<bool>,
    pub ignore_empty_string: Option<bool>,

    /// Buckets of the last search, truncated to `size`.
    #[serde(skip)]
    pub values: Option<FacetResult>,
}

impl FacetDefinition {
    pub fn new(field: impl Into<String>, facet_type: FacetType) -> Self {
        Self { field: field.into(), facet_type: Some(facet_type), ..Default::default() }
    }

    pub fn terms(field: impl Into<String>) -> Self {
        Self::new(field, FacetType::Terms)
    }

    pub fn range(field: impl Into<String>, range: Vec<RangeBucket>) -> Self {
        Self { range, ..Self::new(field, FacetType::Range) }
    }

    pub fn geo_distance(field: impl Into<String>, distance: Vec<RangeBucket>, unit: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            distance,
            unit: Some(unit.into()),
            lat: Some(lat),
            lon: Some(lon),
            ..Self::new(field, FacetType::GeoDistance)
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn with_logic(mut self, logic: FacetLogic) -> Self {
        self.logic = Some(logic);
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_order(mut self, order: FacetOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn facet_type(&self) -> FacetType {
        self.facet_type.unwrap_or_default()
    }

    pub fn display_name(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.field)
    }

    pub fn size(&self) -> usize {
        self.size.unwrap_or(DEFAULT_FACET_SIZE)
    }

    pub fn logic(&self) -> FacetLogic {
        self.logic.unwrap_or_default()
    }

    pub fn order(&self) -> FacetOrder {
        self.order.unwrap_or_default()
    }

    pub fn unit(&self) -> &str {
        self.unit.as_deref().unwrap_or(DEFAULT_DISTANCE_UNIT)
    }

    pub fn lat(&self) -> f64 {
        self.lat.unwrap_or(DEFAULT_DISTANCE_LAT)
    }

    pub fn lon(&self) -> f64 {
        self.lon.unwrap_or(DEFAULT_DISTANCE_LON)
    }

    /// GeoJSON order: longitude first.
    pub fn origin(&self) -> [f64; 2] {
        [self.lon(), self.lat()]
    }

    pub fn label_field(&self) -> &str {
        self.facet_label_field.as_deref().unwrap_or(DEFAULT_FACET_LABEL_FIELD)
    }

    pub fn count_field(&self) -> &str {
        self.facet_value_field.as_deref().unwrap_or(DEFAULT_FACET_VALUE_FIELD)
    }

    pub fn is_open(&self) -> bool {
        self.open.unwrap_or(false)
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden.unwrap_or(false)
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.unwrap_or(false)
    }

    /// Configured buckets for range-like facets.
    pub fn buckets(&self) -> &[RangeBucket] {
        match self.facet_type() {
            FacetType::GeoDistance => &self.distance,
            _ => &self.range,
        }
    }

    pub fn bucket_for(&self, value: &RangeValue) -> Option<&RangeBucket> {
        self.buckets().iter().find(|bucket| bucket.matches(value))
    }

    /// Whether zero-count (or empty-string) buckets are dropped from the display list.
    pub fn hides_empty(&self) -> bool {
        match self.facet_type() {
            FacetType::Terms | FacetType::TermsStats => self.ignore_empty_string.unwrap_or(false),
            FacetType::Range => self.hide_empty_range.unwrap_or(false),
            FacetType::GeoDistance => self.hide_empty_distance.unwrap_or(false),
            FacetType::DateHistogram => self.hide_empty_date_bin.unwrap_or(false),
            FacetType::Statistical => false,
        }
    }
}
