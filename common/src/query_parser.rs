//! Reads search options back out of a query document, the inverse of
//! `query_builder`. Used to rehydrate state from a shared URL.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::facet::{FacetLogic, RangeValue, TermValue};
use crate::query_document::{FilterClause, FreeText, QueryDocument};
use crate::search_state::{ActiveFilter, SortField};

/// Distance units the search engine accepts as a suffix on geo bounds.
pub const DISTANCE_UNITS: [&str; 14] = [
    "km",
    "mi",
    "miles",
    "in",
    "inch",
    "yd",
    "yards",
    "kilometers",
    "mm",
    "millimeters",
    "cm",
    "centimeters",
    "m",
    "meters",
];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedQuery {
    pub from: Option<u64>,
    pub page_size: Option<u64>,
    pub sort: Option<Vec<SortField>>,
    pub q: Option<String>,
    pub searchfield: Option<String>,
    pub default_operator: Option<FacetLogic>,
    pub active_filters: BTreeMap<String, ActiveFilter>,
    pub selected_operators: BTreeMap<String, FacetLogic>,
}

pub fn parse_query(doc: &QueryDocument) -> ParsedQuery {
    let mut parsed = ParsedQuery {
        from: doc.from,
        page_size: doc.size,
        sort: doc.sort.as_ref().and_then(parse_sort),
        ..Default::default()
    };

    for clause in doc.must() {
        parse_clause(clause, &mut parsed);
    }

    match doc.free_text() {
        FreeText::QueryString(qs) => {
            parsed.q = Some(qs.query.clone());
            parsed.searchfield = qs.default_field.clone().filter(|f| !f.is_empty());
            parsed.default_operator = qs.default_operator;
        }
        FreeText::MatchAll(_) => parsed.q = Some(String::new()),
    }

    parsed
}

fn parse_clause(clause: &FilterClause, parsed: &mut ParsedQuery) {
    match clause {
        FilterClause::Term(fields) => {
            for (field, value) in fields {
                parsed.selected_operators.insert(field.clone(), FacetLogic::And);
                push_terms(&mut parsed.active_filters, field, std::slice::from_ref(value));
            }
        }
        FilterClause::Terms(fields) => {
            for (field, values) in fields {
                parsed.selected_operators.insert(field.clone(), FacetLogic::Or);
                push_terms(&mut parsed.active_filters, field, values);
            }
        }
        FilterClause::Range(fields) => {
            for (field, bounds) in fields {
                let range = RangeValue::new(bounds.gte.clone(), bounds.lt.clone());
                parsed.active_filters.insert(field.clone(), ActiveFilter::Range(range));
            }
        }
        FilterClause::GeoDistanceRange(geo) => {
            let bound = |b: &Option<String>| b.as_deref().map(|s| distance_value(strip_distance_units(s)));
            let range = RangeValue::new(bound(&geo.gte), bound(&geo.lt));
            parsed.active_filters.insert(geo.field.clone(), ActiveFilter::Range(range));
        }
        FilterClause::Raw(raw) => tracing::debug!("ignoring filter clause {raw}"),
    }
}

fn push_terms(filters: &mut BTreeMap<String, ActiveFilter>, field: &str, values: &[TermValue]) {
    let entry = filters.entry(field.to_string()).or_insert(ActiveFilter::Terms(Vec::new()));
    match entry {
        ActiveFilter::Terms(existing) => existing.extend_from_slice(values),
        ActiveFilter::Range(_) => *entry = ActiveFilter::Terms(values.to_vec()),
    }
}

/// Sort is stored verbatim in the document; entries that are not
/// `{field: {"order": ...}}` make the whole sort unreadable.
fn parse_sort(sort: &Value) -> Option<Vec<SortField>> {
    let parsed = match sort {
        Value::Array(_) => serde_json::from_value(sort.clone()),
        _ => serde_json::from_value(sort.clone()).map(|field| vec![field]),
    };
    match parsed {
        Ok(sort) => Some(sort),
        Err(e) => {
            tracing::warn!("skipping unreadable sort {sort}: {e}");
            None
        }
    }
}

/// Drop a trailing distance unit. Longer unit names are tried first, so
/// `"5kilometers"` loses `kilometers` rather than `meters`.
pub fn strip_distance_units(value: &str) -> &str {
    let mut units = DISTANCE_UNITS;
    units.sort_by_key(|unit| std::cmp::Reverse(unit.len()));
    units
        .iter()
        .find_map(|unit| value.strip_suffix(unit))
        .unwrap_or(value)
}

fn distance_value(value: &str) -> TermValue {
    if let Ok(i) = value.parse::<i64>() {
        TermValue::Int(i)
    } else if let Ok(x) = value.parse::<f64>() {
        TermValue::Float(x)
    } else {
        TermValue::String(value.to_string())
    }
}
