//! Builds the search engine query document from a search state.

use std::collections::BTreeMap;

use crate::error::{FacetviewError, Result};
use crate::facet::{FacetDefinition, FacetLogic, FacetType, RangeValue, TermValue};
use crate::facet_registry;
use crate::fuzzify::fuzzify;
use crate::query_document::{
    DateHistogramFacetRequest, FacetRequest, FilterClause, FilteredQuery, FreeText, GeoDistanceFacetRequest,
    GeoDistanceRange, MatchAll, Query, QueryDocument, QueryString, RangeBounds, StatisticalFacetRequest,
    TermsFacetRequest, TermsStatsFacetRequest,
};
use crate::search_state::{ActiveFilter, SearchState};

pub const DEFAULT_DATE_INTERVAL: &str = "month";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    pub include_facets: bool,
    pub include_fields: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { include_facets: true, include_fields: true }
    }
}

pub fn build_query(state: &SearchState, options: BuildOptions) -> Result<QueryDocument> {
    let must = build_filters(state)?;
    let free_text = build_free_text(state);

    let query = if must.is_empty() {
        Query::FreeText(free_text)
    } else {
        Query::Filtered(Box::new(FilteredQuery::new(must, free_text)))
    };

    let mut doc = QueryDocument {
        query,
        from: Some(state.from),
        size: Some(state.page_size),
        ..Default::default()
    };

    if !state.sort.is_empty() {
        doc.sort = Some(serde_json::to_value(&state.sort)?);
    }

    if options.include_fields {
        doc.fields = state.fields.clone();
        doc.partial_fields = state.partial_fields.clone();
    }

    if options.include_facets {
        doc.facets = Some(build_facet_requests(state));
    }

    Ok(doc)
}

/// All `must` clauses: active filters, then predefined filters, then fixed filters.
pub fn build_filters(state: &SearchState) -> Result<Vec<FilterClause>> {
    let mut must = Vec::new();
    for filters in [&state.active_filters, &state.predefined_filters] {
        for (field, filter) in filters {
            let facet = facet_registry::lookup(&state.facets, field)?;
            must.extend(filter_clauses(facet, filter)?);
        }
    }
    must.extend(state.fixed_filters.iter().cloned().map(FilterClause::Raw));
    Ok(must)
}

/// Clauses constraining `facet` to `filter`.
pub fn filter_clauses(facet: &FacetDefinition, filter: &ActiveFilter) -> Result<Vec<FilterClause>> {
    let facet_type = facet.facet_type();
    let mismatch = || FacetviewError::FilterShapeMismatch { field: facet.field.clone(), facet_type };

    match (facet_type, filter) {
        (FacetType::Terms, ActiveFilter::Terms(values)) => Ok(terms_clauses(facet, values)),
        (FacetType::Range | FacetType::DateHistogram, ActiveFilter::Range(range)) => {
            Ok(vec![FilterClause::range(facet.field.clone(), range_bounds(range))])
        }
        (FacetType::GeoDistance, ActiveFilter::Range(range)) => Ok(vec![geo_clause(facet, range)]),
        (FacetType::Statistical | FacetType::TermsStats, _) => {
            Err(FacetviewError::UnsupportedFilter { field: facet.field.clone(), facet_type })
        }
        (FacetType::Terms, ActiveFilter::Range(_)) => Err(mismatch()),
        (FacetType::Range | FacetType::DateHistogram | FacetType::GeoDistance, ActiveFilter::Terms(_)) => {
            Err(mismatch())
        }
    }
}

/// AND logic emits one `term` clause per value, OR logic a single `terms` clause.
fn terms_clauses(facet: &FacetDefinition, values: &[TermValue]) -> Vec<FilterClause> {
    match facet.logic() {
        FacetLogic::And => values
            .iter()
            .map(|value| FilterClause::term(facet.field.clone(), value.clone()))
            .collect(),
        FacetLogic::Or => vec![FilterClause::terms(facet.field.clone(), values.to_vec())],
    }
}

fn range_bounds(range: &RangeValue) -> RangeBounds {
    RangeBounds { lt: range.to.clone(), gte: range.from.clone() }
}

fn geo_clause(facet: &FacetDefinition, range: &RangeValue) -> FilterClause {
    let unit = facet.unit();
    let [lon, lat] = facet.origin();
    FilterClause::GeoDistanceRange(GeoDistanceRange {
        field: facet.field.clone(),
        origin: serde_json::json!([lon, lat]),
        lt: range.to.as_ref().map(|to| format!("{to}{unit}")),
        gte: range.from.as_ref().map(|from| format!("{from}{unit}")),
    })
}

fn build_free_text(state: &SearchState) -> FreeText {
    if state.q.is_empty() {
        return FreeText::MatchAll(MatchAll {});
    }
    FreeText::QueryString(QueryString {
        query: fuzzify(&state.q, state.default_freetext_fuzzify),
        default_field: Some(state.searchfield.clone()).filter(|field| !field.is_empty()),
        default_operator: state.default_operator,
    })
}

/// One count request per facet. Terms counts are gathered per shard, so the
/// top `size` terms of the whole index can be missing from a `size` request:
/// `facet_inflation` extra buckets are requested and the surplus is cut off
/// again in `search_result::apply_facet_values`.
pub fn build_facet_requests(state: &SearchState) -> BTreeMap<String, FacetRequest> {
    let mut requests = BTreeMap::new();
    for facet in &state.facets {
        let inflated_size = facet.size() + state.facet_inflation;
        let request = match facet.facet_type() {
            FacetType::Terms => FacetRequest::Terms(TermsFacetRequest {
                field: facet.field.clone(),
                size: inflated_size,
                order: facet.order(),
            }),
            FacetType::Range => FacetRequest::Range(BTreeMap::from([(
                facet.field.clone(),
                facet.range.iter().map(|bucket| bucket.bounds()).collect(),
            )])),
            FacetType::GeoDistance => FacetRequest::GeoDistance(GeoDistanceFacetRequest {
                origin: BTreeMap::from([(facet.field.clone(), facet.origin())]),
                unit: facet.unit().to_string(),
                ranges: facet.distance.iter().map(|bucket| bucket.bounds()).collect(),
            }),
            FacetType::Statistical => {
                FacetRequest::Statistical(StatisticalFacetRequest { field: facet.field.clone() })
            }
            FacetType::TermsStats => FacetRequest::TermsStats(TermsStatsFacetRequest {
                key_field: facet.field.clone(),
                value_field: facet.value_field.clone().unwrap_or_else(|| facet.field.clone()),
                size: inflated_size,
                order: facet.order(),
            }),
            FacetType::DateHistogram => FacetRequest::DateHistogram(DateHistogramFacetRequest {
                field: facet.field.clone(),
                interval: facet.interval.clone().unwrap_or_else(|| DEFAULT_DATE_INTERVAL.to_string()),
            }),
        };
        requests.insert(facet.field.clone(), request);
    }
    for (name, raw) in &state.extra_facets {
        requests.insert(name.clone(), FacetRequest::Raw(raw.clone()));
    }
    requests
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facet::{FacetOrder, RangeBucket};
    use crate::fuzzify::Fuzzify;
    use crate::search_state::{SortField, SortOrder};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn facets() -> Vec<FacetDefinition> {
        vec![
            FacetDefinition::terms("category").with_logic(FacetLogic::Or),
            FacetDefinition::terms("tag").with_logic(FacetLogic::And),
            FacetDefinition::range(
                "price",
                vec![
                    RangeBucket::new(None, Some(10.into()), "under 10"),
                    RangeBucket::new(Some(10.into()), None, "10 and up"),
                ],
            ),
            FacetDefinition::geo_distance("location", vec![RangeBucket::new(None, Some(10.into()), "near")], "km", 51.5, -0.1),
        ]
    }

    fn no_extras() -> BuildOptions {
        BuildOptions { include_facets: false, include_fields: false }
    }

    fn query_json(state: &SearchState, options: BuildOptions) -> serde_json::Value {
        serde_json::to_value(build_query(state, options).unwrap()).unwrap()
    }

    #[test]
    fn empty_state_is_match_all() {
        let state = SearchState::default();
        assert_eq!(
            query_json(&state, no_extras()),
            json!({"query": {"match_all": {}}, "from": 0, "size": 10})
        );
    }

    #[test]
    fn or_terms_filter_is_one_terms_clause() {
        let mut state = SearchState::with_facets(facets());
        state.active_filters.insert("category".into(), ActiveFilter::terms(["books"]));

        let doc = build_query(&state, no_extras()).unwrap();
        assert_eq!(doc.must(), &[FilterClause::terms("category", vec!["books".into()])]);
        assert_eq!(
            query_json(&state, no_extras())["query"]["filtered"]["filter"],
            json!({"bool": {"must": [{"terms": {"category": ["books"]}}]}})
        );
    }

    #[test]
    fn or_terms_filter_keeps_value_order() {
        let mut state = SearchState::with_facets(facets());
        state.active_filters.insert("category".into(), ActiveFilter::terms(["z", "a", "m"]));
        let doc = build_query(&state, no_extras()).unwrap();
        assert_eq!(doc.must(), &[FilterClause::terms("category", vec!["z".into(), "a".into(), "m".into()])]);
    }

    #[test]
    fn and_terms_filter_emits_a_term_clause_per_value() {
        let mut state = SearchState::with_facets(facets());
        state.active_filters.insert("tag".into(), ActiveFilter::terms(["rust", "async"]));
        let doc = build_query(&state, no_extras()).unwrap();
        assert_eq!(
            doc.must(),
            &[FilterClause::term("tag", "rust".into()), FilterClause::term("tag", "async".into())]
        );
    }

    #[test]
    fn range_filter_omits_absent_bounds() {
        let mut state = SearchState::with_facets(facets());
        state.active_filters.insert("price".into(), ActiveFilter::Range(RangeValue::between(5, 10)));
        assert_eq!(
            build_query(&state, no_extras()).unwrap().must(),
            &[FilterClause::range("price", RangeBounds { lt: Some(10.into()), gte: Some(5.into()) })]
        );

        state.active_filters.insert("price".into(), ActiveFilter::Range(RangeValue::new(Some(0.into()), None)));
        assert_eq!(
            query_json(&state, no_extras())["query"]["filtered"]["filter"]["bool"]["must"],
            json!([{"range": {"price": {"gte": 0}}}])
        );
    }

    #[test]
    fn geo_filter_appends_unit_and_origin() {
        let mut state = SearchState::with_facets(facets());
        state.active_filters.insert("location".into(), ActiveFilter::Range(RangeValue::between(5, 10)));
        assert_eq!(
            query_json(&state, no_extras())["query"]["filtered"]["filter"]["bool"]["must"],
            json!([{"geo_distance_range": {"lt": "10km", "gte": "5km", "location": [-0.1, 51.5]}}])
        );
    }

    #[test]
    fn predefined_and_fixed_filters_follow_active_filters() {
        let mut state = SearchState::with_facets(facets());
        state.active_filters.insert("tag".into(), ActiveFilter::terms(["rust"]));
        state.predefined_filters.insert("category".into(), ActiveFilter::terms(["books"]));
        state.fixed_filters.push(json!({"exists": {"field": "isbn"}}));

        assert_eq!(
            build_query(&state, no_extras()).unwrap().must(),
            &[
                FilterClause::term("tag", "rust".into()),
                FilterClause::terms("category", vec!["books".into()]),
                FilterClause::Raw(json!({"exists": {"field": "isbn"}})),
            ]
        );
    }

    #[test]
    fn filter_on_unknown_facet_is_a_configuration_error() {
        let mut state = SearchState::with_facets(facets());
        state.active_filters.insert("publisher".into(), ActiveFilter::terms(["acme"]));
        assert!(matches!(
            build_query(&state, no_extras()),
            Err(FacetviewError::UndefinedFacet { field }) if field == "publisher"
        ));
    }

    #[test]
    fn free_text_carries_field_operator_and_fuzzing() {
        let mut state = SearchState::default();
        state.q = "hello world".into();
        state.searchfield = "title".into();
        state.default_operator = Some(FacetLogic::Or);
        state.default_freetext_fuzzify = Some(Fuzzify::Wildcard);
        assert_eq!(
            query_json(&state, no_extras())["query"],
            json!({"query_string": {"query": "*hello* *world* ", "default_field": "title", "default_operator": "OR"}})
        );
    }

    #[test]
    fn sort_and_fields_are_included_on_request() {
        let mut state = SearchState::default();
        state.sort = vec![SortField::new("title", SortOrder::Asc)];
        state.fields = Some(vec!["title".into()]);

        let with_fields = query_json(&state, BuildOptions { include_facets: false, include_fields: true });
        assert_eq!(with_fields["sort"], json!([{"title": {"order": "asc"}}]));
        assert_eq!(with_fields["fields"], json!(["title"]));

        let without_fields = query_json(&state, no_extras());
        assert!(without_fields.get("fields").is_none());
    }

    #[test]
    fn facet_requests_are_inflated() {
        let mut state = SearchState::with_facets(facets());
        state.facet_inflation = 100;
        state.facets[0].size = Some(10);
        state.facets[0].order = Some(FacetOrder::Term);
        state.extra_facets.insert("raw".into(), json!({"terms": {"field": "raw"}}));

        let facets = query_json(&state, BuildOptions::default())["facets"].clone();
        assert_eq!(facets["category"], json!({"terms": {"field": "category", "size": 110, "order": "term"}}));
        assert_eq!(facets["price"], json!({"range": {"price": [{"to": 10}, {"from": 10}]}}));
        assert_eq!(
            facets["location"],
            json!({"geo_distance": {"location": [-0.1, 51.5], "unit": "km", "ranges": [{"to": 10}]}})
        );
        assert_eq!(facets["raw"], json!({"terms": {"field": "raw"}}));
    }

    #[test]
    fn statistical_facets_cannot_filter() {
        let facet = FacetDefinition::new("score", FacetType::Statistical);
        assert!(matches!(
            filter_clauses(&facet, &ActiveFilter::terms([1])),
            Err(FacetviewError::UnsupportedFilter { .. })
        ));
    }
}
