//! The search state record and the reducers UI actions apply to it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FacetviewError, Result};
use crate::facet::{FacetDefinition, FacetLogic, FacetOrder, FacetType, RangeValue, TermValue};
use crate::facet_registry::{self, FacetDefaults};
use crate::fuzzify::Fuzzify;
use crate::query_builder;
use crate::query_parser::ParsedQuery;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Largest page size accepted from a shared query.
pub const MAX_PAGE_SIZE: u64 = 10_000;
/// Extra buckets requested per terms facet, see `query_builder`.
pub const DEFAULT_FACET_INFLATION: usize = 100;
pub const SCORE_FIELD: &str = "_score";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub order: SortOrder,
}

/// One `{field: {"order": ...}}` entry of the sort list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, SortSpec>", into = "BTreeMap<String, SortSpec>")]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

impl SortField {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self { field: field.into(), order }
    }
}

impl TryFrom<BTreeMap<String, SortSpec>> for SortField {
    type Error = String;

    fn try_from(value: BTreeMap<String, SortSpec>) -> std::result::Result<Self, Self::Error> {
        if value.len() != 1 {
            return Err(format!("sort entry must name exactly one field, got {}", value.len()));
        }
        let (field, spec) = value.into_iter().next().ok_or("empty sort entry")?;
        Ok(SortField { field, order: spec.order })
    }
}

impl From<SortField> for BTreeMap<String, SortSpec> {
    fn from(value: SortField) -> Self {
        BTreeMap::from([(value.field, SortSpec { order: value.order })])
    }
}

/// A selected constraint on one facet: a value list for terms facets, a single
/// range for range, geo distance and date histogram facets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActiveFilter {
    Terms(Vec<TermValue>),
    Range(RangeValue),
}

impl ActiveFilter {
    pub fn terms<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<TermValue>,
    {
        ActiveFilter::Terms(values.into_iter().map(Into::into).collect())
    }
}

/// Human readable position in the result list (`from` is 1-based here).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub from: u64,
    pub to: u64,
    pub total: u64,
    pub has_prev: bool,
    pub has_next: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchState {
    pub q: String,
    pub searchfield: String,
    pub sort: Vec<SortField>,
    pub from: u64,
    pub page_size: u64,
    pub default_operator: Option<FacetLogic>,
    pub default_freetext_fuzzify: Option<Fuzzify>,
    pub active_filters: BTreeMap<String, ActiveFilter>,
    pub predefined_filters: BTreeMap<String, ActiveFilter>,
    /// Raw clauses appended to every filter list as-is.
    pub fixed_filters: Vec<serde_json::Value>,
    pub facets: Vec<FacetDefinition>,
    pub fields: Option<Vec<String>>,
    pub partial_fields: Option<serde_json::Value>,
    /// Raw facet requests merged into the query without inflation.
    pub extra_facets: BTreeMap<String, serde_json::Value>,
    #[serde(alias = "elasticsearch_facet_inflation")]
    pub facet_inflation: usize,

    /// Set while a search request is in flight.
    #[serde(skip)]
    pub searching: bool,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            q: String::new(),
            searchfield: String::new(),
            sort: Vec::new(),
            from: 0,
            page_size: DEFAULT_PAGE_SIZE,
            default_operator: None,
            default_freetext_fuzzify: None,
            active_filters: BTreeMap::new(),
            predefined_filters: BTreeMap::new(),
            fixed_filters: Vec::new(),
            facets: Vec::new(),
            fields: None,
            partial_fields: None,
            extra_facets: BTreeMap::new(),
            facet_inflation: DEFAULT_FACET_INFLATION,
            searching: false,
        }
    }
}

impl SearchState {
    pub fn with_facets(facets: Vec<FacetDefinition>) -> Self {
        Self { facets, ..Default::default() }
    }

    pub fn register_facets(&mut self, defaults: &FacetDefaults) {
        let facets = std::mem::take(&mut self.facets);
        self.facets = facet_registry::register(facets, defaults);
    }

    pub fn facet(&self, field: &str) -> Result<&FacetDefinition> {
        facet_registry::lookup(&self.facets, field)
    }

    fn facet_mut(&mut self, field: &str) -> Result<&mut FacetDefinition> {
        facet_registry::lookup_mut(&mut self.facets, field)
    }

    fn terms_facet(&self, field: &str) -> Result<()> {
        let facet_type = self.facet(field)?.facet_type();
        match facet_type {
            FacetType::Terms => Ok(()),
            FacetType::Statistical | FacetType::TermsStats => {
                Err(FacetviewError::UnsupportedFilter { field: field.to_string(), facet_type })
            }
            FacetType::Range | FacetType::GeoDistance | FacetType::DateHistogram => {
                Err(FacetviewError::FilterShapeMismatch { field: field.to_string(), facet_type })
            }
        }
    }

    // ---- filters ----

    pub fn select_term(&mut self, field: &str, value: TermValue) -> Result<()> {
        self.terms_facet(field)?;
        let entry = self.active_filters.entry(field.to_string()).or_insert(ActiveFilter::Terms(Vec::new()));
        match entry {
            ActiveFilter::Terms(values) => {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            ActiveFilter::Range(_) => *entry = ActiveFilter::Terms(vec![value]),
        }
        self.from = 0;
        Ok(())
    }

    pub fn deselect_term(&mut self, field: &str, value: &TermValue) -> Result<()> {
        self.terms_facet(field)?;
        if let Some(ActiveFilter::Terms(values)) = self.active_filters.get_mut(field) {
            values.retain(|v| v != value);
            if values.is_empty() {
                self.active_filters.remove(field);
            }
        }
        self.from = 0;
        Ok(())
    }

    /// Select `value` if it is not selected yet, otherwise deselect it.
    /// Returns whether the value is selected afterwards.
    pub fn toggle_term(&mut self, field: &str, value: TermValue) -> Result<bool> {
        let selected = match self.active_filters.get(field) {
            Some(ActiveFilter::Terms(values)) => values.contains(&value),
            _ => false,
        };
        if selected {
            self.deselect_term(field, &value)?;
        } else {
            self.select_term(field, value)?;
        }
        Ok(!selected)
    }

    pub fn set_range(&mut self, field: &str, range: RangeValue) -> Result<()> {
        let facet_type = self.facet(field)?.facet_type();
        if !facet_type.is_range_like() {
            return Err(FacetviewError::FilterShapeMismatch { field: field.to_string(), facet_type });
        }
        self.active_filters.insert(field.to_string(), ActiveFilter::Range(range));
        self.from = 0;
        Ok(())
    }

    /// Returns whether a filter was removed.
    pub fn clear_filter(&mut self, field: &str) -> bool {
        let removed = self.active_filters.remove(field).is_some();
        if removed {
            self.from = 0;
        }
        removed
    }

    pub fn clear_all_filters(&mut self) {
        self.active_filters.clear();
        self.from = 0;
    }

    pub fn is_selected(&self, field: &str, value: &TermValue) -> bool {
        match self.active_filters.get(field) {
            Some(ActiveFilter::Terms(values)) => values.contains(value),
            _ => false,
        }
    }

    // ---- free text ----

    pub fn set_query_text(&mut self, q: impl Into<String>) {
        self.q = q.into();
        self.from = 0;
    }

    pub fn set_search_field(&mut self, field: impl Into<String>) {
        self.searchfield = field.into();
        self.from = 0;
    }

    // ---- sorting ----

    pub fn set_sort(&mut self, sort: Vec<SortField>) {
        self.sort = sort;
        self.from = 0;
    }

    /// Sort on one field, or on relevance when `field` is `None`.
    pub fn set_sort_field(&mut self, field: Option<&str>, order: SortOrder) {
        let field = field.filter(|f| !f.is_empty()).unwrap_or(SCORE_FIELD);
        self.set_sort(vec![SortField::new(field, order)]);
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort.first().map(|s| s.order).unwrap_or_default()
    }

    pub fn toggle_sort_order(&mut self) -> SortOrder {
        let order = self.sort_order().toggled();
        if self.sort.is_empty() {
            self.sort.push(SortField::new(SCORE_FIELD, order));
        }
        for entry in self.sort.iter_mut() {
            entry.order = order;
        }
        self.from = 0;
        order
    }

    // ---- paging ----

    pub fn set_page_size(&mut self, page_size: u64) {
        self.page_size = page_size;
        self.from = 0;
    }

    pub fn set_from(&mut self, from: u64) {
        self.from = from;
    }

    /// Advance one page if `found` has records past the current one.
    pub fn next_page(&mut self, found: u64) -> bool {
        let next = self.from.saturating_add(self.page_size);
        if self.page_size == 0 || next >= found {
            return false;
        }
        self.from = next;
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if self.from == 0 {
            return false;
        }
        self.from = self.from.saturating_sub(self.page_size);
        true
    }

    pub fn page_window(&self, found: u64) -> PageWindow {
        let to = self.from.saturating_add(self.page_size).min(found);
        PageWindow {
            from: self.from.saturating_add(1).min(found.max(1)),
            to,
            total: found,
            has_prev: self.from > 0,
            has_next: found > to,
        }
    }

    // ---- facet settings ----

    pub fn cycle_facet_order(&mut self, field: &str) -> Result<FacetOrder> {
        let facet = self.facet_mut(field)?;
        let order = facet.order().next();
        facet.order = Some(order);
        Ok(order)
    }

    pub fn toggle_facet_logic(&mut self, field: &str) -> Result<FacetLogic> {
        let facet = self.facet_mut(field)?;
        let logic = facet.logic().toggled();
        facet.logic = Some(logic);
        Ok(logic)
    }

    pub fn set_facet_size(&mut self, field: &str, size: usize) -> Result<()> {
        self.facet_mut(field)?.size = Some(size);
        Ok(())
    }

    pub fn toggle_facet_open(&mut self, field: &str) -> Result<bool> {
        let facet = self.facet_mut(field)?;
        let open = !facet.is_open();
        facet.open = Some(open);
        Ok(open)
    }

    /// Merge options read back from a query document. Filters naming a facet
    /// this state does not know, or not fitting their facet's type, are
    /// rejected and leave the state untouched. The page size is capped at
    /// [`MAX_PAGE_SIZE`].
    pub fn apply_parsed(&mut self, parsed: ParsedQuery) -> Result<()> {
        for (field, filter) in &parsed.active_filters {
            query_builder::filter_clauses(self.facet(field)?, filter)?;
        }
        for field in parsed.selected_operators.keys() {
            self.facet(field)?;
        }

        if let Some(from) = parsed.from {
            self.from = from;
        }
        if let Some(page_size) = parsed.page_size {
            self.page_size = page_size.min(MAX_PAGE_SIZE);
        }
        if let Some(sort) = parsed.sort {
            self.sort = sort;
        }
        if let Some(q) = parsed.q {
            self.q = q;
        }
        if let Some(searchfield) = parsed.searchfield {
            self.searchfield = searchfield;
        }
        if parsed.default_operator.is_some() {
            self.default_operator = parsed.default_operator;
        }
        if !parsed.active_filters.is_empty() {
            self.active_filters = parsed.active_filters;
        }
        for (field, logic) in parsed.selected_operators {
            self.facet_mut(&field)?.logic = Some(logic);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facet::RangeBucket;
    use pretty_assertions::assert_eq;

    fn state() -> SearchState {
        SearchState::with_facets(vec![
            FacetDefinition::terms("category"),
            FacetDefinition::range("price", vec![RangeBucket::new(None, Some(10.into()), "cheap")]),
            FacetDefinition::new("price_stats", FacetType::Statistical),
        ])
    }

    #[test]
    fn select_and_deselect_terms() {
        let mut state = state();
        state.from = 30;
        state.select_term("category", "books".into()).unwrap();
        state.select_term("category", "music".into()).unwrap();
        state.select_term("category", "books".into()).unwrap();
        assert_eq!(state.active_filters["category"], ActiveFilter::terms(["books", "music"]));
        assert_eq!(state.from, 0);

        state.deselect_term("category", &"books".into()).unwrap();
        state.deselect_term("category", &"music".into()).unwrap();
        assert!(state.active_filters.is_empty());
    }

    #[test]
    fn toggle_term_reports_selection() {
        let mut state = state();
        assert!(state.toggle_term("category", "books".into()).unwrap());
        assert!(state.is_selected("category", &"books".into()));
        assert!(!state.toggle_term("category", "books".into()).unwrap());
        assert!(!state.is_selected("category", &"books".into()));
    }

    #[test]
    fn filters_must_fit_their_facet() {
        let mut state = state();
        assert!(matches!(
            state.select_term("price", "cheap".into()),
            Err(FacetviewError::FilterShapeMismatch { .. })
        ));
        assert!(matches!(
            state.set_range("category", RangeValue::between(1, 2)),
            Err(FacetviewError::FilterShapeMismatch { .. })
        ));
        assert!(matches!(
            state.select_term("price_stats", 1.into()),
            Err(FacetviewError::UnsupportedFilter { .. })
        ));
        assert!(matches!(
            state.select_term("publisher", "x".into()),
            Err(FacetviewError::UndefinedFacet { .. })
        ));
    }

    #[test]
    fn range_filter_replaces_previous_range() {
        let mut state = state();
        state.set_range("price", RangeValue::between(0, 10)).unwrap();
        state.set_range("price", RangeValue::new(Some(10.into()), None)).unwrap();
        assert_eq!(state.active_filters["price"], ActiveFilter::Range(RangeValue::new(Some(10.into()), None)));
    }

    #[test]
    fn paging_stays_inside_the_result_set() {
        let mut state = state();
        state.set_page_size(10);
        assert!(state.next_page(25));
        assert!(state.next_page(25));
        assert!(!state.next_page(25));
        assert_eq!(state.from, 20);
        assert_eq!(
            state.page_window(25),
            PageWindow { from: 21, to: 25, total: 25, has_prev: true, has_next: false }
        );
        assert!(state.prev_page());
        assert!(state.prev_page());
        assert!(!state.prev_page());
        assert_eq!(state.from, 0);
    }

    #[test]
    fn empty_result_window() {
        let state = state();
        assert_eq!(
            state.page_window(0),
            PageWindow { from: 1, to: 0, total: 0, has_prev: false, has_next: false }
        );
    }

    #[test]
    fn paging_near_the_top_of_the_range() {
        let mut state = state();
        state.from = u64::MAX - 3;
        state.page_size = u64::MAX;
        assert!(!state.next_page(u64::MAX));
        assert_eq!(
            state.page_window(100),
            PageWindow { from: 100, to: 100, total: 100, has_prev: true, has_next: false }
        );
        assert!(state.prev_page());
        assert_eq!(state.from, 0);
    }

    #[test]
    fn parsed_page_size_is_capped() {
        let mut state = state();
        let parsed = ParsedQuery { from: Some(5), page_size: Some(u64::MAX), ..Default::default() };
        state.apply_parsed(parsed).unwrap();
        assert_eq!(state.page_size, MAX_PAGE_SIZE);
        assert_eq!(state.from, 5);
    }

    #[test]
    fn parsed_filters_must_fit_their_facet() {
        let before = state();
        for (field, filter) in [
            ("price", ActiveFilter::terms(["x"])),
            ("category", ActiveFilter::Range(RangeValue::between(1, 2))),
            ("price_stats", ActiveFilter::Range(RangeValue::between(1, 2))),
        ] {
            let mut state = before.clone();
            let parsed = ParsedQuery {
                q: Some("changed".to_string()),
                active_filters: BTreeMap::from([(field.to_string(), filter)]),
                ..Default::default()
            };
            assert!(state.apply_parsed(parsed).is_err(), "{field}");
            assert_eq!(state, before, "{field}");
        }
    }

    #[test]
    fn sort_toggle_defaults_to_relevance() {
        let mut state = state();
        assert_eq!(state.toggle_sort_order(), SortOrder::Asc);
        assert_eq!(state.sort, vec![SortField::new("_score", SortOrder::Asc)]);

        state.set_sort_field(Some("title"), SortOrder::Desc);
        assert_eq!(serde_json::to_value(&state.sort).unwrap(), serde_json::json!([{"title": {"order": "desc"}}]));
    }

    #[test]
    fn facet_settings_cycle() {
        let mut state = state();
        assert_eq!(state.toggle_facet_logic("category").unwrap(), FacetLogic::Or);
        assert_eq!(state.cycle_facet_order("category").unwrap(), FacetOrder::ReverseCount);
        assert!(state.toggle_facet_open("category").unwrap());
        state.set_facet_size("category", 3).unwrap();
        assert_eq!(state.facet("category").unwrap().size(), 3);
        assert!(state.toggle_facet_logic("nope").is_err());
    }

    #[test]
    fn sort_entry_must_name_one_field() {
        let parsed: std::result::Result<SortField, _> = serde_json::from_value(serde_json::json!({
            "a": {"order": "asc"},
            "b": {"order": "desc"}
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn state_defaults_and_aliases() {
        let state: SearchState = serde_json::from_value(serde_json::json!({
            "q": "rust",
            "elasticsearch_facet_inflation": 50,
            "active_filters": {"category": ["books"], "price": {"from": 5}}
        }))
        .unwrap();
        assert_eq!(state.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(state.facet_inflation, 50);
        assert_eq!(state.active_filters["category"], ActiveFilter::terms(["books"]));
        assert_eq!(state.active_filters["price"], ActiveFilter::Range(RangeValue::new(Some(5.into()), None)));
    }
}
