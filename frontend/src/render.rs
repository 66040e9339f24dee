//! Renderer contract and the plain-text renderer used by default.
//!
//! Each trait method has a text implementation, so a custom renderer only
//! overrides the parts it wants to draw differently.

use common::facet::{FacetDefinition, FacetType, RangeValue, TermValue};
use common::search_result::{FacetResult, ResultSet};
use common::search_state::{ActiveFilter, PageWindow, SearchState};
use serde_json::{Map, Value};

use crate::options::{DisplayItem, DisplayOptions};

pub trait ResultRenderer {
    fn render_record(&self, display: &DisplayOptions, record: &Map<String, Value>) -> String {
        record_lines(&display.result_display, record)
    }

    fn render_not_found(&self) -> String {
        "No results found".to_string()
    }
}

pub trait FacetRenderer {
    fn render_facet(&self, facet: &FacetDefinition, filter: Option<&ActiveFilter>) -> String {
        facet_text(facet, filter)
    }
}

pub trait PagerRenderer {
    fn render_pager(&self, window: &PageWindow) -> String {
        let back = if window.has_prev { "« back" } else { ".." };
        let next = if window.has_next { "next »" } else { ".." };
        format!("{back} | {}-{} of {} | {next}", window.from, window.to, window.total)
    }
}

pub trait ActiveFilterRenderer {
    fn render_active_filter(&self, display: &DisplayOptions, facet: &FacetDefinition, filter: &ActiveFilter) -> String {
        let values = match filter {
            ActiveFilter::Terms(values) => {
                let separator = if display.show_filter_logic { format!(" {} ", facet.logic()) } else { ", ".to_string() };
                values.iter().map(TermValue::to_string).collect::<Vec<_>>().join(&separator)
            }
            ActiveFilter::Range(range) => range_label(facet, range),
        };
        if display.show_filter_field { format!("{}: {values}", facet.display_name()) } else { values }
    }
}

/// Everything a full view needs.
pub trait ViewRenderer: ResultRenderer + FacetRenderer + PagerRenderer + ActiveFilterRenderer + Send + Sync {}

impl<T> ViewRenderer for T where T: ResultRenderer + FacetRenderer + PagerRenderer + ActiveFilterRenderer + Send + Sync {}

#[derive(Debug, Default, Clone, Copy)]
pub struct TextRenderer;

impl ResultRenderer for TextRenderer {}
impl FacetRenderer for TextRenderer {}
impl PagerRenderer for TextRenderer {}
impl ActiveFilterRenderer for TextRenderer {}

/// Active filters, visible facets, pager and records, in that order.
pub fn render_view(
    renderer: &dyn ViewRenderer,
    display: &DisplayOptions,
    state: &SearchState,
    results: &ResultSet,
) -> String {
    let mut sections = Vec::new();

    let filters: Vec<String> = state
        .active_filters
        .iter()
        .filter_map(|(field, filter)| {
            let facet = state.facet(field).ok()?;
            Some(renderer.render_active_filter(display, facet, filter))
        })
        .collect();
    if !filters.is_empty() {
        sections.push(filters.join("\n"));
    }

    for facet in state.facets.iter().filter(|facet| !facet.is_hidden()) {
        sections.push(renderer.render_facet(facet, state.active_filters.get(&facet.field)));
    }

    if results.records.is_empty() {
        sections.push(renderer.render_not_found());
    } else {
        sections.push(renderer.render_pager(&state.page_window(results.found)));
        for record in &results.records {
            sections.push(renderer.render_record(display, record));
        }
    }

    sections.join("\n\n")
}

fn facet_text(facet: &FacetDefinition, filter: Option<&ActiveFilter>) -> String {
    let marker = if facet.is_open() { '-' } else { '+' };
    let mut out = match facet.facet_type() {
        FacetType::Terms | FacetType::TermsStats => format!(
            "{marker} {} [{}, {}, {}]",
            facet.display_name(),
            facet.logic(),
            facet.order().as_str(),
            facet.size()
        ),
        _ => format!("{marker} {}", facet.display_name()),
    };
    if facet.is_disabled() {
        out.push_str(" (inactive)");
    }

    let selected_range = match filter {
        Some(ActiveFilter::Range(range)) => Some(range),
        _ => None,
    };
    let check = |selected: bool| if selected { "[x]" } else { "[ ]" };

    let lines: Vec<String> = match &facet.values {
        None => Vec::new(),
        Some(FacetResult::Terms(terms)) => terms
            .iter()
            .map(|t| {
                let selected = matches!(filter, Some(ActiveFilter::Terms(values)) if values.contains(&t.term));
                format!("{} {} ({})", check(selected), t.term, t.count)
            })
            .collect(),
        Some(FacetResult::Ranges(ranges)) => ranges
            .iter()
            .map(|r| {
                let bounds = r.bounds();
                let selected = selected_range.is_some_and(|range| range_label(facet, range) == range_label(facet, &bounds));
                format!("{} {} ({})", check(selected), range_label(facet, &bounds), r.count)
            })
            .collect(),
        Some(FacetResult::Statistical(s)) => vec![format!(
            "count {} min {} max {} mean {}",
            s.count, s.min, s.max, s.mean
        )],
        Some(FacetResult::TermsStats(entries)) => entries
            .iter()
            .map(|e| match e.total {
                Some(total) => format!("{} ({}, total {total})", e.term, e.count),
                None => format!("{} ({})", e.term, e.count),
            })
            .collect(),
        Some(FacetResult::DateHistogram(entries)) => {
            entries.iter().map(|e| format!("{} ({})", e.time, e.count)).collect()
        }
    };

    for line in lines {
        out.push_str("\n  ");
        out.push_str(&line);
    }
    out
}

/// Display text of the configured bucket matching `range`, or the bounds themselves.
fn range_label(facet: &FacetDefinition, range: &RangeValue) -> String {
    if let Some(bucket) = facet.bucket_for(range) {
        return bucket.display.clone();
    }
    let unit = if facet.facet_type() == FacetType::GeoDistance { facet.unit() } else { "" };
    match (&range.from, &range.to) {
        (Some(from), Some(to)) => format!("{from}{unit} to {to}{unit}"),
        (Some(from), None) => format!("{from}{unit}+"),
        (None, Some(to)) => format!("< {to}{unit}"),
        (None, None) => "any".to_string(),
    }
}

fn record_lines(display: &[Vec<DisplayItem>], record: &Map<String, Value>) -> String {
    let mut lines = Vec::new();
    for items in display {
        let mut line = String::new();
        for item in items {
            let value = lookup_path(record, &item.field).map(value_text).unwrap_or_default();
            if value.is_empty() {
                continue;
            }
            if let Some(pre) = &item.pre {
                line.push_str(pre);
            }
            line.push_str(&value);
            match &item.post {
                Some(post) => line.push_str(post),
                None if !item.notrailingspace => line.push(' '),
                None => {}
            }
        }

        let line = line.strip_prefix(char::is_whitespace).unwrap_or(&line);
        let line = line.strip_suffix(char::is_whitespace).unwrap_or(line);
        let line = line.strip_suffix(',').unwrap_or(line);
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    lines.join("\n")
}

/// Walk a dotted path through nested objects.
fn lookup_path<'a>(record: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = record.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}
