//! Facet values flattened into chartable `{label, value}` series.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::facet::FacetDefinition;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: Value,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSeries {
    pub key: String,
    pub values: Vec<DataPoint>,
}

/// One series per facet, labelled by the facet display name. Each point reads
/// its label and value from the bucket fields the facet names
/// (`term`/`count` unless configured otherwise); missing fields become null.
pub fn facet_data_series(facets: &[FacetDefinition]) -> Vec<DataSeries> {
    facets
        .iter()
        .map(|facet| {
            let values = facet
                .values
                .as_ref()
                .map(|result| result.entries())
                .unwrap_or_default()
                .into_iter()
                .map(|entry| DataPoint {
                    label: entry.get(facet.label_field()).cloned().unwrap_or(Value::Null),
                    value: entry.get(facet.count_field()).cloned().unwrap_or(Value::Null),
                })
                .collect();
            DataSeries { key: facet.display_name().to_string(), values }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search_result::{FacetResult, TermCount, TermsStatsEntry};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn terms_facet_series() {
        let mut facet = FacetDefinition::terms("category").with_display("Category");
        facet.values = Some(FacetResult::Terms(vec![
            TermCount { term: "books".into(), count: 3 },
            TermCount { term: "music".into(), count: 1 },
        ]));

        let series = facet_data_series(&[facet]);
        assert_eq!(
            serde_json::to_value(&series).unwrap(),
            json!([{"key": "Category", "values": [
                {"label": "books", "value": 3},
                {"label": "music", "value": 1}
            ]}])
        );
    }

    #[test]
    fn configured_value_field() {
        let mut facet = FacetDefinition::new("author", crate::facet::FacetType::TermsStats);
        facet.facet_value_field = Some("total".to_string());
        facet.values = Some(FacetResult::TermsStats(vec![TermsStatsEntry {
            term: "ann".into(),
            count: 2,
            total_count: None,
            min: None,
            max: None,
            total: Some(9.5),
            mean: None,
        }]));

        let series = facet_data_series(&[facet, FacetDefinition::terms("empty")]);
        assert_eq!(series[0].key, "author");
        assert_eq!(series[0].values, vec![DataPoint { label: json!("ann"), value: json!(9.5) }]);
        assert!(series[1].values.is_empty());
    }
}
