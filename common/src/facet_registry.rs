//! Facet lookup by field name and one-time application of facet defaults.

use serde::{Deserialize, Serialize};

use crate::error::{FacetviewError, Result};
use crate::facet::{FacetDefinition, FacetLogic, FacetOrder, FacetType};

pub const DEFAULT_FACET_SIZE: usize = 10;
pub const DEFAULT_DISTANCE_UNIT: &str = "km";
// Greenwich meridian, give or take a few decimal places
pub const DEFAULT_DISTANCE_LAT: f64 = 51.4768;
pub const DEFAULT_DISTANCE_LON: f64 = 0.0;
pub const DEFAULT_FACET_LABEL_FIELD: &str = "term";
pub const DEFAULT_FACET_VALUE_FIELD: &str = "count";

/// Values copied into every facet that leaves the matching property unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetDefaults {
    pub default_facet_type: FacetType,
    pub default_facet_size: usize,
    pub default_facet_operator: FacetLogic,
    pub default_facet_order: FacetOrder,
    pub default_facet_open: bool,
    pub default_facet_hidden: bool,
    pub default_facet_disabled: bool,
    pub default_distance_unit: String,
    pub default_distance_lat: f64,
    pub default_distance_lon: f64,
    pub default_facet_label_field: String,
    pub default_facet_value_field: String,
    pub default_hide_empty_range: bool,
    pub default_hide_empty_distance: bool,
    pub default_hide_empty_date_bin: bool,
    pub default_ignore_empty_string: bool,
    pub default_deactivate_threshold: Option<usize>,
}

impl Default for FacetDefaults {
    fn default() -> Self {
        Self {
            default_facet_type: FacetType::Terms,
            default_facet_size: DEFAULT_FACET_SIZE,
            default_facet_operator: FacetLogic::And,
            default_facet_order: FacetOrder::Count,
            default_facet_open: false,
            default_facet_hidden: false,
            default_facet_disabled: false,
            default_distance_unit: DEFAULT_DISTANCE_UNIT.to_string(),
            default_distance_lat: DEFAULT_DISTANCE_LAT,
            default_distance_lon: DEFAULT_DISTANCE_LON,
            default_facet_label_field: DEFAULT_FACET_LABEL_FIELD.to_string(),
            default_facet_value_field: DEFAULT_FACET_VALUE_FIELD.to_string(),
            default_hide_empty_range: false,
            default_hide_empty_distance: false,
            default_hide_empty_date_bin: false,
            default_ignore_empty_string: false,
            default_deactivate_threshold: None,
        }
    }
}

/// Fill every unset facet property from `defaults`. Explicit values are kept,
/// so registering twice with the same defaults changes nothing.
pub fn register(mut facets: Vec<FacetDefinition>, defaults: &FacetDefaults) -> Vec<FacetDefinition> {
    for facet in facets.iter_mut() {
        facet.facet_type.get_or_insert(defaults.default_facet_type);
        facet.size.get_or_insert(defaults.default_facet_size);
        facet.logic.get_or_insert(defaults.default_facet_operator);
        facet.order.get_or_insert(defaults.default_facet_order);
        facet.open.get_or_insert(defaults.default_facet_open);
        facet.hidden.get_or_insert(defaults.default_facet_hidden);
        facet.disabled.get_or_insert(defaults.default_facet_disabled);
        facet.unit.get_or_insert_with(|| defaults.default_distance_unit.clone());
        facet.lat.get_or_insert(defaults.default_distance_lat);
        facet.lon.get_or_insert(defaults.default_distance_lon);
        facet.facet_label_field.get_or_insert_with(|| defaults.default_facet_label_field.clone());
        facet.facet_value_field.get_or_insert_with(|| defaults.default_facet_value_field.clone());
        facet.hide_empty_range.get_or_insert(defaults.default_hide_empty_range);
        facet.hide_empty_distance.get_or_insert(defaults.default_hide_empty_distance);
        facet.hide_empty_date_bin.get_or_insert(defaults.default_hide_empty_date_bin);
        facet.ignore_empty_string.get_or_insert(defaults.default_ignore_empty_string);
        if facet.deactivate_threshold.is_none() {
            facet.deactivate_threshold = defaults.default_deactivate_threshold;
        }
    }
    facets
}

/// First facet whose `field` equals `field`.
pub fn lookup<'a>(facets: &'a [FacetDefinition], field: &str) -> Result<&'a FacetDefinition> {
    facets
        .iter()
        .find(|facet| facet.field == field)
        .ok_or_else(|| FacetviewError::UndefinedFacet { field: field.to_string() })
}

pub fn lookup_mut<'a>(facets: &'a mut [FacetDefinition], field: &str) -> Result<&'a mut FacetDefinition> {
    facets
        .iter_mut()
        .find(|facet| facet.field == field)
        .ok_or_else(|| FacetviewError::UndefinedFacet { field: field.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn facets() -> Vec<FacetDefinition> {
        vec![
            FacetDefinition { field: "category".to_string(), ..Default::default() },
            FacetDefinition::terms("author").with_size(25).with_logic(FacetLogic::Or),
        ]
    }

    #[test]
    fn register_fills_only_unset_properties() {
        let defaults = FacetDefaults { default_facet_size: 5, ..Default::default() };
        let facets = register(facets(), &defaults);

        assert_eq!(facets[0].facet_type, Some(FacetType::Terms));
        assert_eq!(facets[0].size, Some(5));
        assert_eq!(facets[0].logic, Some(FacetLogic::And));
        assert_eq!(facets[0].unit.as_deref(), Some("km"));
        assert_eq!(facets[1].size, Some(25));
        assert_eq!(facets[1].logic, Some(FacetLogic::Or));
    }

    #[test]
    fn register_is_idempotent() {
        let defaults = FacetDefaults::default();
        let once = register(facets(), &defaults);
        let twice = register(once.clone(), &defaults);
        assert_eq!(once, twice);
    }

    #[test]
    fn lookup_takes_the_first_match() {
        let mut facets = facets();
        facets.push(FacetDefinition::terms("category").with_size(99));
        assert_eq!(lookup(&facets, "category").unwrap().size, None);
    }

    #[test]
    fn lookup_of_unknown_field_is_a_configuration_error() {
        let err = lookup(&facets(), "publisher").unwrap_err();
        assert!(matches!(err, FacetviewError::UndefinedFacet { ref field } if field == "publisher"));
        assert_eq!(err.to_string(), "filter references undefined facet: publisher");
    }
}
