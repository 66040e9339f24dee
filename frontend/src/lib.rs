//! Facet view widget: controller, lifecycle hooks, renderers and options.

pub mod controller;
pub mod data_definitions;
pub mod lifecycle;
pub mod options;
pub mod render;

pub use controller::{FacetView, SearchOutcome};
