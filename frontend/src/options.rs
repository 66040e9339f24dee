//! Widget options: facet defaults, the initial search and display settings,
//! read from one flat JSON object.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use backend::SearchEndpointConfig;
use common::facet_registry::FacetDefaults;
use common::search_state::SearchState;
use serde::{Deserialize, Serialize};
use url::Url;

/// One field of a result line: `pre` + value + `post`. Without `post`, a
/// space follows the value unless `notrailingspace` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DisplayItem {
    pub field: String,
    pub pre: Option<String>,
    pub post: Option<String>,
    pub notrailingspace: bool,
}

impl DisplayItem {
    pub fn field(field: impl Into<String>) -> Self {
        Self { field: field.into(), ..Default::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Result lines, each a list of fields.
    pub result_display: Vec<Vec<DisplayItem>>,
    pub show_filter_field: bool,
    pub show_filter_logic: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self { result_display: Vec::new(), show_filter_field: true, show_filter_logic: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetOptions {
    pub search_url: Option<String>,
    pub search_timeout_ms: Option<u64>,
    /// Base of shareable links; the search url when unset.
    pub share_base_url: Option<String>,
    pub initialsearch: bool,

    #[serde(flatten)]
    pub facet_defaults: FacetDefaults,
    #[serde(flatten)]
    pub display: DisplayOptions,
    #[serde(flatten)]
    pub state: SearchState,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            search_url: None,
            search_timeout_ms: None,
            share_base_url: None,
            initialsearch: true,
            facet_defaults: FacetDefaults::default(),
            display: DisplayOptions::default(),
            state: SearchState::default(),
        }
    }
}

impl WidgetOptions {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid widget options")
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }

    /// Starting state with every facet default applied.
    pub fn initial_state(&self) -> SearchState {
        let mut state = self.state.clone();
        state.register_facets(&self.facet_defaults);
        state.searching = false;
        state
    }

    /// Endpoint from the environment, overridden by the options that are set.
    pub fn endpoint(&self) -> anyhow::Result<SearchEndpointConfig> {
        let mut config = SearchEndpointConfig::from_env()?;
        if let Some(search_url) = &self.search_url {
            config.search_url = Url::parse(search_url).with_context(|| format!("invalid search_url: {search_url}"))?;
        }
        if let Some(ms) = self.search_timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        Ok(config)
    }

    pub fn share_base(&self, endpoint: &SearchEndpointConfig) -> anyhow::Result<Url> {
        match &self.share_base_url {
            Some(base) => Url::parse(base).with_context(|| format!("invalid share_base_url: {base}")),
            None => Ok(endpoint.search_url.clone()),
        }
    }
}
