//! The widget controller: owns the search state, runs searches one at a
//! time and keeps the last good results and view.

use std::ops::Deref;

use backend::api::search::search_for_results;
use backend::{SearchClient, SearchError};
use common::query_builder::{BuildOptions, build_query};
use common::search_result::{ResultSet, apply_facet_values};
use common::search_state::SearchState;
use common::share_url::{shareable_url, state_from_url};
use url::Url;

use crate::data_definitions::state_token::{SearchStateToken, StateTokenError};
use crate::lifecycle::{LifecycleHooks, SearchLifecycle};
use crate::options::WidgetOptions;
use crate::render::{TextRenderer, ViewRenderer, render_view};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Completed { found: u64 },
    /// Another search was still running; nothing was sent.
    Skipped,
}

/// Holds `searching` set for as long as it lives, so a search future that
/// is dropped before completion still clears the flag.
struct InFlight<'a>(&'a mut SearchState);

impl<'a> InFlight<'a> {
    fn start(state: &'a mut SearchState) -> Self {
        state.searching = true;
        Self(state)
    }
}

impl Deref for InFlight<'_> {
    type Target = SearchState;

    fn deref(&self) -> &SearchState {
        self.0
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.searching = false;
    }
}

pub struct FacetView {
    state: SearchState,
    options: WidgetOptions,
    client: SearchClient,
    hooks: LifecycleHooks,
    renderer: Box<dyn ViewRenderer>,
    results: Option<ResultSet>,
    rendered: String,
}

impl std::fmt::Debug for FacetView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacetView")
            .field("state", &self.state)
            .field("client", &self.client)
            .field("hooks", &self.hooks)
            .field("found", &self.results.as_ref().map(|r| r.found))
            .finish()
    }
}

impl FacetView {
    pub fn new(options: WidgetOptions, client: SearchClient) -> Self {
        let state = options.initial_state();
        Self {
            state,
            options,
            client,
            hooks: LifecycleHooks::default(),
            renderer: Box::new(TextRenderer),
            results: None,
            rendered: String::new(),
        }
    }

    pub fn with_renderer(mut self, renderer: impl ViewRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn subscribe(&mut self, subscriber: impl SearchLifecycle + 'static) {
        self.hooks.subscribe(subscriber);
    }

    /// Apply a shared link over the initial state, then announce the widget
    /// and run the initial search when the options ask for one.
    pub async fn init(&mut self, shared: Option<&Url>) -> Result<Option<SearchOutcome>, SearchError> {
        if let Some(url) = shared {
            self.state = state_from_url(url, &self.state);
        }
        self.hooks.post_init(&self.state);
        if self.options.initialsearch {
            return self.do_search().await.map(Some);
        }
        Ok(None)
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn results(&self) -> Option<&ResultSet> {
        self.results.as_ref()
    }

    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    pub fn is_searching(&self) -> bool {
        self.state.searching
    }

    /// Run one search for the current state. While a search is in flight
    /// this returns [`SearchOutcome::Skipped`] without sending anything.
    /// On failure the previous results and view are left as they were.
    pub async fn do_search(&mut self) -> Result<SearchOutcome, SearchError> {
        if self.state.searching {
            tracing::warn!("search already in flight, skipping");
            return Ok(SearchOutcome::Skipped);
        }

        let in_flight = InFlight::start(&mut self.state);
        self.hooks.pre_search(&in_flight);
        let outcome = search_for_results(&self.client, &in_flight).await;
        drop(in_flight);

        match outcome {
            Ok(results) => {
                apply_facet_values(&mut self.state.facets, &results);
                self.hooks.post_search(&self.state, Ok(&results));
                let found = results.found;
                self.results = Some(results);
                self.render();
                Ok(SearchOutcome::Completed { found })
            }
            Err(e) => {
                self.hooks.post_search(&self.state, Err(&e));
                Err(e)
            }
        }
    }

    /// Change the state through `action`, then search again. A rejected
    /// action leaves the state as `action` left it and sends nothing.
    pub async fn update<F>(&mut self, action: F) -> Result<SearchOutcome, SearchError>
    where
        F: FnOnce(&mut SearchState) -> common::Result<()>,
    {
        action(&mut self.state)?;
        self.do_search().await
    }

    pub async fn next_page(&mut self) -> Result<Option<SearchOutcome>, SearchError> {
        let found = self.results.as_ref().map(|r| r.found).unwrap_or(0);
        if !self.state.next_page(found) {
            return Ok(None);
        }
        self.do_search().await.map(Some)
    }

    pub async fn prev_page(&mut self) -> Result<Option<SearchOutcome>, SearchError> {
        if !self.state.prev_page() {
            return Ok(None);
        }
        self.do_search().await.map(Some)
    }

    /// Open or close a facet. Only the view changes, no search is made.
    pub fn toggle_facet_open(&mut self, field: &str) -> common::Result<bool> {
        let open = self.state.toggle_facet_open(field)?;
        self.render();
        Ok(open)
    }

    /// Redraw from the last good results.
    pub fn render(&mut self) -> &str {
        let Some(results) = &self.results else {
            return &self.rendered;
        };
        self.hooks.pre_render(&self.state);
        self.rendered = render_view(self.renderer.as_ref(), &self.options.display, &self.state, results);
        self.hooks.post_render(&self.state, &self.rendered);
        &self.rendered
    }

    /// Link that reproduces the current search.
    pub fn shareable_url(&self, base: &Url) -> common::Result<Url> {
        let doc = build_query(&self.state, BuildOptions::default())?;
        shareable_url(base, &doc)
    }

    pub fn state_token(&self) -> Result<String, StateTokenError> {
        SearchStateToken::from(self.state.clone()).encode()
    }

    /// Replace the state with one read from a token. Facet values of the
    /// token are not carried, so the view stays as it is until the next search.
    pub fn restore_token(&mut self, token: &str) -> Result<(), StateTokenError> {
        let restored: SearchStateToken = token.parse()?;
        self.state = restored.into_inner();
        Ok(())
    }

    /// Direct access to the state, outside the search cycle.
    pub fn state_mut(&mut self) -> &mut SearchState {
        &mut self.state
    }
}
