//! Lifecycle events the widget raises around initialisation, searching and
//! rendering. Any number of subscribers may listen; every event has a no-op
//! default so subscribers implement only what they need.

use backend::SearchError;
use common::search_result::ResultSet;
use common::search_state::SearchState;

pub trait SearchLifecycle: Send + Sync {
    fn post_init(&self, _state: &SearchState) {}
    fn pre_search(&self, _state: &SearchState) {}
    fn post_search(&self, _state: &SearchState, _outcome: Result<&ResultSet, &SearchError>) {}
    fn pre_render(&self, _state: &SearchState) {}
    fn post_render(&self, _state: &SearchState, _rendered: &str) {}
}

#[derive(Default)]
pub struct LifecycleHooks {
    subscribers: Vec<Box<dyn SearchLifecycle>>,
}

impl std::fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleHooks").field("subscribers", &self.subscribers.len()).finish()
    }
}

impl LifecycleHooks {
    pub fn subscribe(&mut self, subscriber: impl SearchLifecycle + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn post_init(&self, state: &SearchState) {
        self.subscribers.iter().for_each(|s| s.post_init(state));
    }

    pub fn pre_search(&self, state: &SearchState) {
        self.subscribers.iter().for_each(|s| s.pre_search(state));
    }

    pub fn post_search(&self, state: &SearchState, outcome: Result<&ResultSet, &SearchError>) {
        self.subscribers.iter().for_each(|s| s.post_search(state, outcome));
    }

    pub fn pre_render(&self, state: &SearchState) {
        self.subscribers.iter().for_each(|s| s.pre_render(state));
    }

    pub fn post_render(&self, state: &SearchState, rendered: &str) {
        self.subscribers.iter().for_each(|s| s.post_render(state, rendered));
    }
}

/// Logs searches and their outcome, standing in for the "searching..." notice.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLifecycle;

impl SearchLifecycle for TracingLifecycle {
    fn pre_search(&self, state: &SearchState) {
        tracing::info!("SEARCHING... q={:?} from={}", state.q, state.from);
    }

    fn post_search(&self, _state: &SearchState, outcome: Result<&ResultSet, &SearchError>) {
        match outcome {
            Ok(results) => tracing::info!("search done: {} found", results.found),
            Err(e) => tracing::error!("search failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl SearchLifecycle for Recorder {
        fn post_init(&self, _state: &SearchState) {
            self.0.lock().unwrap().push("post_init".to_string());
        }

        fn post_render(&self, _state: &SearchState, rendered: &str) {
            self.0.lock().unwrap().push(format!("post_render {rendered}"));
        }
    }

    #[test]
    fn every_subscriber_hears_every_event() {
        let first = Recorder::default();
        let second = Recorder::default();
        let mut hooks = LifecycleHooks::default();
        hooks.subscribe(first.clone());
        hooks.subscribe(second.clone());
        hooks.subscribe(TracingLifecycle);

        let state = SearchState::default();
        hooks.post_init(&state);
        hooks.pre_search(&state);
        hooks.post_render(&state, "view");

        for recorder in [first, second] {
            assert_eq!(*recorder.0.lock().unwrap(), vec!["post_init".to_string(), "post_render view".to_string()]);
        }
        assert_eq!(hooks.len(), 3);
    }
}
