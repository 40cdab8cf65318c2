//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the three store seams and the parsed config. A single backend
//! instance implements every store trait and is shared behind each of them.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::{BoardStore, SessionStore, UserStore};

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub boards: Arc<dyn BoardStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new<S>(store: Arc<S>, config: AppConfig) -> Self
    where
        S: UserStore + BoardStore + SessionStore + 'static,
    {
        Self {
            users: store.clone(),
            boards: store.clone(),
            sessions: store,
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;
