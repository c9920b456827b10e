//! Application state for Axum handlers.

use planner_core::Engine;
use planner_core::store::{IdentityProvider, Readiness};
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Authorization and RSVP engine
    pub engine: Arc<Engine>,
    /// Resolves request credentials to identities
    pub identity: Arc<dyn IdentityProvider>,
    /// Backs the readiness probe
    pub readiness: Arc<dyn Readiness>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        engine: Arc<Engine>,
        identity: Arc<dyn IdentityProvider>,
        readiness: Arc<dyn Readiness>,
    ) -> Self {
        Self {
            engine,
            identity,
            readiness,
        }
    }

    /// Deadline for calls the web layer makes outside the engine.
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        self.engine.config().store_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
