//! Router configuration.

use crate::handlers::{dashboard, events, health_check, readiness_check};
use crate::middleware::{cors_layer, request_layers};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Build the complete Axum router.
///
/// Health probes sit next to the event and dashboard routes; every route
/// goes through request id tracking, tracing and CORS for
/// `allowed_origins`.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Events
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/rsvp", post(events::rsvp).get(events::my_rsvp))
        .route("/events/:id/rsvps", get(events::list_attendees))
        // Dashboard
        .route("/dashboard/events", get(dashboard::my_events))
        .route("/dashboard/rsvps", get(dashboard::my_rsvps))
        .layer(request_layers())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}
