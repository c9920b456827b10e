//! Axum HTTP surface for the event planner.
//!
//! Handlers are thin: they resolve the caller's identity, decode the
//! request and hand over to [`planner_core::Engine`], which owns every
//! authorization decision.
//!
//! # Request Flow
//!
//! 1. **Request id** assigned or propagated (`x-request-id`)
//! 2. **Identity** resolved from the bearer token or `session_token` cookie
//! 3. **Engine** operation runs with that identity
//! 4. **Result** mapped to JSON: payload or `{code, message}` for reads,
//!    `{success, error?, ...}` for mutations
//!
//! # Example
//!
//! ```ignore
//! use planner_web::{AppState, build_router};
//!
//! let state = AppState::new(engine, identity_provider, readiness);
//! let app = build_router(state, &[]);
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod outcome;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{CurrentIdentity, FormBody, InvalidBody, SESSION_COOKIE};
pub use middleware::REQUEST_ID_HEADER;
pub use outcome::Outcome;
pub use router::build_router;
pub use state::AppState;
