//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by resource.

pub mod dashboard;
pub mod events;
pub mod health;

// Re-export common handler utilities
pub use health::{health_check, readiness_check};
