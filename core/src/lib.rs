//! # Event Planner Core
//!
//! Domain types, authorization rules and the RSVP engine of the event
//! planner.
//!
//! ## Core Concepts
//!
//! - **Event**: a plannable happening, public or private, owned by its creator
//! - **RSVP**: one user's attendance intent for one event, unique per pair
//! - **Engine**: the only entry point for reads and writes; checks identity,
//!   applies the policy predicates, talks to the stores and invalidates
//!   cached reads after every committed write
//! - **Stores**: persistence behind dyn-compatible traits, injected at startup
//!
//! ## Example
//!
//! ```ignore
//! use planner_core::engine::{Engine, EngineConfig};
//!
//! let engine = Engine::new(events, rsvps, Arc::new(SystemClock), EngineConfig::default());
//!
//! let event = engine.create_event(Some(&alice), &form).await?;
//! engine.rsvp(Some(&bob), event.id, "GOING").await?;
//!
//! let detail = engine.get_event(Some(&bob), event.id).await?;
//! assert_eq!(detail.rsvp_count, 1);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

pub mod cache;
pub mod engine;
pub mod error;
pub mod form;
pub mod outcome;
pub mod policy;
pub mod store;
pub mod types;

pub use engine::{Engine, EngineConfig};
pub use error::{Operation, PlannerError, StoreError};
pub use form::{EventDraft, EventForm};

/// Environment module - Dependency injection traits
///
/// External dependencies the engine needs besides storage are abstracted
/// here so tests can substitute deterministic implementations.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed time for deterministic tests
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
