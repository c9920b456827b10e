//! # Event Planner Testing
//!
//! Testing utilities and helpers for the event planner.
//!
//! This crate provides:
//! - [`InMemoryStore`]: every persistence trait over shared in-memory state
//! - [`FixedClock`]: deterministic time
//! - Fixtures: identities, valid forms and ready-to-use engines
//! - Property-based testing strategies
//!
//! ## Example
//!
//! ```ignore
//! use planner_testing::fixtures::{alice, bob, event_form, test_engine};
//!
//! #[tokio::test]
//! async fn test_rsvp_flow() {
//!     let (engine, store) = test_engine();
//!     let event = engine.create_event(Some(&alice()), &event_form("Meetup")).await.unwrap();
//!     engine.rsvp(Some(&bob()), event.id, "GOING").await.unwrap();
//!     assert_eq!(store.rsvp_rows(event.id).len(), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use planner_core::environment::Clock;

pub mod fixtures;
pub mod in_memory;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use planner_testing::mocks::FixedClock;
    /// use planner_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Property-based testing utilities
pub mod properties {
    use chrono::{DateTime, Duration, Utc};
    use planner_core::types::RsvpStatus;
    use proptest::prelude::*;

    /// Any RSVP status.
    pub fn rsvp_status() -> impl Strategy<Value = RsvpStatus> {
        prop::sample::select(RsvpStatus::ALL.to_vec())
    }

    /// Instants within a year either side of `anchor`, at minute precision,
    /// with the anchor itself drawn often enough to exercise the boundary.
    pub fn date_around(anchor: DateTime<Utc>) -> impl Strategy<Value = DateTime<Utc>> {
        prop_oneof![
            1 => Just(anchor),
            9 => (-525_600_i64..525_600).prop_map(move |m| anchor + Duration::minutes(m)),
        ]
    }
}

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use in_memory::InMemoryStore;
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }
}
