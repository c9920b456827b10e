//! Ready-made identities, forms and engines for tests.

use crate::in_memory::InMemoryStore;
use crate::mocks::{FixedClock, test_clock};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use planner_core::environment::Clock;
use planner_core::form::EventForm;
use planner_core::types::Identity;
use planner_core::{Engine, EngineConfig};
use std::sync::Arc;

/// Alice, who usually owns the events under test.
#[must_use]
pub fn alice() -> Identity {
    Identity::new("alice")
        .with_name("Alice")
        .with_email("alice@example.com")
}

/// Bob, who usually responds to Alice's events.
#[must_use]
pub fn bob() -> Identity {
    Identity::new("bob").with_name("Bob").with_email("bob@example.com")
}

/// Carol, a third party.
#[must_use]
pub fn carol() -> Identity {
    Identity::new("carol")
        .with_name("Carol")
        .with_email("carol@example.com")
}

/// A valid public event form dated one week after [`test_clock`].
#[must_use]
pub fn event_form(title: &str) -> EventForm {
    EventForm {
        title: Some(title.to_string()),
        description: Some(format!("{title} description")),
        date: Some(format_date(test_clock().now() + Duration::days(7))),
        location: Some("Community Hall".to_string()),
        max_attendees: None,
        is_public: Some("on".to_string()),
    }
}

/// Same as [`event_form`] but private.
#[must_use]
pub fn private_event_form(title: &str) -> EventForm {
    EventForm {
        is_public: None,
        ..event_form(title)
    }
}

/// A valid public form on an explicit date.
#[must_use]
pub fn event_form_on(title: &str, date: DateTime<Utc>) -> EventForm {
    EventForm {
        date: Some(format_date(date)),
        ..event_form(title)
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Engine configuration for tests: short store deadline, caching on.
#[must_use]
pub fn test_config() -> EngineConfig {
    EngineConfig {
        store_timeout: std::time::Duration::from_millis(200),
        ..EngineConfig::default()
    }
}

/// An engine over `store`, reading time from `clock`.
#[must_use]
pub fn engine_with(store: &InMemoryStore, clock: FixedClock, config: EngineConfig) -> Engine {
    Engine::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(clock),
        config,
    )
}

/// A fresh store with Alice, Bob and Carol registered, and an engine over it.
#[must_use]
pub fn test_engine() -> (Engine, InMemoryStore) {
    let store = InMemoryStore::new();
    for identity in [alice(), bob(), carol()] {
        store.issue_session(format!("token-{}", identity.id), identity.id.as_str());
        store.register_user(identity);
    }
    let engine = engine_with(&store, test_clock(), test_config());
    (engine, store)
}
