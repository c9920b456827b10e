//! Property tests for the RSVP state machine and listing filters.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use planner_core::environment::Clock;
use planner_core::types::{RsvpStatus, TimeFilter};
use planner_testing::fixtures::{alice, bob, event_form, event_form_on, test_engine};
use planner_testing::properties::{date_around, rsvp_status};
use planner_testing::test_clock;
use proptest::prelude::*;
use std::collections::HashSet;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any sequence of RSVPs by one user leaves one row holding the last status.
    #[test]
    fn last_rsvp_wins(statuses in prop::collection::vec(rsvp_status(), 1..6)) {
        let result: Result<(), TestCaseError> = runtime().block_on(async {
            let (engine, store) = test_engine();
            let event = engine
                .create_event(Some(&alice()), &event_form("Meetup"))
                .await
                .unwrap();

            for status in &statuses {
                let rsvp = engine.rsvp(Some(&bob()), event.id, status.as_str()).await.unwrap();
                prop_assert_eq!(rsvp.status, *status);
            }

            let rows = store.rsvp_rows(event.id);
            prop_assert_eq!(rows.len(), 1);
            prop_assert_eq!(Some(rows[0].status), statuses.last().copied());

            let detail = engine.get_event(Some(&bob()), event.id).await.unwrap();
            prop_assert_eq!(detail.rsvp_count, 1);
            Ok(())
        });
        result?;
    }

    /// Upcoming and past partition the unfiltered listing.
    #[test]
    fn upcoming_and_past_partition_all(
        dates in prop::collection::vec(date_around(test_clock().now()), 0..12)
    ) {
        let result: Result<(), TestCaseError> = runtime().block_on(async {
            let (engine, _) = test_engine();
            for (i, date) in dates.iter().enumerate() {
                engine
                    .create_event(Some(&alice()), &event_form_on(&format!("event {i}"), *date))
                    .await
                    .unwrap();
            }

            let ids = |filter| {
                let engine = &engine;
                async move {
                    engine
                        .list_events(None, filter, None)
                        .await
                        .unwrap()
                        .into_iter()
                        .map(|s| s.event.id)
                        .collect::<HashSet<_>>()
                }
            };
            let all = ids(TimeFilter::All).await;
            let upcoming = ids(TimeFilter::Upcoming).await;
            let past = ids(TimeFilter::Past).await;

            prop_assert_eq!(all.len(), dates.len());
            prop_assert!(upcoming.is_disjoint(&past));
            prop_assert_eq!(&upcoming | &past, all);
            Ok(())
        });
        result?;
    }

    /// Listings are always ordered by date.
    #[test]
    fn listing_is_date_ordered(
        dates in prop::collection::vec(date_around(test_clock().now()), 0..12)
    ) {
        let result: Result<(), TestCaseError> = runtime().block_on(async {
            let (engine, _) = test_engine();
            for (i, date) in dates.iter().enumerate() {
                engine
                    .create_event(Some(&alice()), &event_form_on(&format!("event {i}"), *date))
                    .await
                    .unwrap();
            }
            let listed = engine.list_events(None, TimeFilter::All, None).await.unwrap();
            prop_assert!(listed.windows(2).all(|w| w[0].event.date <= w[1].event.date));
            Ok(())
        });
        result?;
    }
}

#[test]
fn every_status_is_a_valid_transition_target() {
    runtime().block_on(async {
        let (engine, store) = test_engine();
        let event = engine
            .create_event(Some(&alice()), &event_form("Meetup"))
            .await
            .unwrap();
        for from in RsvpStatus::ALL {
            for to in RsvpStatus::ALL {
                engine.rsvp(Some(&bob()), event.id, from.as_str()).await.unwrap();
                engine.rsvp(Some(&bob()), event.id, to.as_str()).await.unwrap();
                assert_eq!(store.rsvp_rows(event.id)[0].status, to);
            }
        }
    });
}
