//! Tests for scope-aware updates.
//!
//! Covers in-place edits, detaching one occurrence, splitting a series, and
//! the guarantee that a rejected edit leaves the series untouched.

use tatami_test::component::store::BookingStore;
use tatami_test::component::types::Scope;
use tatami_test::component::{ServiceError, UpdateBooking, UpdateOutcome};

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn all_scope_retitles_every_occurrence() {
    let harness = Harness::new().await;
    let booking = harness
        .service
        .create(series(harness.room_id, "FREQ=DAILY;COUNT=5", 2, 9, 10))
        .await
        .expect("Failed to create series");

    let outcome = harness
        .service
        .update(
            booking.id,
            UpdateBooking {
                title: Some("Renamed".to_string()),
                ..UpdateBooking::default()
            },
            Scope::All,
            None,
        )
        .await
        .expect("Failed to update");
    let UpdateOutcome::Updated(updated) = outcome else {
        panic!("expected in-place update");
    };
    assert_eq!(updated.title, "Renamed");

    let entries = harness.room_schedule(instant(1, 0), instant(9, 0)).await;
    assert_eq!(entries.len(), 5);
    assert!(entries.iter().all(|entry| entry.title == "Renamed"));
}

#[test_log::test(tokio::test)]
async fn instance_scope_detaches_one_occurrence() {
    let harness = Harness::new().await;
    let booking = harness
        .service
        .create(series(harness.room_id, "FREQ=DAILY;COUNT=5", 2, 9, 10))
        .await
        .expect("Failed to create series");

    // Move the March 4 occurrence to the afternoon.
    let outcome = harness
        .service
        .update(
            booking.id,
            reschedule(4, 14, 15),
            Scope::Instance,
            Some(instant(4, 9)),
        )
        .await
        .expect("Failed to detach occurrence");
    let UpdateOutcome::InstanceDetached {
        series: updated,
        replacement,
    } = outcome
    else {
        panic!("expected detached instance");
    };
    assert_eq!(
        updated.recurrence.as_ref().map(|r| r.exception_dates.clone()),
        Some(vec![instant(4, 9)])
    );
    assert!(!replacement.is_recurring());
    assert_eq!(replacement.start_time, instant(4, 14));

    let entries = harness.room_schedule(instant(1, 0), instant(9, 0)).await;
    let starts: Vec<_> = entries.iter().map(|entry| entry.start).collect();
    assert_eq!(
        starts,
        vec![
            instant(2, 9),
            instant(3, 9),
            instant(4, 14),
            instant(5, 9),
            instant(6, 9),
        ]
    );
}

#[test_log::test(tokio::test)]
async fn rejected_instance_update_leaves_the_series_untouched() {
    let harness = Harness::new().await;
    harness
        .service
        .create(single(harness.room_id, 4, 14, 15))
        .await
        .expect("Failed to create blocker");
    let booking = harness
        .service
        .create(series(harness.room_id, "FREQ=DAILY;COUNT=5", 2, 9, 10))
        .await
        .expect("Failed to create series");

    let result = harness
        .service
        .update(
            booking.id,
            reschedule(4, 14, 15),
            Scope::Instance,
            Some(instant(4, 9)),
        )
        .await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));

    // No exception recorded, no replacement inserted.
    let stored = harness
        .store
        .find_by_id(booking.id)
        .await
        .expect("Failed to query")
        .expect("series exists");
    assert_eq!(
        stored.recurrence.map(|r| r.exception_dates),
        Some(Vec::new())
    );
    let all = harness
        .store
        .list_bookings(Some(harness.room_id))
        .await
        .expect("Failed to list bookings");
    assert_eq!(all.len(), 2);
}

#[test_log::test(tokio::test)]
async fn detached_occurrence_cannot_land_on_its_own_series() {
    let harness = Harness::new().await;
    let booking = harness
        .service
        .create(series(harness.room_id, "FREQ=DAILY;COUNT=5", 2, 9, 10))
        .await
        .expect("Failed to create series");

    // Moving the March 4 occurrence onto March 5 collides with the series
    // itself even though the store check excludes the series record.
    let result = harness
        .service
        .update(
            booking.id,
            reschedule(5, 9, 10),
            Scope::Instance,
            Some(instant(4, 9)),
        )
        .await;
    let Err(ServiceError::Conflict(conflict)) = result else {
        panic!("expected conflict, got {result:?}");
    };
    assert_eq!(conflict.occurrence, Some(instant(5, 9)));
}

#[test_log::test(tokio::test)]
async fn future_scope_splits_the_series() {
    let harness = Harness::new().await;
    let booking = harness
        .service
        .create(series(harness.room_id, "FREQ=DAILY;COUNT=10", 2, 9, 10))
        .await
        .expect("Failed to create series");

    // From March 6 onwards, meet in the afternoon instead.
    let outcome = harness
        .service
        .update(
            booking.id,
            UpdateBooking {
                recurrence_rule: Some("FREQ=DAILY;COUNT=5".to_string()),
                ..reschedule(6, 14, 15)
            },
            Scope::Future,
            Some(instant(6, 9)),
        )
        .await
        .expect("Failed to split series");
    let UpdateOutcome::SeriesSplit {
        truncated,
        continuation,
    } = outcome
    else {
        panic!("expected series split");
    };
    let truncated_rule = truncated
        .recurrence
        .as_ref()
        .map(|r| r.rule_text.clone())
        .expect("truncated rule");
    assert!(truncated_rule.contains("UNTIL=20260305T090000Z"));
    assert!(!truncated_rule.contains("COUNT"));
    assert!(continuation.is_recurring());

    // Mornings through March 5, afternoons March 6-10, nothing doubled.
    let entries = harness.room_schedule(instant(1, 0), instant(31, 0)).await;
    let starts: Vec<_> = entries.iter().map(|entry| entry.start).collect();
    assert_eq!(
        starts,
        vec![
            instant(2, 9),
            instant(3, 9),
            instant(4, 9),
            instant(5, 9),
            instant(6, 14),
            instant(7, 14),
            instant(8, 14),
            instant(9, 14),
            instant(10, 14),
        ]
    );
}

#[test_log::test(tokio::test)]
async fn rejected_split_leaves_the_series_untouched() {
    let harness = Harness::new().await;
    harness
        .service
        .create(single(harness.room_id, 10, 14, 15))
        .await
        .expect("Failed to create blocker");
    let booking = harness
        .service
        .create(series(harness.room_id, "FREQ=DAILY;COUNT=10", 2, 9, 10))
        .await
        .expect("Failed to create series");

    // The continuation's fifth afternoon hits the March 10 blocker.
    let result = harness
        .service
        .update(
            booking.id,
            UpdateBooking {
                recurrence_rule: Some("FREQ=DAILY;COUNT=10".to_string()),
                ..reschedule(6, 14, 15)
            },
            Scope::Future,
            Some(instant(6, 9)),
        )
        .await;
    let Err(ServiceError::Conflict(conflict)) = result else {
        panic!("expected conflict, got {result:?}");
    };
    assert_eq!(conflict.candidate.expect("candidate").start, instant(10, 14));

    let stored = harness
        .store
        .find_by_id(booking.id)
        .await
        .expect("Failed to query")
        .expect("series exists");
    assert_eq!(
        stored.recurrence.map(|r| r.rule_text),
        Some("FREQ=DAILY;COUNT=10".to_string())
    );
    let all = harness
        .store
        .list_bookings(Some(harness.room_id))
        .await
        .expect("Failed to list bookings");
    assert_eq!(all.len(), 2);
}

#[test_log::test(tokio::test)]
async fn split_at_the_first_occurrence_replaces_the_whole_series() {
    let harness = Harness::new().await;
    let booking = harness
        .service
        .create(series(harness.room_id, "FREQ=DAILY;COUNT=5", 2, 9, 10))
        .await
        .expect("Failed to create series");

    // Editing "from the first occurrence onwards" covers the whole series:
    // the record is taken over by the continuation instead of split.
    let outcome = harness
        .service
        .update(
            booking.id,
            UpdateBooking {
                recurrence_rule: Some("FREQ=DAILY;COUNT=3".to_string()),
                ..reschedule(2, 14, 15)
            },
            Scope::Future,
            Some(instant(2, 9)),
        )
        .await
        .expect("Editing from the first occurrence must succeed");
    let UpdateOutcome::Updated(updated) = outcome else {
        panic!("expected whole-series replacement");
    };
    assert_eq!(updated.id, booking.id);
    assert_eq!(
        updated.recurrence.as_ref().map(|r| r.rule_text.clone()),
        Some("FREQ=DAILY;COUNT=3".to_string())
    );

    // The morning series is gone; only the three afternoons remain.
    let entries = harness.room_schedule(instant(1, 0), instant(31, 0)).await;
    let starts: Vec<_> = entries.iter().map(|entry| entry.start).collect();
    assert_eq!(starts, vec![instant(2, 14), instant(3, 14), instant(4, 14)]);
}

#[test_log::test(tokio::test)]
async fn continuation_may_not_overlap_retained_occurrences() {
    let harness = Harness::new().await;
    let booking = harness
        .service
        .create(series(harness.room_id, "FREQ=DAILY;COUNT=10", 2, 9, 10))
        .await
        .expect("Failed to create series");

    // Splitting at March 6 but starting the continuation on March 5 runs
    // into the part of the series that survives the truncation.
    let result = harness
        .service
        .update(
            booking.id,
            UpdateBooking {
                recurrence_rule: Some("FREQ=DAILY;COUNT=5".to_string()),
                ..reschedule(5, 9, 10)
            },
            Scope::Future,
            Some(instant(6, 9)),
        )
        .await;
    let Err(ServiceError::Conflict(conflict)) = result else {
        panic!("expected conflict, got {result:?}");
    };
    assert_eq!(conflict.occurrence, Some(instant(5, 9)));
}
