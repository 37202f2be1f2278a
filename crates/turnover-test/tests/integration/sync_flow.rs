#![allow(clippy::expect_used)]
//! Tests for feed sync and reconciliation against a real database.

use std::sync::Arc;

use turnover_test::component::assignment::{self, AssignRequest};
use turnover_test::component::db::enums::{
    CheckoutType, EventRole, NotificationKind, SyncStatus, VersionStatus,
};
use turnover_test::component::db::query::assignment as assignment_query;
use turnover_test::component::db::query::event::{self, EventFilter};
use turnover_test::component::db::query::notification;
use turnover_test::component::db::query::sync as sync_query;
use turnover_test::component::feed::MemoryFeedSource;
use turnover_test::component::model::event::CalendarEvent;
use uuid::Uuid;

use super::helpers::*;

const AIRBNB: &str = "https://feeds.example.com/airbnb.ics";
const BOOKING: &str = "https://feeds.example.com/booking.ics";

async fn events_of(test_db: &TestDb, listing_id: Uuid, include_inactive: bool) -> Vec<CalendarEvent> {
    let mut conn = test_db.get_conn().await.expect("Failed to get connection");
    event::list(
        &mut conn,
        &EventFilter {
            listing_id: Some(listing_id),
            include_inactive,
            ..EventFilter::default()
        },
    )
    .await
    .expect("Failed to list events")
}

fn find(events: &[CalendarEvent], uid: &str, role: EventRole) -> CalendarEvent {
    events
        .iter()
        .find(|e| e.external_id == uid && e.role == role)
        .cloned()
        .expect("event should exist")
}

// ============================================================================
// Insert and touch
// ============================================================================

/// ## Summary
/// A new booking adds two events; syncing the same feed again leaves them unchanged.
#[test_log::test(tokio::test)]
async fn sync_adds_then_leaves_unchanged() {
    let Some(test_db) = TestDb::new().await.expect("Failed to create test database") else {
        return;
    };
    let (listing, _) = test_db
        .seed_listing("Beach House", None, &[AIRBNB])
        .await
        .expect("Failed to seed listing");

    let source = Arc::new(MemoryFeedSource::new().with_body(AIRBNB, &ical(&[("b1", day(3), day(6))])));
    let engine = test_engine(Arc::clone(&source));

    let first = engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");
    assert_eq!(first.status, SyncStatus::Completed);
    assert_eq!(first.added, 2);
    assert_eq!(first.errors, 0);

    let second = engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");
    assert_eq!(second.added, 0);
    assert_eq!(second.unchanged, 2);
    assert_eq!(second.updated, 0);

    let events = events_of(&test_db, listing.id, false).await;
    assert_eq!(events.len(), 2);
    let check_out = find(&events, "b1", EventRole::CheckOut);
    assert_eq!(check_out.event_date, day(6));
    assert_eq!(check_out.version, 1);
    assert_eq!(check_out.checkout_type, CheckoutType::Open);
}

/// ## Summary
/// A check-in on another booking's check-out date turns that check-out into a same-day turnover.
#[test_log::test(tokio::test)]
async fn back_to_back_booking_marks_same_day() {
    let Some(test_db) = TestDb::new().await.expect("Failed to create test database") else {
        return;
    };
    let (listing, _) = test_db
        .seed_listing("Beach House", None, &[AIRBNB, BOOKING])
        .await
        .expect("Failed to seed listing");

    let source = Arc::new(
        MemoryFeedSource::new()
            .with_body(AIRBNB, &ical(&[("b1", day(3), day(6))]))
            .with_body(BOOKING, &ical(&[])),
    );
    let engine = test_engine(Arc::clone(&source));
    engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");

    source.set_body(BOOKING, &ical(&[("b2", day(6), day(9))]));
    let session = engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");
    assert_eq!(session.added, 2);
    assert_eq!(session.unchanged, 2);

    let events = events_of(&test_db, listing.id, false).await;
    assert_eq!(
        find(&events, "b1", EventRole::CheckOut).checkout_type,
        CheckoutType::SameDay
    );
    assert_eq!(
        find(&events, "b2", EventRole::CheckOut).checkout_type,
        CheckoutType::Open
    );
}

// ============================================================================
// Update and versions
// ============================================================================

/// ## Summary
/// A moved booking updates both events and archives the prior window.
#[test_log::test(tokio::test)]
async fn moved_booking_archives_previous_version() {
    let Some(test_db) = TestDb::new().await.expect("Failed to create test database") else {
        return;
    };
    let (listing, _) = test_db
        .seed_listing("City Loft", None, &[AIRBNB])
        .await
        .expect("Failed to seed listing");

    let source = Arc::new(MemoryFeedSource::new().with_body(AIRBNB, &ical(&[("b1", day(3), day(6))])));
    let engine = test_engine(Arc::clone(&source));
    engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");
    let before = find(&events_of(&test_db, listing.id, false).await, "b1", EventRole::CheckOut);

    source.set_body(AIRBNB, &ical(&[("b1", day(4), day(7))]));
    let session = engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");
    assert_eq!(session.updated, 2);
    assert_eq!(session.added, 0);
    assert_eq!(session.deactivated, 0);

    let after = find(&events_of(&test_db, listing.id, false).await, "b1", EventRole::CheckOut);
    assert_eq!(after.id, before.id);
    assert_eq!(after.version, 2);
    assert_eq!(after.event_date, day(7));

    let mut conn = test_db.get_conn().await.expect("Failed to get connection");
    let versions = event::versions(&mut conn, after.id)
        .await
        .expect("Failed to load versions");
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].version, 1);
    assert_eq!(versions[0].status, VersionStatus::Moved);
    assert_eq!(versions[0].start_time, before.start_time);
}

// ============================================================================
// Deactivation guards
// ============================================================================

/// ## Summary
/// A feed that suddenly returns no bookings deactivates nothing.
#[test_log::test(tokio::test)]
async fn empty_feed_deactivates_nothing() {
    let Some(test_db) = TestDb::new().await.expect("Failed to create test database") else {
        return;
    };
    let (listing, _) = test_db
        .seed_listing("Cabin", None, &[AIRBNB])
        .await
        .expect("Failed to seed listing");

    let source = Arc::new(MemoryFeedSource::new().with_body(AIRBNB, &ical(&[("b1", day(3), day(6))])));
    let engine = test_engine(Arc::clone(&source));
    engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");

    source.set_body(AIRBNB, &ical(&[]));
    let session = engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");
    assert_eq!(session.status, SyncStatus::Completed);
    assert_eq!(session.deactivated, 0);
    assert_eq!(events_of(&test_db, listing.id, false).await.len(), 2);
}

/// ## Summary
/// A failing feed is counted as an error and its events stay active.
#[test_log::test(tokio::test)]
async fn failed_feed_keeps_events() {
    let Some(test_db) = TestDb::new().await.expect("Failed to create test database") else {
        return;
    };
    let (listing, _) = test_db
        .seed_listing("Cabin", None, &[AIRBNB])
        .await
        .expect("Failed to seed listing");

    let source = Arc::new(MemoryFeedSource::new().with_body(AIRBNB, &ical(&[("b1", day(3), day(6))])));
    let engine = test_engine(Arc::clone(&source));
    engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");

    source.set_failure(AIRBNB, "503 Service Unavailable");
    let session = engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");
    assert_eq!(session.errors, 1);
    assert_eq!(session.deactivated, 0);
    assert_eq!(events_of(&test_db, listing.id, false).await.len(), 2);
}

/// ## Summary
/// A booking that moves to a sibling feed follows it, so a later failure of
/// the old feed no longer shields the booking from removal.
#[test_log::test(tokio::test)]
async fn booking_moved_between_feeds_is_attributed_to_new_feed() {
    let Some(test_db) = TestDb::new().await.expect("Failed to create test database") else {
        return;
    };
    let (listing, feeds) = test_db
        .seed_listing("Cabin", None, &[AIRBNB, BOOKING])
        .await
        .expect("Failed to seed listing");
    let booking_feed = feeds
        .iter()
        .find(|f| f.url == BOOKING)
        .expect("booking feed should exist")
        .id;

    let source = Arc::new(
        MemoryFeedSource::new()
            .with_body(AIRBNB, &ical(&[("b1", day(3), day(6))]))
            .with_body(BOOKING, &ical(&[("b2", day(10), day(12))])),
    );
    let engine = test_engine(Arc::clone(&source));
    engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");

    source.set_body(AIRBNB, &ical(&[]));
    source.set_body(
        BOOKING,
        &ical(&[("b1", day(3), day(6)), ("b2", day(10), day(12))]),
    );
    let moved = engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");
    assert_eq!(moved.unchanged, 4);
    let events = events_of(&test_db, listing.id, false).await;
    assert_eq!(find(&events, "b1", EventRole::CheckIn).feed_id, Some(booking_feed));
    assert_eq!(find(&events, "b1", EventRole::CheckOut).feed_id, Some(booking_feed));

    source.set_failure(AIRBNB, "503 Service Unavailable");
    source.set_body(BOOKING, &ical(&[("b2", day(10), day(12))]));
    let removed = engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");
    assert_eq!(removed.errors, 1);
    assert_eq!(removed.deactivated, 2);

    let events = events_of(&test_db, listing.id, false).await;
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.external_id == "b2"));
}

// ============================================================================
// Deactivation and return
// ============================================================================

/// ## Summary
/// Removing an assigned booking releases the assignment and notifies the
/// cleaner; the booking coming back replaces the events and restores it.
#[test_log::test(tokio::test)]
async fn removed_booking_releases_and_restores_assignment() {
    let Some(test_db) = TestDb::new().await.expect("Failed to create test database") else {
        return;
    };
    let (listing, _) = test_db
        .seed_listing("Beach House", Some(2.5), &[AIRBNB])
        .await
        .expect("Failed to seed listing");
    let cleaner = test_db
        .seed_cleaner("Ana", 20.0)
        .await
        .expect("Failed to seed cleaner");

    let both = ical(&[("b1", day(3), day(6)), ("b2", day(10), day(12))]);
    let source = Arc::new(MemoryFeedSource::new().with_body(AIRBNB, &both));
    let engine = test_engine(Arc::clone(&source));
    engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");

    let check_out = find(&events_of(&test_db, listing.id, false).await, "b1", EventRole::CheckOut);
    let assigned = {
        let mut conn = test_db.get_conn().await.expect("Failed to get connection");
        assignment::assign(
            &mut conn,
            AssignRequest {
                event_id: check_out.id,
                cleaner_id: cleaner.id,
                hours: None,
                default_hours: 2.0,
            },
        )
        .await
        .expect("Assign should succeed")
    };
    assert!((assigned.hours - 2.5).abs() < f64::EPSILON);

    source.set_body(AIRBNB, &ical(&[("b2", day(10), day(12))]));
    let removed = engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");
    assert_eq!(removed.deactivated, 2);
    assert_eq!(removed.unchanged, 2);

    {
        let mut conn = test_db.get_conn().await.expect("Failed to get connection");
        let released = assignment_query::get(&mut conn, assigned.id)
            .await
            .expect("Failed to load assignment")
            .expect("assignment row is kept");
        assert!(!released.is_active);

        let notes = notification::list(&mut conn, Some(cleaner.id), false)
            .await
            .expect("Failed to list notifications");
        assert!(
            notes
                .iter()
                .any(|n| n.kind == NotificationKind::EventCanceled && n.event_id == Some(check_out.id))
        );
    }
    assert_eq!(events_of(&test_db, listing.id, false).await.len(), 2);

    source.set_body(AIRBNB, &both);
    let returned = engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");
    assert_eq!(returned.replaced, 2);
    assert_eq!(returned.added, 0);

    let mut conn = test_db.get_conn().await.expect("Failed to get connection");
    let restored = assignment_query::active_for_event(&mut conn, check_out.id)
        .await
        .expect("Failed to load assignment")
        .expect("assignment should be restored");
    assert_eq!(restored.id, assigned.id);
    assert_eq!(restored.cleaner_id, cleaner.id);
}

/// ## Summary
/// Syncing every listing records one session covering all of them.
#[test_log::test(tokio::test)]
async fn sync_all_covers_every_active_listing() {
    let Some(test_db) = TestDb::new().await.expect("Failed to create test database") else {
        return;
    };
    let (beach, _) = test_db
        .seed_listing("Beach House", None, &[AIRBNB])
        .await
        .expect("Failed to seed listing");
    let (loft, _) = test_db
        .seed_listing("City Loft", None, &[BOOKING])
        .await
        .expect("Failed to seed listing");

    let source = Arc::new(
        MemoryFeedSource::new()
            .with_body(AIRBNB, &ical(&[("b1", day(3), day(6))]))
            .with_body(BOOKING, &ical(&[("c1", day(2), day(4)), ("c2", day(8), day(9))])),
    );
    let engine = test_engine(source);

    let session = engine
        .sync_all(test_db.provider())
        .await
        .expect("Sync should succeed");
    assert_eq!(session.status, SyncStatus::Completed);
    assert_eq!(session.added, 6);
    assert_eq!(session.errors, 0);

    assert_eq!(events_of(&test_db, beach.id, false).await.len(), 2);
    assert_eq!(events_of(&test_db, loft.id, false).await.len(), 4);
}

/// ## Summary
/// A listing whose sync is already in flight is skipped with a log entry and
/// left untouched.
#[test_log::test(tokio::test)]
async fn listing_already_syncing_is_skipped() {
    let Some(test_db) = TestDb::new().await.expect("Failed to create test database") else {
        return;
    };
    let (listing, _) = test_db
        .seed_listing("Beach House", None, &[AIRBNB])
        .await
        .expect("Failed to seed listing");

    let source = Arc::new(MemoryFeedSource::new().with_body(AIRBNB, &ical(&[("b1", day(3), day(6))])));
    let engine = test_engine(Arc::clone(&source));
    engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");
    let before = events_of(&test_db, listing.id, true).await;

    source.set_body(AIRBNB, &ical(&[("b9", day(20), day(22))]));
    let held = engine
        .locks()
        .try_acquire(listing.id)
        .expect("listing should not be locked");
    let skipped = engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");
    assert_eq!(skipped.status, SyncStatus::Completed);
    assert_eq!(
        (
            skipped.added,
            skipped.updated,
            skipped.deactivated,
            skipped.replaced,
            skipped.unchanged,
            skipped.errors
        ),
        (0, 0, 0, 0, 0, 0)
    );

    {
        let mut conn = test_db.get_conn().await.expect("Failed to get connection");
        let entries = sync_query::entries_for_session(&mut conn, skipped.id)
            .await
            .expect("Failed to list entries");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, "listing_skipped");
        assert_eq!(entries[0].listing_id, Some(listing.id));
    }
    assert_eq!(events_of(&test_db, listing.id, true).await, before);

    drop(held);
    let resumed = engine
        .sync_listing(test_db.provider(), listing.id)
        .await
        .expect("Sync should succeed");
    assert_eq!(resumed.added, 2);
    assert_eq!(resumed.deactivated, 2);
}
