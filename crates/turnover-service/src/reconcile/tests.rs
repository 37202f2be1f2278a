use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use turnover_db::db::enums::EventRole;
use turnover_rfc::ical::Booking;

use super::*;
use crate::derive::{FeedBatch, derive_events};

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).unwrap())
}

fn booking(uid: &str, start: NaiveDate, end: NaiveDate) -> Booking {
    Booking {
        uid: uid.to_string(),
        title: "Reserved".to_string(),
        guest_name: None,
        start: midnight(start),
        end: midnight(end),
        start_date: start,
        end_date: end,
    }
}

/// Stored row as the executor would have written it for `derived`.
fn stored_from(derived: &DerivedEvent) -> CalendarEvent {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    CalendarEvent {
        id: Uuid::new_v4(),
        listing_id: Uuid::nil(),
        feed_id: Some(derived.feed_id),
        external_id: derived.external_id.clone(),
        role: derived.role,
        event_date: derived.event_date,
        start_time: derived.start_time,
        end_time: derived.end_time,
        title: derived.title.clone(),
        guest_name: derived.guest_name.clone(),
        checkout_type: derived.checkout_type,
        checkout_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        is_active: true,
        version: 1,
        fingerprint: derived.fingerprint.clone(),
        last_synced: now,
        created_at: now,
        updated_at: now,
    }
}

fn ctx_for(feeds: &[Uuid]) -> PlanContext {
    PlanContext {
        succeeded_feeds: feeds.iter().copied().collect(),
        failed_feeds: HashSet::new(),
        window_start: date(5, 1),
    }
}

fn derive(feed_id: Uuid, bookings: Vec<Booking>) -> Vec<DerivedEvent> {
    derive_events(&[FeedBatch { feed_id, bookings }])
}

#[test_log::test]
fn test_first_sync_inserts_both_events() {
    let feed = Uuid::new_v4();
    let derived = derive(feed, vec![booking("b1", date(6, 3), date(6, 5))]);

    let plan = plan_listing(&[], derived, &ctx_for(&[feed]));

    assert_eq!(plan.actions.len(), 2);
    assert!(
        plan.actions
            .iter()
            .all(|a| matches!(a, EventAction::Insert { .. }))
    );
    assert_eq!(plan.counters().added, 2);
    assert_eq!(plan.deactivation_skipped, None);
}

#[test_log::test]
fn test_repeated_sync_is_unchanged() {
    let feed = Uuid::new_v4();
    let first = derive(feed, vec![booking("b1", date(6, 3), date(6, 5))]);
    let stored: Vec<CalendarEvent> = first.iter().map(stored_from).collect();

    let again = derive(feed, vec![booking("b1", date(6, 3), date(6, 5))]);
    let plan = plan_listing(&stored, again, &ctx_for(&[feed]));

    let counters = plan.counters();
    assert_eq!(counters.unchanged, 2);
    assert_eq!(counters.added + counters.updated + counters.deactivated, 0);
    for action in &plan.actions {
        let EventAction::Touch { checkout_type, .. } = action else {
            panic!("expected touch, got {action:?}");
        };
        assert_eq!(*checkout_type, CheckoutType::Open);
    }
}

#[test_log::test]
fn test_booking_moved_to_sibling_feed_follows_its_new_feed() {
    let airbnb = Uuid::new_v4();
    let booking_com = Uuid::new_v4();
    let stored: Vec<CalendarEvent> = derive(airbnb, vec![booking("b1", date(6, 3), date(6, 5))])
        .iter()
        .map(stored_from)
        .collect();

    let moved = derive(booking_com, vec![booking("b1", date(6, 3), date(6, 5))]);
    let plan = plan_listing(&stored, moved, &ctx_for(&[airbnb, booking_com]));

    assert_eq!(plan.counters().unchanged, 2);
    for action in &plan.actions {
        let EventAction::Touch { feed_id, .. } = action else {
            panic!("expected touch, got {action:?}");
        };
        assert_eq!(*feed_id, booking_com);
    }
}

#[test_log::test]
fn test_back_to_back_booking_refreshes_checkout_type_without_version_bump() {
    let feed = Uuid::new_v4();
    let first = derive(feed, vec![booking("b1", date(6, 3), date(6, 5))]);
    let stored: Vec<CalendarEvent> = first.iter().map(stored_from).collect();

    let next = derive(
        feed,
        vec![
            booking("b1", date(6, 3), date(6, 5)),
            booking("b2", date(6, 5), date(6, 7)),
        ],
    );
    let plan = plan_listing(&stored, next, &ctx_for(&[feed]));

    let b1_checkout = stored
        .iter()
        .find(|e| e.external_id == "b1" && e.role == EventRole::CheckOut)
        .unwrap();
    let touch = plan
        .actions
        .iter()
        .find(|a| matches!(a, EventAction::Touch { event_id, .. } if *event_id == b1_checkout.id))
        .unwrap();
    assert!(matches!(
        touch,
        EventAction::Touch {
            checkout_type: CheckoutType::SameDay,
            ..
        }
    ));

    let counters = plan.counters();
    assert_eq!(counters.added, 2);
    assert_eq!(counters.unchanged, 2);
    assert_eq!(counters.updated, 0);
}

#[test_log::test]
fn test_moved_booking_is_changed() {
    let feed = Uuid::new_v4();
    let first = derive(feed, vec![booking("b1", date(6, 3), date(6, 5))]);
    let stored: Vec<CalendarEvent> = first.iter().map(stored_from).collect();

    let moved = derive(feed, vec![booking("b1", date(6, 3), date(6, 6))]);
    let plan = plan_listing(&stored, moved, &ctx_for(&[feed]));

    assert_eq!(plan.counters().updated, 2);
    for action in &plan.actions {
        assert!(matches!(
            action,
            EventAction::Update {
                changed: true,
                reactivated: false,
                ..
            }
        ));
    }
}

#[test_log::test]
fn test_absent_booking_is_deactivated() {
    let feed = Uuid::new_v4();
    let stored: Vec<CalendarEvent> = derive(
        feed,
        vec![
            booking("b1", date(6, 3), date(6, 5)),
            booking("b2", date(6, 10), date(6, 12)),
        ],
    )
    .iter()
    .map(stored_from)
    .collect();

    let plan = plan_listing(
        &stored,
        derive(feed, vec![booking("b1", date(6, 3), date(6, 5))]),
        &ctx_for(&[feed]),
    );

    let deactivated: Vec<&EventKey> = plan
        .actions
        .iter()
        .filter_map(|a| match a {
            EventAction::Deactivate { key, .. } => Some(key),
            _ => None,
        })
        .collect();
    assert_eq!(deactivated.len(), 2);
    assert!(deactivated.iter().all(|k| k.external_id == "b2"));
    assert_eq!(plan.counters().deactivated, 2);
}

#[test_log::test]
fn test_successful_but_empty_feed_deactivates_nothing() {
    let feed = Uuid::new_v4();
    let stored: Vec<CalendarEvent> = derive(feed, vec![booking("b1", date(6, 3), date(6, 5))])
        .iter()
        .map(stored_from)
        .collect();

    let plan = plan_listing(&stored, Vec::new(), &ctx_for(&[feed]));

    assert!(plan.actions.is_empty());
    assert_eq!(
        plan.deactivation_skipped,
        Some(DeactivationSkip::NoDerivedEvents)
    );
    assert_eq!(plan.stored_active, 2);
}

#[test_log::test]
fn test_all_feeds_failed_deactivates_nothing() {
    let feed = Uuid::new_v4();
    let stored: Vec<CalendarEvent> = derive(feed, vec![booking("b1", date(6, 3), date(6, 5))])
        .iter()
        .map(stored_from)
        .collect();

    let ctx = PlanContext {
        succeeded_feeds: HashSet::new(),
        failed_feeds: [feed].into_iter().collect(),
        window_start: date(5, 1),
    };
    let plan = plan_listing(&stored, Vec::new(), &ctx);

    assert!(plan.actions.is_empty());
    assert_eq!(
        plan.deactivation_skipped,
        Some(DeactivationSkip::NoFeedSucceeded)
    );
}

#[test_log::test]
fn test_events_of_failed_feed_are_protected() {
    let healthy = Uuid::new_v4();
    let broken = Uuid::new_v4();
    let mut stored: Vec<CalendarEvent> =
        derive(healthy, vec![booking("a1", date(6, 3), date(6, 5))])
            .iter()
            .map(stored_from)
            .collect();
    stored.extend(
        derive(broken, vec![booking("v1", date(6, 8), date(6, 9))])
            .iter()
            .map(stored_from),
    );

    let ctx = PlanContext {
        succeeded_feeds: [healthy].into_iter().collect(),
        failed_feeds: [broken].into_iter().collect(),
        window_start: date(5, 1),
    };
    let plan = plan_listing(
        &stored,
        derive(healthy, vec![booking("a1", date(6, 3), date(6, 5))]),
        &ctx,
    );

    assert_eq!(plan.counters().deactivated, 0);
    assert_eq!(plan.counters().unchanged, 2);
    assert_eq!(plan.protected, 2);
}

#[test_log::test]
fn test_events_before_window_are_protected() {
    let feed = Uuid::new_v4();
    let stored: Vec<CalendarEvent> = derive(
        feed,
        vec![
            booking("old", date(3, 1), date(3, 4)),
            booking("b1", date(6, 3), date(6, 5)),
        ],
    )
    .iter()
    .map(stored_from)
    .collect();

    let plan = plan_listing(
        &stored,
        derive(feed, vec![booking("b1", date(6, 3), date(6, 5))]),
        &ctx_for(&[feed]),
    );

    assert_eq!(plan.counters().deactivated, 0);
    assert_eq!(plan.protected, 2);
}

#[test_log::test]
fn test_reappearing_booking_is_replaced() {
    let feed = Uuid::new_v4();
    let mut stored: Vec<CalendarEvent> =
        derive(feed, vec![booking("b1", date(6, 3), date(6, 5))])
            .iter()
            .map(stored_from)
            .collect();
    for event in &mut stored {
        event.is_active = false;
        event.version = 2;
    }

    let plan = plan_listing(
        &stored,
        derive(feed, vec![booking("b1", date(6, 3), date(6, 5))]),
        &ctx_for(&[feed]),
    );

    assert_eq!(plan.counters().replaced, 2);
    for action in &plan.actions {
        assert!(matches!(
            action,
            EventAction::Update {
                changed: false,
                reactivated: true,
                ..
            }
        ));
    }
}

#[test_log::test]
fn test_inactive_rows_are_not_deactivated_again() {
    let feed = Uuid::new_v4();
    let mut stored: Vec<CalendarEvent> =
        derive(feed, vec![booking("gone", date(6, 3), date(6, 5))])
            .iter()
            .map(stored_from)
            .collect();
    for event in &mut stored {
        event.is_active = false;
    }

    let plan = plan_listing(
        &stored,
        derive(feed, vec![booking("b1", date(6, 10), date(6, 12))]),
        &ctx_for(&[feed]),
    );

    assert_eq!(plan.counters().deactivated, 0);
    assert_eq!(plan.counters().added, 2);
}
