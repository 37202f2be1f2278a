//! Turns a listing's bookings into check-in and check-out events.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use turnover_db::db::enums::{CheckoutType, EventRole};
use turnover_rfc::ical::Booking;
use uuid::Uuid;

use crate::fingerprint::fingerprint;

/// Bookings read from one feed of a listing.
#[derive(Debug, Clone)]
pub struct FeedBatch {
    pub feed_id: Uuid,
    pub bookings: Vec<Booking>,
}

/// Identity of an event within a listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey {
    pub external_id: String,
    pub role: EventRole,
}

impl std::fmt::Display for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.external_id, self.role)
    }
}

/// An event as the current sync sees it, before reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedEvent {
    pub feed_id: Uuid,
    pub external_id: String,
    pub role: EventRole,
    pub event_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub title: String,
    pub guest_name: Option<String>,
    pub checkout_type: CheckoutType,
    pub fingerprint: String,
}

impl DerivedEvent {
    #[must_use]
    pub fn key(&self) -> EventKey {
        EventKey {
            external_id: self.external_id.clone(),
            role: self.role,
        }
    }
}

/// ## Summary
/// Derives the check-in and check-out events of every booking across the
/// feeds of one listing.
///
/// A booking UID seen in more than one feed is kept once, from the first feed
/// that supplied it. A check-out is `same_day` when another booking in the
/// batch checks in on the check-out date; check-ins are always `open`.
#[must_use]
#[tracing::instrument(skip(batches), fields(feeds = batches.len()))]
pub fn derive_events(batches: &[FeedBatch]) -> Vec<DerivedEvent> {
    let mut seen = HashSet::new();
    let mut bookings: Vec<(Uuid, &Booking)> = Vec::new();
    for batch in batches {
        for booking in &batch.bookings {
            if seen.insert(booking.uid.as_str()) {
                bookings.push((batch.feed_id, booking));
            } else {
                tracing::debug!(uid = %booking.uid, feed_id = %batch.feed_id, "Duplicate booking ignored");
            }
        }
    }

    let mut events = Vec::with_capacity(bookings.len() * 2);
    for &(feed_id, booking) in &bookings {
        let same_day = bookings
            .iter()
            .any(|(_, other)| other.uid != booking.uid && other.start_date == booking.end_date);
        let checkout_type = if same_day {
            CheckoutType::SameDay
        } else {
            CheckoutType::Open
        };

        let digest = fingerprint(
            booking.start,
            booking.end,
            &booking.title,
            booking.guest_name.as_deref(),
        );

        let event = |role: EventRole, event_date: NaiveDate, checkout_type: CheckoutType| DerivedEvent {
            feed_id,
            external_id: booking.uid.clone(),
            role,
            event_date,
            start_time: booking.start,
            end_time: booking.end,
            title: booking.title.clone(),
            guest_name: booking.guest_name.clone(),
            checkout_type,
            fingerprint: digest.clone(),
        };

        events.push(event(EventRole::CheckIn, booking.start_date, CheckoutType::Open));
        events.push(event(EventRole::CheckOut, booking.end_date, checkout_type));
    }

    tracing::debug!(bookings = bookings.len(), events = events.len(), "Derived events");
    events
}
