use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::enums::{CheckoutType, EventRole, VersionStatus};
use crate::db::schema;

/// The live row for one `(listing, booking, role)` key.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::calendar_event)]
#[diesel(check_for_backend(Pg))]
pub struct CalendarEvent {
    pub id: uuid::Uuid,
    pub listing_id: uuid::Uuid,
    pub feed_id: Option<uuid::Uuid>,
    pub external_id: String,
    pub role: EventRole,
    pub event_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub title: String,
    pub guest_name: Option<String>,
    pub checkout_type: CheckoutType,
    pub checkout_time: NaiveTime,
    pub is_active: bool,
    pub version: i32,
    pub fingerprint: String,
    pub last_synced: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::calendar_event)]
pub struct NewCalendarEvent {
    pub id: uuid::Uuid,
    pub listing_id: uuid::Uuid,
    pub feed_id: Option<uuid::Uuid>,
    pub external_id: String,
    pub role: EventRole,
    pub event_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub title: String,
    pub guest_name: Option<String>,
    pub checkout_type: CheckoutType,
    pub checkout_time: NaiveTime,
    pub fingerprint: String,
    pub last_synced: DateTime<Utc>,
}

/// Feed-owned columns rewritten when a stored event is updated from a sync.
///
/// `checkout_time` is user-owned and deliberately absent.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::calendar_event)]
#[diesel(treat_none_as_null = true)]
pub struct EventSyncChangeset {
    pub feed_id: Option<uuid::Uuid>,
    pub event_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub title: String,
    pub guest_name: Option<String>,
    pub checkout_type: CheckoutType,
    pub fingerprint: String,
    pub is_active: bool,
    pub version: i32,
    pub last_synced: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An archived `(start_time, end_time)` of an event, written before the live
/// row is moved or canceled.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::event_version)]
#[diesel(check_for_backend(Pg))]
pub struct EventVersion {
    pub id: uuid::Uuid,
    pub event_id: uuid::Uuid,
    pub version: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: VersionStatus,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::event_version)]
pub struct NewEventVersion {
    pub id: uuid::Uuid,
    pub event_id: uuid::Uuid,
    pub version: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: VersionStatus,
}

impl NewEventVersion {
    /// Snapshot of `event` as it stands before being superseded.
    #[must_use]
    pub fn archive(event: &CalendarEvent, status: VersionStatus) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            event_id: event.id,
            version: event.version,
            start_time: event.start_time,
            end_time: event.end_time,
            status,
        }
    }
}
