//! Query composition for `calendar_event` and its archived `event_version` rows.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::enums::CheckoutType;
use crate::db::schema::{calendar_event, event_version};
use crate::model::event::{
    CalendarEvent, EventSyncChangeset, EventVersion, NewCalendarEvent, NewEventVersion,
};


/// Filters accepted by the event listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub listing_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub include_inactive: bool,
}

/// ## Summary
/// Returns a query to select all events.
#[must_use]
pub fn all() -> calendar_event::BoxedQuery<'static, diesel::pg::Pg> {
    calendar_event::table.into_boxed()
}

/// ## Summary
/// Returns a query to find an event by ID.
#[must_use]
pub fn by_id(id: Uuid) -> calendar_event::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(calendar_event::id.eq(id))
}

/// ## Summary
/// Returns a query applying an [`EventFilter`], ordered by date.
///
/// Date bounds are inclusive. Inactive events are excluded unless requested.
#[must_use]
pub fn by_filter(filter: &EventFilter) -> calendar_event::BoxedQuery<'static, diesel::pg::Pg> {
    let mut query = all();
    if let Some(listing_id) = filter.listing_id {
        query = query.filter(calendar_event::listing_id.eq(listing_id));
    }
    if let Some(from) = filter.from {
        query = query.filter(calendar_event::event_date.ge(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(calendar_event::event_date.le(to));
    }
    if !filter.include_inactive {
        query = query.filter(calendar_event::is_active.eq(true));
    }
    query.order((
        calendar_event::event_date.asc(),
        calendar_event::role.asc(),
        calendar_event::external_id.asc(),
    ))
}

/// ## Summary
/// Lists events matching `filter`.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn list(
    conn: &mut DbConnection<'_>,
    filter: &EventFilter,
) -> QueryResult<Vec<CalendarEvent>> {
    by_filter(filter)
        .select(CalendarEvent::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Fetches one event.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn get(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<Option<CalendarEvent>> {
    by_id(id)
        .select(CalendarEvent::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Loads every stored event of a listing, locking the rows for the rest of
/// the transaction.
///
/// ## Errors
/// Returns an error if the database operation fails.
#[tracing::instrument(skip(conn))]
pub async fn load_for_reconcile(
    conn: &mut DbConnection<'_>,
    listing_id: Uuid,
) -> QueryResult<Vec<CalendarEvent>> {
    calendar_event::table
        .filter(calendar_event::listing_id.eq(listing_id))
        .select(CalendarEvent::as_select())
        .for_update()
        .load(conn)
        .await
}

/// ## Summary
/// Inserts a newly observed event.
///
/// ## Errors
/// Returns an error if the database operation fails, including a unique
/// violation on `(listing_id, external_id, role)`.
pub async fn insert(
    conn: &mut DbConnection<'_>,
    new: &NewCalendarEvent,
) -> QueryResult<CalendarEvent> {
    diesel::insert_into(calendar_event::table)
        .values(new)
        .returning(CalendarEvent::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Rewrites the feed-owned columns of a stored event.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn apply_sync(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    changes: &EventSyncChangeset,
) -> QueryResult<CalendarEvent> {
    diesel::update(calendar_event::table.find(id))
        .set(changes)
        .returning(CalendarEvent::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Marks an unchanged event as seen, refreshing its derived checkout type
/// and the feed that last supplied it.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn touch(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    feed_id: Uuid,
    checkout_type: CheckoutType,
    at: DateTime<Utc>,
) -> QueryResult<()> {
    diesel::update(calendar_event::table.find(id))
        .set((
            calendar_event::feed_id.eq(feed_id),
            calendar_event::checkout_type.eq(checkout_type),
            calendar_event::last_synced.eq(at),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Summary
/// Deactivates an event and bumps its version.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn deactivate(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    at: DateTime<Utc>,
) -> QueryResult<CalendarEvent> {
    diesel::update(calendar_event::table.find(id))
        .set((
            calendar_event::is_active.eq(false),
            calendar_event::version.eq(calendar_event::version + 1),
            calendar_event::last_synced.eq(at),
            calendar_event::updated_at.eq(at),
        ))
        .returning(CalendarEvent::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Sets the checkout time of an event, returning `None` if it does not exist.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn set_checkout_time(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    checkout_time: NaiveTime,
    at: DateTime<Utc>,
) -> QueryResult<Option<CalendarEvent>> {
    diesel::update(calendar_event::table.find(id))
        .set((
            calendar_event::checkout_time.eq(checkout_time),
            calendar_event::updated_at.eq(at),
        ))
        .returning(CalendarEvent::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Returns a query for the archived versions of an event, oldest first.
#[must_use]
pub fn versions_of(event_id: Uuid) -> event_version::BoxedQuery<'static, diesel::pg::Pg> {
    event_version::table
        .filter(event_version::event_id.eq(event_id))
        .order((event_version::version.asc(), event_version::recorded_at.asc()))
        .into_boxed()
}

/// ## Summary
/// Lists the archived versions of an event.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn versions(conn: &mut DbConnection<'_>, event_id: Uuid) -> QueryResult<Vec<EventVersion>> {
    versions_of(event_id)
        .select(EventVersion::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Appends an archived version row.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn archive_version(
    conn: &mut DbConnection<'_>,
    version: &NewEventVersion,
) -> QueryResult<()> {
    diesel::insert_into(event_version::table)
        .values(version)
        .execute(conn)
        .await?;
    Ok(())
}
