//! Query composition for `cleaner_assignment`.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::enums::EventRole;
use crate::db::schema::{calendar_event, cleaner_assignment, listing};
use crate::model::assignment::{CleanerAssignment, NewCleanerAssignment};
use crate::model::event::CalendarEvent;
use crate::model::listing::Listing;

/// ## Summary
/// Returns a query for every assignment of an event, newest first.
#[must_use]
pub fn for_event(event_id: Uuid) -> cleaner_assignment::BoxedQuery<'static, diesel::pg::Pg> {
    cleaner_assignment::table
        .filter(cleaner_assignment::event_id.eq(event_id))
        .order((
            cleaner_assignment::created_at.desc(),
            cleaner_assignment::id.desc(),
        ))
        .into_boxed()
}

/// ## Summary
/// Fetches one assignment.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn get(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<Option<CleanerAssignment>> {
    cleaner_assignment::table
        .find(id)
        .select(CleanerAssignment::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Returns the active assignment of an event, if any.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn active_for_event(
    conn: &mut DbConnection<'_>,
    event_id: Uuid,
) -> QueryResult<Option<CleanerAssignment>> {
    for_event(event_id)
        .filter(cleaner_assignment::is_active.eq(true))
        .select(CleanerAssignment::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Returns the most recently created assignment of an event, active or not.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn most_recent_for_event(
    conn: &mut DbConnection<'_>,
    event_id: Uuid,
) -> QueryResult<Option<CleanerAssignment>> {
    for_event(event_id)
        .select(CleanerAssignment::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Inserts a new active assignment.
///
/// ## Errors
/// Returns an error if the database operation fails, including a unique
/// violation when the event already has an active assignment.
pub async fn insert(
    conn: &mut DbConnection<'_>,
    new: &NewCleanerAssignment,
) -> QueryResult<CleanerAssignment> {
    diesel::insert_into(cleaner_assignment::table)
        .values(new)
        .returning(CleanerAssignment::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Deactivates the active assignment of an event and returns it.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn deactivate_active_for_event(
    conn: &mut DbConnection<'_>,
    event_id: Uuid,
    at: DateTime<Utc>,
) -> QueryResult<Option<CleanerAssignment>> {
    diesel::update(
        cleaner_assignment::table
            .filter(cleaner_assignment::event_id.eq(event_id))
            .filter(cleaner_assignment::is_active.eq(true)),
    )
    .set((
        cleaner_assignment::is_active.eq(false),
        cleaner_assignment::updated_at.eq(at),
    ))
    .returning(CleanerAssignment::as_returning())
    .get_result(conn)
    .await
    .optional()
}

/// ## Summary
/// Marks an assignment active again.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn reactivate(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    at: DateTime<Utc>,
) -> QueryResult<CleanerAssignment> {
    diesel::update(cleaner_assignment::table.find(id))
        .set((
            cleaner_assignment::is_active.eq(true),
            cleaner_assignment::updated_at.eq(at),
        ))
        .returning(CleanerAssignment::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Stamps the start of the job.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn mark_started(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    at: DateTime<Utc>,
) -> QueryResult<CleanerAssignment> {
    diesel::update(cleaner_assignment::table.find(id))
        .set((
            cleaner_assignment::started_at.eq(Some(at)),
            cleaner_assignment::completed_at.eq(None::<DateTime<Utc>>),
            cleaner_assignment::updated_at.eq(at),
        ))
        .returning(CleanerAssignment::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Stamps the end of the job and records the hours worked.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn mark_completed(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    at: DateTime<Utc>,
    hours: f64,
) -> QueryResult<CleanerAssignment> {
    diesel::update(cleaner_assignment::table.find(id))
        .set((
            cleaner_assignment::completed_at.eq(Some(at)),
            cleaner_assignment::hours.eq(hours),
            cleaner_assignment::updated_at.eq(at),
        ))
        .returning(CleanerAssignment::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Returns the active assignments of a cleaner whose event is a check-out
/// dated within `[from, to]`, with the event and its listing.
///
/// ## Errors
/// Returns an error if the database operation fails.
#[tracing::instrument(skip(conn))]
pub async fn checkouts_for_cleaner(
    conn: &mut DbConnection<'_>,
    cleaner_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> QueryResult<Vec<(CleanerAssignment, CalendarEvent, Listing)>> {
    cleaner_assignment::table
        .inner_join(calendar_event::table.inner_join(listing::table))
        .filter(cleaner_assignment::cleaner_id.eq(cleaner_id))
        .filter(cleaner_assignment::is_active.eq(true))
        .filter(calendar_event::role.eq(EventRole::CheckOut))
        .filter(calendar_event::event_date.between(from, to))
        .order((calendar_event::event_date.asc(), listing::name.asc()))
        .select((
            CleanerAssignment::as_select(),
            CalendarEvent::as_select(),
            Listing::as_select(),
        ))
        .load(conn)
        .await
}
