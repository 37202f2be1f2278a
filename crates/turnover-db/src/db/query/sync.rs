//! Query composition for `sync_session` and `sync_log_entry`.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::enums::SyncStatus;
use crate::db::schema::{sync_log_entry, sync_session};
use crate::model::sync::{NewSyncLogEntry, NewSyncSession, SyncCounters, SyncLogEntry, SyncSession};

/// ## Summary
/// Opens a session row.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn create_session(
    conn: &mut DbConnection<'_>,
    new: &NewSyncSession,
) -> QueryResult<SyncSession> {
    diesel::insert_into(sync_session::table)
        .values(new)
        .returning(SyncSession::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Adds `counters` to the session's running totals.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn add_counters(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    counters: &SyncCounters,
) -> QueryResult<()> {
    if counters.is_empty() {
        return Ok(());
    }

    diesel::update(sync_session::table.find(id))
        .set((
            sync_session::added.eq(sync_session::added + counters.added),
            sync_session::updated.eq(sync_session::updated + counters.updated),
            sync_session::deactivated.eq(sync_session::deactivated + counters.deactivated),
            sync_session::replaced.eq(sync_session::replaced + counters.replaced),
            sync_session::unchanged.eq(sync_session::unchanged + counters.unchanged),
            sync_session::errors.eq(sync_session::errors + counters.errors),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Summary
/// Closes a session with its final status.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn finish_session(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    status: SyncStatus,
    error_message: Option<&str>,
    at: DateTime<Utc>,
) -> QueryResult<SyncSession> {
    diesel::update(sync_session::table.find(id))
        .set((
            sync_session::status.eq(status),
            sync_session::error_message.eq(error_message),
            sync_session::completed_at.eq(Some(at)),
        ))
        .returning(SyncSession::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn get_session(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<Option<SyncSession>> {
    sync_session::table
        .find(id)
        .select(SyncSession::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Returns a query for the newest sessions.
#[must_use]
pub fn recent(limit: i64) -> sync_session::BoxedQuery<'static, diesel::pg::Pg> {
    sync_session::table
        .order(sync_session::started_at.desc())
        .limit(limit)
        .into_boxed()
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn recent_sessions(conn: &mut DbConnection<'_>, limit: i64) -> QueryResult<Vec<SyncSession>> {
    recent(limit)
        .select(SyncSession::as_select())
        .load(conn)
        .await
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert_entries(
    conn: &mut DbConnection<'_>,
    entries: &[NewSyncLogEntry],
) -> QueryResult<()> {
    if entries.is_empty() {
        return Ok(());
    }

    diesel::insert_into(sync_log_entry::table)
        .values(entries)
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Summary
/// Lists the log entries of a session in the order they were written.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn entries_for_session(
    conn: &mut DbConnection<'_>,
    session_id: Uuid,
) -> QueryResult<Vec<SyncLogEntry>> {
    sync_log_entry::table
        .filter(sync_log_entry::session_id.eq(session_id))
        .order((sync_log_entry::created_at.asc(), sync_log_entry::id.asc()))
        .select(SyncLogEntry::as_select())
        .load(conn)
        .await
}
