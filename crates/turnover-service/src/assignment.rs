//! Cleaner assignment bookkeeping.
//!
//! The sync hooks keep assignments in step with event lifecycle; the rest
//! back the assignment and job-timer endpoints.

use chrono::{DateTime, Utc};
use diesel_async::scoped_futures::ScopedFutureExt;
use turnover_core::util::money::round2;
use turnover_db::db::connection::DbConnection;
use turnover_db::db::query::{assignment, cleaner, event, listing, notification};
use turnover_db::db::transaction::with_transaction;
use turnover_db::model::assignment::{CleanerAssignment, NewCleanerAssignment};
use turnover_db::model::event::CalendarEvent;
use turnover_db::model::notification::NewNotification;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::notify;

/// ## Summary
/// Releases the active assignment of an event that was just deactivated.
///
/// The assignment is kept as an inactive row. Returns the released
/// assignment and a notification for its cleaner.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn release_for_deactivated(
    conn: &mut DbConnection<'_>,
    event: &CalendarEvent,
    at: DateTime<Utc>,
) -> ServiceResult<Option<(CleanerAssignment, NewNotification)>> {
    let released = assignment::deactivate_active_for_event(conn, event.id, at).await?;
    Ok(released.map(|released| {
        tracing::info!(
            event_id = %event.id,
            assignment_id = %released.id,
            "Assignment released for deactivated event"
        );
        let note = notify::event_canceled(released.cleaner_id, event);
        (released, note)
    }))
}

/// ## Summary
/// Restores the most recent assignment of an event that was changed or
/// reactivated, unless the event already has an active assignment.
///
/// Returns the assignment now active for the event, if any.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn restore_for_event(
    conn: &mut DbConnection<'_>,
    event_id: Uuid,
    at: DateTime<Utc>,
) -> ServiceResult<Option<CleanerAssignment>> {
    if let Some(active) = assignment::active_for_event(conn, event_id).await? {
        return Ok(Some(active));
    }

    let Some(latest) = assignment::most_recent_for_event(conn, event_id).await? else {
        return Ok(None);
    };

    let restored = assignment::reactivate(conn, latest.id, at).await?;
    tracing::info!(%event_id, assignment_id = %restored.id, "Assignment restored");
    Ok(Some(restored))
}

/// Request to put a cleaner on an event.
#[derive(Debug, Clone, Copy)]
pub struct AssignRequest {
    pub event_id: Uuid,
    pub cleaner_id: Uuid,
    /// Falls back to the listing's `hours_per_clean`, then `default_hours`.
    pub hours: Option<f64>,
    pub default_hours: f64,
}

/// ## Summary
/// Assigns a cleaner to an event, replacing any active assignment.
///
/// The prior assignment is deactivated before the new one is inserted, in one
/// transaction.
///
/// ## Errors
/// Returns `NotFound` for an unknown event or cleaner, `Conflict` for an
/// inactive event, `ValidationError` for negative hours, or a database error.
#[tracing::instrument(skip(conn), fields(event_id = %req.event_id, cleaner_id = %req.cleaner_id))]
pub async fn assign(
    conn: &mut DbConnection<'_>,
    req: AssignRequest,
) -> ServiceResult<CleanerAssignment> {
    if req.hours.is_some_and(|h| !h.is_finite() || h < 0.0) {
        return Err(ServiceError::ValidationError(
            "hours must be a non-negative number".to_string(),
        ));
    }

    with_transaction(conn, move |tx| {
        async move {
            let event = event::get(tx, req.event_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("event {}", req.event_id)))?;
            if !event.is_active {
                return Err(ServiceError::Conflict(format!(
                    "event {} is inactive",
                    event.id
                )));
            }

            cleaner::get(tx, req.cleaner_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("cleaner {}", req.cleaner_id)))?;

            let hours = match req.hours {
                Some(hours) => hours,
                None => listing::get(tx, event.listing_id)
                    .await?
                    .and_then(|l| l.hours_per_clean)
                    .unwrap_or(req.default_hours),
            };

            let now = Utc::now();
            if let Some(previous) = assignment::deactivate_active_for_event(tx, event.id, now).await?
            {
                tracing::debug!(previous = %previous.id, "Previous assignment deactivated");
            }

            let created = assignment::insert(
                tx,
                &NewCleanerAssignment {
                    id: Uuid::now_v7(),
                    event_id: event.id,
                    cleaner_id: req.cleaner_id,
                    hours: round2(hours),
                },
            )
            .await?;

            notification::insert_batch(
                tx,
                &[notify::assignment_created(req.cleaner_id, &event, created.hours)],
            )
            .await?;

            tracing::info!(assignment_id = %created.id, hours = created.hours, "Cleaner assigned");
            Ok(created)
        }
        .scope_boxed()
    })
    .await
}

/// ## Summary
/// Removes the active assignment of an event.
///
/// ## Errors
/// Returns `NotFound` if the event has no active assignment, or a database error.
#[tracing::instrument(skip(conn))]
pub async fn unassign(conn: &mut DbConnection<'_>, event_id: Uuid) -> ServiceResult<CleanerAssignment> {
    assignment::deactivate_active_for_event(conn, event_id, Utc::now())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("active assignment for event {event_id}")))
}

async fn active_assignment(
    conn: &mut DbConnection<'_>,
    assignment_id: Uuid,
) -> ServiceResult<CleanerAssignment> {
    let found = assignment::get(conn, assignment_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("assignment {assignment_id}")))?;
    if !found.is_active {
        return Err(ServiceError::Conflict(format!(
            "assignment {assignment_id} is inactive"
        )));
    }
    Ok(found)
}

/// ## Summary
/// Starts the job timer of an assignment.
///
/// ## Errors
/// Returns `NotFound`, `Conflict` if the assignment is inactive or already
/// completed, or a database error.
#[tracing::instrument(skip(conn))]
pub async fn start_job(conn: &mut DbConnection<'_>, assignment_id: Uuid) -> ServiceResult<CleanerAssignment> {
    let current = active_assignment(conn, assignment_id).await?;
    if current.completed_at.is_some() {
        return Err(ServiceError::Conflict(format!(
            "assignment {assignment_id} is already completed"
        )));
    }

    Ok(assignment::mark_started(conn, current.id, Utc::now()).await?)
}

/// ## Summary
/// Completes a job. Without explicit `hours`, the time elapsed since the job
/// was started is recorded, rounded to 2 decimals.
///
/// ## Errors
/// Returns `NotFound`, `Conflict` if the assignment is inactive or was never
/// started and no hours were given, `ValidationError` for negative hours, or
/// a database error.
#[tracing::instrument(skip(conn))]
pub async fn complete_job(
    conn: &mut DbConnection<'_>,
    assignment_id: Uuid,
    hours: Option<f64>,
) -> ServiceResult<CleanerAssignment> {
    if hours.is_some_and(|h| !h.is_finite() || h < 0.0) {
        return Err(ServiceError::ValidationError(
            "hours must be a non-negative number".to_string(),
        ));
    }

    let current = active_assignment(conn, assignment_id).await?;
    let now = Utc::now();
    let hours = match (hours, current.started_at) {
        (Some(hours), _) => round2(hours),
        (None, Some(started_at)) => elapsed_hours(started_at, now),
        (None, None) => {
            return Err(ServiceError::Conflict(format!(
                "assignment {assignment_id} was never started"
            )));
        }
    };

    Ok(assignment::mark_completed(conn, current.id, now, hours).await?)
}

/// ## Summary
/// Hours between two instants, rounded to 2 decimals and never negative.
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    reason = "Job durations are far below the f64 mantissa limit"
)]
pub fn elapsed_hours(started_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> f64 {
    let millis = (completed_at - started_at).num_milliseconds().max(0);
    round2(millis as f64 / 3_600_000.0)
}
