//! Weekly cleaner payment reports.

use chrono::{NaiveDate, Utc};
use diesel_async::scoped_futures::ScopedFutureExt;
use turnover_core::config::RegenerateStatus;
use turnover_core::util::week::WeekRange;
use turnover_db::db::connection::DbConnection;
use turnover_db::db::enums::ReportStatus;
use turnover_db::db::query::{assignment, cleaner, extra_hours, payment_report};
use turnover_db::db::transaction::with_transaction;
use turnover_db::model::payment_report::{CleanerPaymentReport, NewCleanerPaymentReport};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

pub mod report;

pub use report::{ReportData, compute_report};

/// ## Summary
/// Pay week containing `reference_day`.
///
/// ## Errors
/// Returns `ValidationError` when the week falls outside the supported
/// calendar range.
pub fn report_week(reference_day: NaiveDate) -> ServiceResult<WeekRange> {
    WeekRange::containing(reference_day).ok_or_else(|| {
        ServiceError::ValidationError(format!(
            "reference_date {reference_day} is outside the supported range"
        ))
    })
}

/// ## Summary
/// Generates the report of `cleaner_id` for the week containing
/// `reference_day`, replacing every report stored for the same
/// `(cleaner, week_start, week_end)` key.
///
/// With [`RegenerateStatus::Preserve`] the new row keeps the status of the
/// newest row it replaces; otherwise it starts as `pending`.
///
/// ## Errors
/// Returns `ValidationError` for a reference day with no representable week,
/// `NotFound` for an unknown cleaner, or a database error. The
/// previous rows survive any failure.
#[tracing::instrument(skip(conn))]
pub async fn generate_report(
    conn: &mut DbConnection<'_>,
    cleaner_id: Uuid,
    reference_day: NaiveDate,
    regenerate: RegenerateStatus,
) -> ServiceResult<CleanerPaymentReport> {
    let week = report_week(reference_day)?;

    with_transaction(conn, move |tx| {
        async move {
            let cleaner = cleaner::get(tx, cleaner_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("cleaner {cleaner_id}")))?;

            let checkouts =
                assignment::checkouts_for_cleaner(tx, cleaner_id, week.monday, week.sunday)
                    .await?;
            let extras =
                extra_hours::with_listing_between(tx, cleaner_id, week.monday, week.sunday)
                    .await?;
            let data = compute_report(&cleaner, week, &checkouts, &extras);

            let previous =
                payment_report::latest_for_key(tx, cleaner_id, week.monday, week.sunday).await?;
            let status = match (regenerate, &previous) {
                (RegenerateStatus::Preserve, Some(previous)) => previous.status,
                _ => ReportStatus::Pending,
            };
            let replaced =
                payment_report::delete_for_key(tx, cleaner_id, week.monday, week.sunday).await?;

            let stored = payment_report::insert(
                tx,
                &NewCleanerPaymentReport {
                    id: Uuid::now_v7(),
                    cleaner_id: Some(cleaner_id),
                    week_start: week.monday,
                    week_end: week.sunday,
                    total_hours: data.total_hours,
                    total_amount: data.total_amount,
                    report_data: serde_json::to_value(&data)?,
                    status,
                },
            )
            .await?;

            tracing::info!(
                report_id = %stored.id,
                week_start = %week.monday,
                lines = data.lines.len(),
                extra_entries = data.extra_hours.len(),
                total_hours = data.total_hours,
                total_amount = data.total_amount,
                replaced,
                %status,
                "Payment report generated"
            );
            Ok(stored)
        }
        .scope_boxed()
    })
    .await
}

/// ## Summary
/// Moves a report to `next`.
///
/// ## Errors
/// Returns `NotFound` for an unknown report, `Conflict` when the transition
/// is not allowed from the current status, or a database error.
#[tracing::instrument(skip(conn))]
pub async fn update_status(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    next: ReportStatus,
) -> ServiceResult<CleanerPaymentReport> {
    with_transaction(conn, move |tx| {
        async move {
            let current = payment_report::get(tx, id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("payment report {id}")))?;

            if !current.status.can_transition_to(next) {
                return Err(ServiceError::Conflict(format!(
                    "payment report cannot move from {} to {next}",
                    current.status
                )));
            }

            let updated = payment_report::set_status(tx, id, next, Utc::now())
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("payment report {id}")))?;
            tracing::info!(from = %current.status, to = %next, "Payment report status changed");
            Ok(updated)
        }
        .scope_boxed()
    })
    .await
}
