//! Query composition for `cleaner_payment_report`.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::enums::ReportStatus;
use crate::db::schema::cleaner_payment_report;
use crate::model::payment_report::{CleanerPaymentReport, NewCleanerPaymentReport};

/// Filters accepted by the report listing endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub cleaner_id: Option<Uuid>,
    pub week_start: Option<NaiveDate>,
}

/// ## Summary
/// Returns a query applying a [`ReportFilter`], newest week first.
#[must_use]
pub fn by_filter(filter: ReportFilter) -> cleaner_payment_report::BoxedQuery<'static, diesel::pg::Pg> {
    let mut query = cleaner_payment_report::table.into_boxed();
    if let Some(cleaner_id) = filter.cleaner_id {
        query = query.filter(cleaner_payment_report::cleaner_id.eq(cleaner_id));
    }
    if let Some(week_start) = filter.week_start {
        query = query.filter(cleaner_payment_report::week_start.eq(week_start));
    }
    query.order((
        cleaner_payment_report::week_start.desc(),
        cleaner_payment_report::created_at.desc(),
    ))
}

/// ## Summary
/// Returns a query for the reports of one `(cleaner, week_start, week_end)` key.
#[must_use]
pub fn by_key(
    cleaner_id: Uuid,
    week_start: NaiveDate,
    week_end: NaiveDate,
) -> cleaner_payment_report::BoxedQuery<'static, diesel::pg::Pg> {
    cleaner_payment_report::table
        .filter(cleaner_payment_report::cleaner_id.eq(cleaner_id))
        .filter(cleaner_payment_report::week_start.eq(week_start))
        .filter(cleaner_payment_report::week_end.eq(week_end))
        .order(cleaner_payment_report::created_at.desc())
        .into_boxed()
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn list(
    conn: &mut DbConnection<'_>,
    filter: ReportFilter,
) -> QueryResult<Vec<CleanerPaymentReport>> {
    by_filter(filter)
        .select(CleanerPaymentReport::as_select())
        .load(conn)
        .await
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn get(
    conn: &mut DbConnection<'_>,
    id: Uuid,
) -> QueryResult<Option<CleanerPaymentReport>> {
    cleaner_payment_report::table
        .find(id)
        .select(CleanerPaymentReport::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Returns the newest report stored for a key, if any.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn latest_for_key(
    conn: &mut DbConnection<'_>,
    cleaner_id: Uuid,
    week_start: NaiveDate,
    week_end: NaiveDate,
) -> QueryResult<Option<CleanerPaymentReport>> {
    by_key(cleaner_id, week_start, week_end)
        .select(CleanerPaymentReport::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Deletes every report stored for a key, returning how many were removed.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete_for_key(
    conn: &mut DbConnection<'_>,
    cleaner_id: Uuid,
    week_start: NaiveDate,
    week_end: NaiveDate,
) -> QueryResult<usize> {
    diesel::delete(
        cleaner_payment_report::table
            .filter(cleaner_payment_report::cleaner_id.eq(cleaner_id))
            .filter(cleaner_payment_report::week_start.eq(week_start))
            .filter(cleaner_payment_report::week_end.eq(week_end)),
    )
    .execute(conn)
    .await
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert(
    conn: &mut DbConnection<'_>,
    new: &NewCleanerPaymentReport,
) -> QueryResult<CleanerPaymentReport> {
    diesel::insert_into(cleaner_payment_report::table)
        .values(new)
        .returning(CleanerPaymentReport::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Writes a new status, returning `None` if the report does not exist.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn set_status(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    status: ReportStatus,
    at: DateTime<Utc>,
) -> QueryResult<Option<CleanerPaymentReport>> {
    diesel::update(cleaner_payment_report::table.find(id))
        .set((
            cleaner_payment_report::status.eq(status),
            cleaner_payment_report::updated_at.eq(at),
        ))
        .returning(CleanerPaymentReport::as_returning())
        .get_result(conn)
        .await
        .optional()
}
