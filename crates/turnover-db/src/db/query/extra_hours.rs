//! Query composition for `extra_hours_report`.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::{extra_hours_report, listing};
use crate::model::extra_hours::{ExtraHoursChangeset, ExtraHoursReport, NewExtraHoursReport};
use crate::model::listing::Listing;

/// ## Summary
/// Returns a query for a cleaner's extra hours, optionally bounded by date.
#[must_use]
pub fn for_cleaner(
    cleaner_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> extra_hours_report::BoxedQuery<'static, diesel::pg::Pg> {
    let mut query = extra_hours_report::table
        .filter(extra_hours_report::cleaner_id.eq(cleaner_id))
        .into_boxed();
    if let Some(from) = from {
        query = query.filter(extra_hours_report::work_date.ge(from));
    }
    if let Some(to) = to {
        query = query.filter(extra_hours_report::work_date.le(to));
    }
    query.order((
        extra_hours_report::work_date.asc(),
        extra_hours_report::created_at.asc(),
    ))
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn list(
    conn: &mut DbConnection<'_>,
    cleaner_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> QueryResult<Vec<ExtraHoursReport>> {
    for_cleaner(cleaner_id, from, to)
        .select(ExtraHoursReport::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Returns a cleaner's extra hours within `[from, to]` with the listing each
/// one was logged against.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn with_listing_between(
    conn: &mut DbConnection<'_>,
    cleaner_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> QueryResult<Vec<(ExtraHoursReport, Option<Listing>)>> {
    extra_hours_report::table
        .left_join(listing::table)
        .filter(extra_hours_report::cleaner_id.eq(cleaner_id))
        .filter(extra_hours_report::work_date.between(from, to))
        .order((
            extra_hours_report::work_date.asc(),
            extra_hours_report::created_at.asc(),
        ))
        .select((
            ExtraHoursReport::as_select(),
            Option::<Listing>::as_select(),
        ))
        .load(conn)
        .await
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert(
    conn: &mut DbConnection<'_>,
    new: &NewExtraHoursReport<'_>,
) -> QueryResult<ExtraHoursReport> {
    diesel::insert_into(extra_hours_report::table)
        .values(new)
        .returning(ExtraHoursReport::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn update(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    changes: &ExtraHoursChangeset,
) -> QueryResult<Option<ExtraHoursReport>> {
    diesel::update(extra_hours_report::table.find(id))
        .set(changes)
        .returning(ExtraHoursReport::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<usize> {
    diesel::delete(extra_hours_report::table.find(id))
        .execute(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_cleaner_without_bounds() {
        let sql =
            diesel::debug_query::<diesel::pg::Pg, _>(&for_cleaner(Uuid::new_v4(), None, None))
                .to_string();
        assert!(sql.contains("\"extra_hours_report\".\"cleaner_id\" = $1"), "{sql}");
        assert!(!sql.contains(">="), "{sql}");
    }

    #[test]
    fn test_for_cleaner_with_bounds() {
        let from = NaiveDate::from_ymd_opt(2024, 6, 3);
        let to = NaiveDate::from_ymd_opt(2024, 6, 9);
        let sql = diesel::debug_query::<diesel::pg::Pg, _>(&for_cleaner(Uuid::new_v4(), from, to))
            .to_string();
        assert!(sql.contains("\"work_date\" >= $2"), "{sql}");
        assert!(sql.contains("\"work_date\" <= $3"), "{sql}");
    }
}
