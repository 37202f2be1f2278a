//! Query composition for `cleaner`.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::cleaner;
use crate::model::cleaner::{Cleaner, CleanerChangeset, NewCleaner};

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn list(conn: &mut DbConnection<'_>) -> QueryResult<Vec<Cleaner>> {
    cleaner::table
        .order(cleaner::name.asc())
        .select(Cleaner::as_select())
        .load(conn)
        .await
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn get(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<Option<Cleaner>> {
    cleaner::table
        .find(id)
        .select(Cleaner::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns an error if the database operation fails, including a unique
/// violation on `email`.
pub async fn insert(conn: &mut DbConnection<'_>, new: &NewCleaner<'_>) -> QueryResult<Cleaner> {
    diesel::insert_into(cleaner::table)
        .values(new)
        .returning(Cleaner::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns an error if the database operation fails.
pub async fn update(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    changes: &CleanerChangeset,
) -> QueryResult<Option<Cleaner>> {
    diesel::update(cleaner::table.find(id))
        .set(changes)
        .returning(Cleaner::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Deletes a cleaner. Assignments and extra hours cascade; payment reports
/// keep their snapshot with a `NULL` cleaner.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<usize> {
    diesel::delete(cleaner::table.find(id)).execute(conn).await
}
