//! Query composition for `listing`.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::listing;
use crate::model::listing::{Listing, ListingChangeset, NewListing};

/// ## Summary
/// Returns a query to select all listings.
#[must_use]
pub fn all() -> listing::BoxedQuery<'static, diesel::pg::Pg> {
    listing::table.into_boxed()
}

/// ## Summary
/// Returns a query to find a listing by ID.
#[must_use]
pub fn by_id(id: Uuid) -> listing::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(listing::id.eq(id))
}

/// ## Summary
/// Returns a query to find listings that take part in syncs.
#[must_use]
pub fn active() -> listing::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(listing::is_active.eq(true))
}

/// ## Summary
/// Lists listings ordered by name.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn list(conn: &mut DbConnection<'_>, include_inactive: bool) -> QueryResult<Vec<Listing>> {
    let query = if include_inactive { all() } else { active() };
    query
        .order(listing::name.asc())
        .select(Listing::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Fetches one listing.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn get(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<Option<Listing>> {
    by_id(id)
        .select(Listing::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Returns the IDs of every active listing.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn active_ids(conn: &mut DbConnection<'_>) -> QueryResult<Vec<Uuid>> {
    active()
        .order(listing::name.asc())
        .select(listing::id)
        .load(conn)
        .await
}

/// ## Summary
/// Inserts a listing and returns the stored row.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert(conn: &mut DbConnection<'_>, new: &NewListing<'_>) -> QueryResult<Listing> {
    diesel::insert_into(listing::table)
        .values(new)
        .returning(Listing::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Applies a partial update, returning `None` if the listing does not exist.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn update(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    changes: &ListingChangeset,
) -> QueryResult<Option<Listing>> {
    diesel::update(listing::table.find(id))
        .set(changes)
        .returning(Listing::as_returning())
        .get_result(conn)
        .await
        .optional()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_filters_on_is_active() {
        let sql = diesel::debug_query::<diesel::pg::Pg, _>(&active()).to_string();
        assert!(sql.contains("\"listing\".\"is_active\" = $1"), "{sql}");
    }

    #[test]
    fn test_by_id_binds_id() {
        let id = Uuid::new_v4();
        let sql = diesel::debug_query::<diesel::pg::Pg, _>(&by_id(id)).to_string();
        assert!(sql.contains("\"listing\".\"id\" = $1"), "{sql}");
        assert!(sql.contains(&id.to_string()), "{sql}");
    }
}
