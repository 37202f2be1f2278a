//! Query composition for `ical_feed` and the `listing_feed` association.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::{ical_feed, listing_feed};
use crate::model::feed::{IcalFeed, IcalFeedChangeset, ListingFeed, NewIcalFeed};

/// ## Summary
/// Returns a query to select all feeds.
#[must_use]
pub fn all() -> ical_feed::BoxedQuery<'static, diesel::pg::Pg> {
    ical_feed::table.into_boxed()
}

/// ## Summary
/// Lists every feed with the listings it is attached to.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn list(conn: &mut DbConnection<'_>) -> QueryResult<Vec<(IcalFeed, Vec<Uuid>)>> {
    let feeds: Vec<IcalFeed> = all()
        .order(ical_feed::name.asc())
        .select(IcalFeed::as_select())
        .load(conn)
        .await?;

    let links: Vec<ListingFeed> = listing_feed::table
        .select(ListingFeed::as_select())
        .load(conn)
        .await?;

    Ok(feeds
        .into_iter()
        .map(|feed| {
            let listings = links
                .iter()
                .filter(|link| link.feed_id == feed.id)
                .map(|link| link.listing_id)
                .collect();
            (feed, listings)
        })
        .collect())
}

/// ## Summary
/// Fetches one feed.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn get(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<Option<IcalFeed>> {
    all()
        .filter(ical_feed::id.eq(id))
        .select(IcalFeed::as_select())
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Returns the active feeds attached to a listing.
///
/// ## Errors
/// Returns an error if the database operation fails.
#[tracing::instrument(skip(conn))]
pub async fn active_for_listing(
    conn: &mut DbConnection<'_>,
    listing_id: Uuid,
) -> QueryResult<Vec<IcalFeed>> {
    ical_feed::table
        .inner_join(listing_feed::table)
        .filter(listing_feed::listing_id.eq(listing_id))
        .filter(ical_feed::is_active.eq(true))
        .order(ical_feed::created_at.asc())
        .select(IcalFeed::as_select())
        .load(conn)
        .await
}

/// ## Summary
/// Inserts a feed row.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert(conn: &mut DbConnection<'_>, new: &NewIcalFeed<'_>) -> QueryResult<IcalFeed> {
    diesel::insert_into(ical_feed::table)
        .values(new)
        .returning(IcalFeed::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Attaches a feed to a listing. Attaching twice is a no-op.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn attach(conn: &mut DbConnection<'_>, link: ListingFeed) -> QueryResult<()> {
    diesel::insert_into(listing_feed::table)
        .values(&link)
        .on_conflict_do_nothing()
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Summary
/// Detaches a feed from a listing, returning the number of links removed.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn detach(conn: &mut DbConnection<'_>, link: ListingFeed) -> QueryResult<usize> {
    diesel::delete(
        listing_feed::table
            .filter(listing_feed::listing_id.eq(link.listing_id))
            .filter(listing_feed::feed_id.eq(link.feed_id)),
    )
    .execute(conn)
    .await
}

/// ## Summary
/// Applies a partial update, returning `None` if the feed does not exist.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn update(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    changes: &IcalFeedChangeset,
) -> QueryResult<Option<IcalFeed>> {
    diesel::update(ical_feed::table.find(id))
        .set(changes)
        .returning(IcalFeed::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Records a successful fetch of the feed.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn mark_synced(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    at: DateTime<Utc>,
) -> QueryResult<()> {
    diesel::update(ical_feed::table.find(id))
        .set(ical_feed::last_synced.eq(Some(at)))
        .execute(conn)
        .await?;
    Ok(())
}
