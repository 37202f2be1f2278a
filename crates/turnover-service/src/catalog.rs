//! Listing and feed bookkeeping behind the catalog endpoints.

use diesel_async::scoped_futures::ScopedFutureExt;
use turnover_db::db::connection::DbConnection;
use turnover_db::db::query::{feed, listing};
use turnover_db::db::transaction::with_transaction;
use turnover_db::model::feed::{IcalFeed, IcalFeedChangeset, ListingFeed, NewIcalFeed};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::feed::normalize_url;

fn checked_url(url: &str) -> ServiceResult<String> {
    normalize_url(url).map_err(|e| ServiceError::ValidationError(e.to_string()))
}

/// ## Summary
/// Creates a feed and attaches it to `listing_id`. The URL is stored in its
/// normalized `https://` form.
///
/// ## Errors
/// Returns `ValidationError` for a blank name or unsupported URL, `NotFound`
/// for an unknown listing, or a database error.
#[tracing::instrument(skip(conn))]
pub async fn add_feed_to_listing(
    conn: &mut DbConnection<'_>,
    listing_id: Uuid,
    name: String,
    url: String,
) -> ServiceResult<IcalFeed> {
    if name.trim().is_empty() {
        return Err(ServiceError::ValidationError("name is required".to_string()));
    }
    let url = checked_url(&url)?;

    with_transaction(conn, move |tx| {
        async move {
            if listing::get(tx, listing_id).await?.is_none() {
                return Err(ServiceError::NotFound(format!("listing {listing_id}")));
            }

            let created = feed::insert(
                tx,
                &NewIcalFeed {
                    id: Uuid::now_v7(),
                    name: name.trim(),
                    url: &url,
                },
            )
            .await?;
            feed::attach(
                tx,
                ListingFeed {
                    listing_id,
                    feed_id: created.id,
                },
            )
            .await?;

            tracing::info!(feed_id = %created.id, "Feed attached to listing");
            Ok(created)
        }
        .scope_boxed()
    })
    .await
}

/// ## Errors
/// Returns `NotFound` if the feed is not attached to the listing, or a
/// database error.
#[tracing::instrument(skip(conn))]
pub async fn detach_feed(
    conn: &mut DbConnection<'_>,
    listing_id: Uuid,
    feed_id: Uuid,
) -> ServiceResult<()> {
    let removed = feed::detach(conn, ListingFeed { listing_id, feed_id }).await?;
    if removed == 0 {
        return Err(ServiceError::NotFound(format!(
            "feed {feed_id} on listing {listing_id}"
        )));
    }
    Ok(())
}

/// ## Summary
/// Applies a partial edit to a feed. A new URL is normalized like on create.
///
/// ## Errors
/// Returns `ValidationError` for a blank name or unsupported URL, `NotFound`
/// for an unknown feed, or a database error.
#[tracing::instrument(skip(conn))]
pub async fn update_feed(
    conn: &mut DbConnection<'_>,
    feed_id: Uuid,
    mut changes: IcalFeedChangeset,
) -> ServiceResult<IcalFeed> {
    if changes.name.is_none() && changes.url.is_none() && changes.is_active.is_none() {
        return Err(ServiceError::ValidationError("no changes given".to_string()));
    }
    if let Some(name) = changes.name.as_mut() {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::ValidationError("name is required".to_string()));
        }
        *name = trimmed.to_string();
    }
    if let Some(url) = changes.url.as_mut() {
        *url = checked_url(url)?;
    }

    feed::update(conn, feed_id, &changes)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("feed {feed_id}")))
}
