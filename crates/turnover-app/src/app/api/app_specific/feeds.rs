use salvo::prelude::Json;
use salvo::{Depot, Request, Router, handler};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use turnover_db::db::query::feed;
use turnover_db::model::feed::{IcalFeed, IcalFeedChangeset};
use turnover_service::catalog;
use turnover_service::feed::normalize_url;
use uuid::Uuid;

use super::reply::{json_body, path_uuid, required, success};
use crate::db_handler::get_db_from_depot;
use crate::error::{AppError, AppResult};

/// Feed together with the listings it is attached to.
#[derive(Debug, Serialize)]
pub struct FeedView {
    #[serde(flatten)]
    pub feed: IcalFeed,
    pub listing_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateFeedRequest {
    pub name: Option<String>,
    pub url: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateFeedRequest {
    fn validate(&self) -> AppResult<()> {
        if self.name.is_none() && self.url.is_none() && self.is_active.is_none() {
            return Err(AppError::BadRequest("no changes given".to_string()));
        }
        if let Some(name) = &self.name {
            required("name", name)?;
        }
        if let Some(url) = &self.url {
            normalize_url(url).map_err(|e| AppError::BadRequest(e.to_string()))?;
        }
        Ok(())
    }
}

#[handler]
async fn list_feeds(depot: &mut Depot) -> AppResult<Json<Value>> {
    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let feeds: Vec<FeedView> = feed::list(&mut conn)
        .await?
        .into_iter()
        .map(|(feed, listing_ids)| FeedView { feed, listing_ids })
        .collect();
    success("feeds", &feeds)
}

/// ## Summary
/// PATCH /app/feeds/{id} - Renames, re-points or (de)activates a feed.
/// Inactive feeds are not fetched.
#[handler]
async fn update_feed(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let id = path_uuid(req, "id")?;
    let body: UpdateFeedRequest = json_body(req).await?;
    body.validate()?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let updated = catalog::update_feed(
        &mut conn,
        id,
        IcalFeedChangeset {
            name: body.name,
            url: body.url,
            is_active: body.is_active,
        },
    )
    .await?;
    success("feed", &updated)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("feeds")
        .get(list_feeds)
        .push(Router::with_path("{id}").patch(update_feed))
}
