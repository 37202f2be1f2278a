use chrono::Utc;
use salvo::http::StatusCode;
use salvo::prelude::Json;
use salvo::{Depot, Request, Response, Router, handler};
use serde::Deserialize;
use serde_json::Value;
use turnover_db::db::query::listing;
use turnover_db::model::listing::{ListingChangeset, NewListing};
use turnover_service::{catalog, feed::normalize_url};
use uuid::Uuid;

use super::reply::{
    json_body, non_negative, nullable, path_uuid, query_flag, required, success,
};
use crate::db_handler::get_db_from_depot;
use crate::error::{AppError, AppResult};

/// ## Summary
/// Create listing request payload
#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    pub name: String,
    pub external_id: Option<String>,
    pub color: Option<String>,
    pub bank_account: Option<String>,
    pub hours_per_clean: Option<f64>,
}

/// Partial listing edit; `null` clears an optional field.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateListingRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub external_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub color: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub bank_account: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub hours_per_clean: Option<Option<f64>>,
    pub is_active: Option<bool>,
}

impl UpdateListingRequest {
    fn into_changeset(self) -> AppResult<ListingChangeset> {
        let name = self
            .name
            .map(|name| required("name", &name).map(str::to_string))
            .transpose()?;
        if let Some(Some(hours)) = self.hours_per_clean {
            non_negative("hours_per_clean", hours)?;
        }

        Ok(ListingChangeset {
            name,
            external_id: self.external_id,
            color: self.color,
            bank_account: self.bank_account,
            hours_per_clean: self.hours_per_clean,
            is_active: self.is_active,
            updated_at: Some(Utc::now()),
        })
    }
}

/// ## Summary
/// Add feed request payload
#[derive(Debug, Deserialize)]
pub struct AddFeedRequest {
    pub name: String,
    pub url: String,
}

/// ## Summary
/// GET /app/listings - Lists listings, active only unless `include_inactive`.
#[handler]
async fn list_listings(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let include_inactive = query_flag(req, "include_inactive")?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let listings = listing::list(&mut conn, include_inactive).await?;
    success("listings", &listings)
}

/// ## Summary
/// POST /app/listings - Creates a listing.
///
/// ## Errors
/// Returns HTTP 400 for a blank name or negative `hours_per_clean`.
#[handler]
async fn create_listing(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<Value>> {
    let body: CreateListingRequest = json_body(req).await?;
    let name = required("name", &body.name)?;
    let hours_per_clean = body
        .hours_per_clean
        .map(|hours| non_negative("hours_per_clean", hours))
        .transpose()?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let created = listing::insert(
        &mut conn,
        &NewListing {
            id: Uuid::now_v7(),
            name,
            external_id: body.external_id.as_deref(),
            color: body.color.as_deref(),
            bank_account: body.bank_account.as_deref(),
            hours_per_clean,
        },
    )
    .await?;

    tracing::info!(listing_id = %created.id, name = %created.name, "Listing created");
    res.status_code(StatusCode::CREATED);
    success("listing", &created)
}

#[handler]
async fn get_listing(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let id = path_uuid(req, "id")?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let found = listing::get(&mut conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("listing {id}")))?;
    success("listing", &found)
}

/// ## Summary
/// PATCH /app/listings/{id} - Edits a listing. Setting `is_active` to `false`
/// removes it from sync-all runs.
#[handler]
async fn update_listing(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let id = path_uuid(req, "id")?;
    let body: UpdateListingRequest = json_body(req).await?;
    let changes = body.into_changeset()?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let updated = listing::update(&mut conn, id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("listing {id}")))?;
    success("listing", &updated)
}

/// ## Summary
/// POST /app/listings/{id}/feeds - Creates a feed and attaches it to the
/// listing.
///
/// ## Errors
/// Returns HTTP 400 for a blank name or a URL that is not `http(s)` or
/// `webcal(s)`, HTTP 404 for an unknown listing.
#[handler]
async fn add_feed(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<Value>> {
    let listing_id = path_uuid(req, "id")?;
    let body: AddFeedRequest = json_body(req).await?;
    required("name", &body.name)?;
    normalize_url(&body.url).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let created = catalog::add_feed_to_listing(&mut conn, listing_id, body.name, body.url).await?;
    res.status_code(StatusCode::CREATED);
    success("feed", &created)
}

/// ## Summary
/// DELETE /app/listings/{id}/feeds/{feed_id} - Detaches a feed. The feed row
/// and events already derived from it are kept.
#[handler]
async fn detach_feed(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let listing_id = path_uuid(req, "id")?;
    let feed_id = path_uuid(req, "feed_id")?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    catalog::detach_feed(&mut conn, listing_id, feed_id).await?;
    success("detached", &feed_id)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("listings")
        .get(list_listings)
        .post(create_listing)
        .push(
            Router::with_path("{id}")
                .get(get_listing)
                .patch(update_listing)
                .push(
                    Router::with_path("feeds")
                        .post(add_feed)
                        .push(Router::with_path("{feed_id}").delete(detach_feed)),
                ),
        )
}
