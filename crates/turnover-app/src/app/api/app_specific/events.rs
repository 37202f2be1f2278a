use chrono::Utc;
use salvo::http::StatusCode;
use salvo::prelude::Json;
use salvo::{Depot, Request, Response, Router, handler};
use serde::Deserialize;
use serde_json::Value;
use turnover_core::config::parse_clock_time;
use turnover_db::db::enums::EventRole;
use turnover_db::db::query::event::{self, EventFilter};
use turnover_service::assignment::{self, AssignRequest};
use turnover_service::error::ServiceError;
use uuid::Uuid;

use super::reply::{json_body, non_negative, path_uuid, query_date, query_flag, query_uuid, success};
use crate::config::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct CheckoutTimeRequest {
    pub checkout_time: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignCleanerRequest {
    pub cleaner_id: Uuid,
    pub hours: Option<f64>,
}

fn event_filter(req: &Request) -> AppResult<EventFilter> {
    let filter = EventFilter {
        listing_id: query_uuid(req, "listing_id")?,
        from: query_date(req, "from")?,
        to: query_date(req, "to")?,
        include_inactive: query_flag(req, "include_inactive")?,
    };
    if filter.from.zip(filter.to).is_some_and(|(from, to)| from > to) {
        return Err(AppError::BadRequest("from must not be after to".to_string()));
    }
    Ok(filter)
}

/// ## Summary
/// GET /app/events - Lists events by listing and inclusive date range.
#[handler]
async fn list_events(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let filter = event_filter(req)?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let events = event::list(&mut conn, &filter).await?;
    success("events", &events)
}

/// ## Summary
/// GET /app/events/{id}/versions - Archived versions of an event, oldest first.
#[handler]
async fn list_versions(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let id = path_uuid(req, "id")?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    if event::get(&mut conn, id).await?.is_none() {
        return Err(AppError::NotFound(format!("event {id}")));
    }
    let versions = event::versions(&mut conn, id).await?;
    success("versions", &versions)
}

/// ## Summary
/// PATCH /app/events/{id}/checkout-time - Overrides the checkout time of a
/// check-out event. Later syncs keep the override.
///
/// ## Errors
/// Returns HTTP 400 for a time that is not `HH:MM`, HTTP 409 for a check-in
/// event.
#[handler]
async fn set_checkout_time(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let id = path_uuid(req, "id")?;
    let body: CheckoutTimeRequest = json_body(req).await?;
    let checkout_time = parse_clock_time(&body.checkout_time)
        .ok_or_else(|| AppError::BadRequest("checkout_time must be HH:MM".to_string()))?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let current = event::get(&mut conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("event {id}")))?;
    if current.role != EventRole::CheckOut {
        return Err(ServiceError::Conflict(format!("event {id} is not a check-out")).into());
    }

    let updated = event::set_checkout_time(&mut conn, id, checkout_time, Utc::now())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("event {id}")))?;
    tracing::info!(event_id = %id, %checkout_time, "Checkout time set");
    success("event", &updated)
}

/// ## Summary
/// POST /app/events/{id}/assignment - Assigns a cleaner, replacing any active
/// assignment. Without `hours`, the listing's hours per clean apply, then the
/// configured default.
#[handler]
async fn assign_cleaner(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<Value>> {
    let event_id = path_uuid(req, "id")?;
    let body: AssignCleanerRequest = json_body(req).await?;
    let hours = body
        .hours
        .map(|hours| non_negative("hours", hours))
        .transpose()?;
    let config = get_config_from_depot(depot)?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let created = assignment::assign(
        &mut conn,
        AssignRequest {
            event_id,
            cleaner_id: body.cleaner_id,
            hours,
            default_hours: config.payments.default_hours_per_clean,
        },
    )
    .await?;
    res.status_code(StatusCode::CREATED);
    success("assignment", &created)
}

#[handler]
async fn unassign_cleaner(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let event_id = path_uuid(req, "id")?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let released = assignment::unassign(&mut conn, event_id).await?;
    success("assignment", &released)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("events").get(list_events).push(
        Router::with_path("{id}")
            .push(Router::with_path("versions").get(list_versions))
            .push(Router::with_path("checkout-time").patch(set_checkout_time))
            .push(
                Router::with_path("assignment")
                    .post(assign_cleaner)
                    .delete(unassign_cleaner),
            ),
    )
}
