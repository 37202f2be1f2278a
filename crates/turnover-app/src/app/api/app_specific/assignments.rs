use salvo::prelude::Json;
use salvo::{Depot, Request, Router, handler};
use serde::Deserialize;
use serde_json::Value;
use turnover_service::assignment;

use super::reply::{non_negative, optional_json_body, path_uuid, success};
use crate::db_handler::get_db_from_depot;
use crate::error::AppResult;

#[derive(Debug, Default, Deserialize)]
pub struct CompleteJobRequest {
    pub hours: Option<f64>,
}

/// ## Summary
/// POST /app/assignments/{id}/start - Starts the job timer.
#[handler]
async fn start_job(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let id = path_uuid(req, "id")?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let started = assignment::start_job(&mut conn, id).await?;
    success("assignment", &started)
}

/// ## Summary
/// POST /app/assignments/{id}/complete - Completes the job, recording either
/// the given `hours` or the time elapsed since the job was started.
///
/// ## Errors
/// Returns HTTP 409 if no hours were given and the job was never started.
#[handler]
async fn complete_job(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let id = path_uuid(req, "id")?;
    let body: CompleteJobRequest = optional_json_body(req).await?;
    let hours = body
        .hours
        .map(|hours| non_negative("hours", hours))
        .transpose()?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let completed = assignment::complete_job(&mut conn, id, hours).await?;
    success("assignment", &completed)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("assignments/{id}")
        .push(Router::with_path("start").post(start_job))
        .push(Router::with_path("complete").post(complete_job))
}
