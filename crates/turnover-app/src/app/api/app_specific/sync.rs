use salvo::prelude::Json;
use salvo::{Depot, Request, Router, handler};
use serde_json::Value;
use turnover_db::db::query::sync;

use super::reply::{path_uuid, success};
use crate::db_handler::get_db_from_depot;
use crate::error::{AppError, AppResult};
use crate::sync_handler::get_sync_engine_from_depot;

const DEFAULT_SESSION_LIMIT: i64 = 20;
const MAX_SESSION_LIMIT: i64 = 200;

fn session_limit(raw: Option<&str>) -> AppResult<i64> {
    let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
        return Ok(DEFAULT_SESSION_LIMIT);
    };
    match raw.parse::<i64>() {
        Ok(limit) if (1..=MAX_SESSION_LIMIT).contains(&limit) => Ok(limit),
        _ => Err(AppError::BadRequest(format!(
            "limit must be between 1 and {MAX_SESSION_LIMIT}"
        ))),
    }
}

/// ## Summary
/// POST /app/sync - Syncs every active listing and returns the finished
/// session with its counters.
#[handler]
async fn sync_all(depot: &mut Depot) -> AppResult<Json<Value>> {
    let engine = get_sync_engine_from_depot(depot)?;
    let db = get_db_from_depot(depot)?;

    let session = engine.sync_all(db.as_ref()).await?;
    success("session", &session)
}

/// ## Summary
/// POST /app/sync/listings/{id} - Syncs one listing.
///
/// ## Errors
/// Returns HTTP 404 for an unknown listing and HTTP 409 for an inactive one.
/// A failed run still returns its session, with `status` `failed`.
#[handler]
async fn sync_listing(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let listing_id = path_uuid(req, "id")?;
    let engine = get_sync_engine_from_depot(depot)?;
    let db = get_db_from_depot(depot)?;

    let session = engine.sync_listing(db.as_ref(), listing_id).await?;
    success("session", &session)
}

#[handler]
async fn list_sessions(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let limit = session_limit(req.query::<String>("limit").as_deref())?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let sessions = sync::recent_sessions(&mut conn, limit).await?;
    success("sessions", &sessions)
}

#[handler]
async fn list_entries(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let session_id = path_uuid(req, "id")?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    if sync::get_session(&mut conn, session_id).await?.is_none() {
        return Err(AppError::NotFound(format!("sync session {session_id}")));
    }
    let entries = sync::entries_for_session(&mut conn, session_id).await?;
    success("entries", &entries)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("sync")
        .post(sync_all)
        .push(Router::with_path("listings/{id}").post(sync_listing))
        .push(
            Router::with_path("sessions")
                .get(list_sessions)
                .push(Router::with_path("{id}/entries").get(list_entries)),
        )
}
