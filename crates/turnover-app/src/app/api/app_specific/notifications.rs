use salvo::prelude::Json;
use salvo::{Depot, Request, Router, handler};
use serde::Deserialize;
use serde_json::Value;
use turnover_db::db::query::notification;

use super::reply::{json_body, path_uuid, query_flag, query_uuid, success};
use crate::db_handler::get_db_from_depot;
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub is_read: bool,
}

#[handler]
async fn list_notifications(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let cleaner_id = query_uuid(req, "cleaner_id")?;
    let unread_only = query_flag(req, "unread_only")?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let notifications = notification::list(&mut conn, cleaner_id, unread_only).await?;
    success("notifications", &notifications)
}

#[handler]
async fn mark_read(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let id = path_uuid(req, "id")?;
    let body: MarkReadRequest = json_body(req).await?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let updated = notification::set_read(&mut conn, id, body.is_read)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("notification {id}")))?;
    success("notification", &updated)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("notifications")
        .get(list_notifications)
        .push(Router::with_path("{id}").patch(mark_read))
}
