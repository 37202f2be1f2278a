use chrono::NaiveDate;
use salvo::http::StatusCode;
use salvo::prelude::Json;
use salvo::{Depot, Request, Response, Router, handler};
use serde::Deserialize;
use serde_json::Value;
use turnover_db::db::enums::ReportStatus;
use turnover_db::db::query::payment_report::{self, ReportFilter};
use turnover_service::payment;
use uuid::Uuid;

use super::reply::{json_body, path_uuid, query_date, query_uuid, success};
use crate::config::get_config_from_depot;
use crate::db_handler::get_db_from_depot;
use crate::error::AppResult;

/// ## Summary
/// Generate report request payload. Any day of the wanted week may be given.
#[derive(Debug, Deserialize)]
pub struct GenerateReportRequest {
    pub cleaner_id: Uuid,
    pub reference_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ReportStatus,
}

/// ## Summary
/// POST /app/payment-reports/generate - Generates the cleaner's report for
/// the Monday-to-Sunday week containing `reference_date`, replacing any
/// report already stored for that week.
#[handler]
async fn generate_report(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<Value>> {
    let body: GenerateReportRequest = json_body(req).await?;
    payment::report_week(body.reference_date)?;
    let config = get_config_from_depot(depot)?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let report = payment::generate_report(
        &mut conn,
        body.cleaner_id,
        body.reference_date,
        config.payments.regenerate_status,
    )
    .await?;
    res.status_code(StatusCode::CREATED);
    success("report", &report)
}

#[handler]
async fn list_reports(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let filter = ReportFilter {
        cleaner_id: query_uuid(req, "cleaner_id")?,
        week_start: query_date(req, "week_start")?,
    };

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let reports = payment_report::list(&mut conn, filter).await?;
    success("reports", &reports)
}

/// ## Summary
/// PATCH /app/payment-reports/{id}/status - Moves a report along
/// `pending -> approved -> paid`, or to `rejected`.
///
/// ## Errors
/// Returns HTTP 409 for a transition the current status does not allow.
#[handler]
async fn update_status(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Value>> {
    let id = path_uuid(req, "id")?;
    let body: UpdateStatusRequest = json_body(req).await?;

    let db = get_db_from_depot(depot)?;
    let mut conn = db.get_connection().await?;
    let updated = payment::update_status(&mut conn, id, body.status).await?;
    success("report", &updated)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("payment-reports")
        .get(list_reports)
        .push(Router::with_path("generate").post(generate_report))
        .push(Router::with_path("{id}/status").patch(update_status))
}
