use chrono::{DateTime, NaiveDate, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::enums::ReportStatus;
use crate::db::schema;

/// Weekly payment snapshot for one cleaner.
///
/// `cleaner_id` becomes `NULL` when the cleaner is deleted; `report_data`
/// keeps the denormalized copy.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::cleaner_payment_report)]
#[diesel(check_for_backend(Pg))]
pub struct CleanerPaymentReport {
    pub id: uuid::Uuid,
    pub cleaner_id: Option<uuid::Uuid>,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_hours: f64,
    pub total_amount: f64,
    pub report_data: serde_json::Value,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::cleaner_payment_report)]
pub struct NewCleanerPaymentReport {
    pub id: uuid::Uuid,
    pub cleaner_id: Option<uuid::Uuid>,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_hours: f64,
    pub total_amount: f64,
    pub report_data: serde_json::Value,
    pub status: ReportStatus,
}
