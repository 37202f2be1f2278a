use chrono::{DateTime, NaiveDate, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::schema;

/// Hours a cleaner worked outside of an assigned checkout.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::extra_hours_report)]
#[diesel(check_for_backend(Pg))]
pub struct ExtraHoursReport {
    pub id: uuid::Uuid,
    pub cleaner_id: uuid::Uuid,
    pub listing_id: Option<uuid::Uuid>,
    pub work_date: NaiveDate,
    pub hours: f64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::extra_hours_report)]
pub struct NewExtraHoursReport<'a> {
    pub id: uuid::Uuid,
    pub cleaner_id: uuid::Uuid,
    pub listing_id: Option<uuid::Uuid>,
    pub work_date: NaiveDate,
    pub hours: f64,
    pub description: &'a str,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::extra_hours_report)]
pub struct ExtraHoursChangeset {
    pub listing_id: Option<Option<uuid::Uuid>>,
    pub work_date: Option<NaiveDate>,
    pub hours: Option<f64>,
    pub description: Option<String>,
}
