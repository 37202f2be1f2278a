use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::enums::CleanerRole;
use crate::db::schema;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::cleaner)]
#[diesel(check_for_backend(Pg))]
pub struct Cleaner {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: CleanerRole,
    pub hourly_rate: f64,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::cleaner)]
pub struct NewCleaner<'a> {
    pub id: uuid::Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub role: CleanerRole,
    pub hourly_rate: f64,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::cleaner)]
pub struct CleanerChangeset {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub role: Option<CleanerRole>,
    pub hourly_rate: Option<f64>,
    pub password_hash: Option<Option<String>>,
    pub updated_at: Option<DateTime<Utc>>,
}
