use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::schema;

/// A managed rental property.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::listing)]
#[diesel(check_for_backend(Pg))]
pub struct Listing {
    pub id: uuid::Uuid,
    pub name: String,
    pub external_id: Option<String>,
    pub color: Option<String>,
    pub bank_account: Option<String>,
    pub hours_per_clean: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::listing)]
pub struct NewListing<'a> {
    pub id: uuid::Uuid,
    pub name: &'a str,
    pub external_id: Option<&'a str>,
    pub color: Option<&'a str>,
    pub bank_account: Option<&'a str>,
    pub hours_per_clean: Option<f64>,
}

/// Partial update of a listing. `None` leaves a column untouched; the inner
/// `Option` of nullable columns clears them.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::listing)]
pub struct ListingChangeset {
    pub name: Option<String>,
    pub external_id: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub bank_account: Option<Option<String>>,
    pub hours_per_clean: Option<Option<f64>>,
    pub is_active: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}
