use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::schema;

/// An external iCal calendar that supplies bookings.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::ical_feed)]
#[diesel(check_for_backend(Pg))]
pub struct IcalFeed {
    pub id: uuid::Uuid,
    pub name: String,
    pub url: String,
    pub is_active: bool,
    pub last_synced: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::ical_feed)]
pub struct NewIcalFeed<'a> {
    pub id: uuid::Uuid,
    pub name: &'a str,
    pub url: &'a str,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::ical_feed)]
pub struct IcalFeedChangeset {
    pub name: Option<String>,
    pub url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = schema::listing_feed)]
#[diesel(check_for_backend(Pg))]
pub struct ListingFeed {
    pub listing_id: uuid::Uuid,
    pub feed_id: uuid::Uuid,
}
