use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::schema;

/// Link between a cleaner and an event, carrying hours worked.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::cleaner_assignment)]
#[diesel(check_for_backend(Pg))]
pub struct CleanerAssignment {
    pub id: uuid::Uuid,
    pub event_id: uuid::Uuid,
    pub cleaner_id: uuid::Uuid,
    pub hours: f64,
    pub is_active: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::cleaner_assignment)]
pub struct NewCleanerAssignment {
    pub id: uuid::Uuid,
    pub event_id: uuid::Uuid,
    pub cleaner_id: uuid::Uuid,
    pub hours: f64,
}
