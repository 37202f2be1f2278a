use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::enums::NotificationKind;
use crate::db::schema;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::notification)]
#[diesel(check_for_backend(Pg))]
pub struct Notification {
    pub id: uuid::Uuid,
    pub cleaner_id: Option<uuid::Uuid>,
    pub event_id: Option<uuid::Uuid>,
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::notification)]
pub struct NewNotification {
    pub id: uuid::Uuid,
    pub cleaner_id: Option<uuid::Uuid>,
    pub event_id: Option<uuid::Uuid>,
    pub kind: NotificationKind,
    pub message: String,
}
