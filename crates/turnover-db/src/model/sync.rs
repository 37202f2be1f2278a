use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::enums::{SyncScope, SyncStatus};
use crate::db::schema;

/// One execution of the reconciliation process.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::sync_session)]
#[diesel(check_for_backend(Pg))]
pub struct SyncSession {
    pub id: uuid::Uuid,
    pub scope: SyncScope,
    pub listing_id: Option<uuid::Uuid>,
    pub status: SyncStatus,
    pub added: i32,
    pub updated: i32,
    pub deactivated: i32,
    pub replaced: i32,
    pub unchanged: i32,
    pub errors: i32,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::sync_session)]
pub struct NewSyncSession {
    pub id: uuid::Uuid,
    pub scope: SyncScope,
    pub listing_id: Option<uuid::Uuid>,
    pub status: SyncStatus,
}

/// Counter increments applied to a running session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncCounters {
    pub added: i32,
    pub updated: i32,
    pub deactivated: i32,
    pub replaced: i32,
    pub unchanged: i32,
    pub errors: i32,
}

impl SyncCounters {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.added == 0
            && self.updated == 0
            && self.deactivated == 0
            && self.replaced == 0
            && self.unchanged == 0
            && self.errors == 0
    }
}

impl std::ops::AddAssign for SyncCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.added += rhs.added;
        self.updated += rhs.updated;
        self.deactivated += rhs.deactivated;
        self.replaced += rhs.replaced;
        self.unchanged += rhs.unchanged;
        self.errors += rhs.errors;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = schema::sync_log_entry)]
#[diesel(check_for_backend(Pg))]
pub struct SyncLogEntry {
    pub id: uuid::Uuid,
    pub session_id: uuid::Uuid,
    pub listing_id: Option<uuid::Uuid>,
    pub feed_id: Option<uuid::Uuid>,
    pub event_id: Option<uuid::Uuid>,
    pub operation: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::sync_log_entry)]
pub struct NewSyncLogEntry {
    pub id: uuid::Uuid,
    pub session_id: uuid::Uuid,
    pub listing_id: Option<uuid::Uuid>,
    pub feed_id: Option<uuid::Uuid>,
    pub event_id: Option<uuid::Uuid>,
    pub operation: String,
    pub details: serde_json::Value,
}
