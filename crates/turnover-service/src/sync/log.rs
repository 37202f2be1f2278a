//! Typed details of sync log entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use turnover_db::db::enums::{CheckoutType, EventRole};
use turnover_db::model::sync::NewSyncLogEntry;
use uuid::Uuid;

use crate::reconcile::DeactivationSkip;

/// The `details` column of a sync log entry, one variant per operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncLogDetails {
    Added {
        external_id: String,
        role: EventRole,
        event_date: NaiveDate,
        checkout_type: CheckoutType,
    },
    Updated {
        external_id: String,
        role: EventRole,
        version: i32,
        previous_start: DateTime<Utc>,
        previous_end: DateTime<Utc>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    },
    Replaced {
        external_id: String,
        role: EventRole,
        version: i32,
        fingerprint_changed: bool,
        assignment_restored: bool,
    },
    Unchanged {
        external_id: String,
        role: EventRole,
        checkout_type: CheckoutType,
    },
    Deactivated {
        external_id: String,
        role: EventRole,
        version: i32,
        assignment_released: bool,
    },
    DeactivationSkipped {
        reason: DeactivationSkip,
        stored_active: usize,
    },
    FeedFetched {
        url: String,
        bookings: usize,
    },
    FeedFailed {
        url: String,
        error: String,
    },
    ListingSkipped {
        reason: String,
    },
    ListingFailed {
        error: String,
    },
}

impl SyncLogDetails {
    /// Value of the entry's `operation` column.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Added { .. } => "added",
            Self::Updated { .. } => "updated",
            Self::Replaced { .. } => "replaced",
            Self::Unchanged { .. } => "unchanged",
            Self::Deactivated { .. } => "deactivated",
            Self::DeactivationSkipped { .. } => "deactivation_skipped",
            Self::FeedFetched { .. } => "feed_fetched",
            Self::FeedFailed { .. } => "feed_failed",
            Self::ListingSkipped { .. } => "listing_skipped",
            Self::ListingFailed { .. } => "listing_failed",
        }
    }

    /// Builds the row to insert for this entry.
    #[must_use]
    pub fn into_entry(self, session_id: Uuid, scope: LogScope) -> NewSyncLogEntry {
        NewSyncLogEntry {
            id: Uuid::now_v7(),
            session_id,
            listing_id: scope.listing_id,
            feed_id: scope.feed_id,
            event_id: scope.event_id,
            operation: self.operation().to_string(),
            details: serde_json::to_value(&self).unwrap_or_default(),
        }
    }
}

/// Rows a log entry refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogScope {
    pub listing_id: Option<Uuid>,
    pub feed_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
}

impl LogScope {
    #[must_use]
    pub const fn listing(listing_id: Uuid) -> Self {
        Self {
            listing_id: Some(listing_id),
            feed_id: None,
            event_id: None,
        }
    }

    #[must_use]
    pub const fn feed(listing_id: Uuid, feed_id: Uuid) -> Self {
        Self {
            listing_id: Some(listing_id),
            feed_id: Some(feed_id),
            event_id: None,
        }
    }

    #[must_use]
    pub const fn event(listing_id: Uuid, feed_id: Option<Uuid>, event_id: Uuid) -> Self {
        Self {
            listing_id: Some(listing_id),
            feed_id,
            event_id: Some(event_id),
        }
    }
}
