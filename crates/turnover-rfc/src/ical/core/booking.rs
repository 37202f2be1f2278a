use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// One reservation read from a booking feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    /// The feed's `UID`, stable across fetches of the same reservation.
    pub uid: String,
    pub title: String,
    pub guest_name: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Check-in date in the feed's own calendar (before UTC conversion).
    pub start_date: NaiveDate,
    /// Check-out date in the feed's own calendar (before UTC conversion).
    pub end_date: NaiveDate,
}

/// Inclusive date range of bookings kept from a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FeedWindow {
    /// ## Summary
    /// Returns whether a booking spanning `start_date..=end_date` touches the window.
    #[must_use]
    pub fn overlaps(&self, start_date: NaiveDate, end_date: NaiveDate) -> bool {
        end_date >= self.start && start_date <= self.end
    }
}
