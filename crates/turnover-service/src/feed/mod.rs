//! Fetching booking feeds.
//!
//! The network sits behind [`FeedSource`] so reconciliation can run against
//! [`MemoryFeedSource`] in tests.

use std::future::Future;
use std::pin::Pin;

use chrono::{Days, NaiveDate};
use thiserror::Error;
use turnover_core::config::SyncConfig;
use turnover_rfc::ical::parse::error::ParseError;
use turnover_rfc::ical::{Booking, FeedWindow, parse_bookings};

mod http;
mod memory;

pub use http::HttpFeedSource;
pub use memory::MemoryFeedSource;

/// Failure to obtain bookings from one feed.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Unsupported feed URL: {0}")]
    InvalidUrl(String),

    #[error("Feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed returned HTTP {status}")]
    Status { status: u16 },

    #[error("Feed is not a valid calendar: {0}")]
    Parse(#[from] ParseError),

    #[error("Feed unavailable: {0}")]
    Unavailable(String),
}

pub type FeedResult<T> = std::result::Result<T, FeedError>;

/// Where calendar bodies come from.
pub trait FeedSource: Send + Sync {
    /// Returns the raw iCalendar body served at `url`.
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = FeedResult<String>> + Send + 'a>>;
}

/// ## Summary
/// Date window of bookings kept by a sync running on `today`:
/// `[today - lookback_days, today + lookahead_days]`.
#[must_use]
pub fn fetch_window(today: NaiveDate, config: &SyncConfig) -> FeedWindow {
    FeedWindow {
        start: today
            .checked_sub_days(Days::new(u64::from(config.lookback_days)))
            .unwrap_or(NaiveDate::MIN),
        end: today
            .checked_add_days(Days::new(u64::from(config.lookahead_days)))
            .unwrap_or(NaiveDate::MAX),
    }
}

/// ## Summary
/// Rewrites `webcal://` and `webcals://` to `https://` and rejects anything
/// that is not HTTP(S).
///
/// ## Errors
/// Returns `FeedError::InvalidUrl` for other schemes.
pub fn normalize_url(url: &str) -> FeedResult<String> {
    let trimmed = url.trim();
    let lower = trimmed.to_ascii_lowercase();

    for scheme in ["webcals://", "webcal://"] {
        if lower.starts_with(scheme) {
            return Ok(format!("https://{}", &trimmed[scheme.len()..]));
        }
    }

    if lower.starts_with("https://") || lower.starts_with("http://") {
        return Ok(trimmed.to_string());
    }

    Err(FeedError::InvalidUrl(trimmed.to_string()))
}

/// ## Summary
/// Fetches one feed and parses the bookings that touch `window`.
///
/// ## Errors
/// Returns an error if the fetch fails or the body is not a calendar.
#[tracing::instrument(skip(source))]
pub async fn fetch_bookings(
    source: &dyn FeedSource,
    url: &str,
    window: &FeedWindow,
) -> FeedResult<Vec<Booking>> {
    let body = source.fetch(url).await?;
    let bookings = parse_bookings(&body, Some(window))?;
    tracing::debug!(bookings = bookings.len(), "Feed parsed");
    Ok(bookings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync_config() -> SyncConfig {
        SyncConfig {
            batch_size: 5,
            interval_secs: 0,
            lookback_days: 30,
            lookahead_days: 365,
            fetch_timeout_secs: 5,
            user_agent: "test".to_string(),
            default_checkout_time: "11:00".to_string(),
        }
    }

    #[test]
    fn test_fetch_window() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let window = fetch_window(today, &sync_config());
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2024, 5, 16).unwrap());
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("webcal://example.com/cal.ics").unwrap(),
            "https://example.com/cal.ics"
        );
        assert_eq!(
            normalize_url(" WEBCALS://example.com/a.ics ").unwrap(),
            "https://example.com/a.ics"
        );
        assert_eq!(
            normalize_url("https://www.airbnb.com/calendar/ical/1.ics?s=x").unwrap(),
            "https://www.airbnb.com/calendar/ical/1.ics?s=x"
        );
        assert!(matches!(
            normalize_url("ftp://example.com/cal.ics"),
            Err(FeedError::InvalidUrl(_))
        ));
        assert!(normalize_url("not a url").is_err());
    }

    #[test_log::test(tokio::test)]
    async fn test_fetch_bookings_parses_and_filters() {
        let source = MemoryFeedSource::new().with_body(
            "https://feeds.test/a.ics",
            "BEGIN:VCALENDAR\r\n\
             BEGIN:VEVENT\r\nUID:old\r\nDTSTART;VALUE=DATE:20200101\r\nDTEND;VALUE=DATE:20200103\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:current\r\nDTSTART;VALUE=DATE:20240603\r\nDTEND;VALUE=DATE:20240605\r\nEND:VEVENT\r\n\
             END:VCALENDAR\r\n",
        );
        let window = FeedWindow {
            start: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        };

        let bookings = fetch_bookings(&source, "https://feeds.test/a.ics", &window)
            .await
            .unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].uid, "current");
    }

    #[test_log::test(tokio::test)]
    async fn test_fetch_bookings_reports_parse_failure() {
        let source = MemoryFeedSource::new().with_body("https://feeds.test/a.ics", "<html></html>");
        let window = FeedWindow {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        };

        let err = fetch_bookings(&source, "https://feeds.test/a.ics", &window)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
    }
}
