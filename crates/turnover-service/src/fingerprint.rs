//! Change detection for derived events.

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// Outcome of comparing a freshly derived event against its stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No stored row for the key.
    New,
    Unchanged,
    Changed,
}

/// ## Summary
/// Hex SHA-256 over the mutable fields of an event.
///
/// Fields are joined with `|`; timestamps are RFC 3339 in UTC and a missing
/// guest contributes an empty string.
#[must_use]
pub fn fingerprint(
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    title: &str,
    guest_name: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(start_time.to_rfc3339_opts(SecondsFormat::Secs, true).as_bytes());
    hasher.update(b"|");
    hasher.update(end_time.to_rfc3339_opts(SecondsFormat::Secs, true).as_bytes());
    hasher.update(b"|");
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(guest_name.unwrap_or_default().as_bytes());
    hex::encode(hasher.finalize())
}

/// ## Summary
/// Classifies a fresh fingerprint against the stored one for the same key.
#[must_use]
pub fn classify(stored: Option<&str>, fresh: &str) -> Classification {
    match stored {
        None => Classification::New,
        Some(stored) if stored == fresh => Classification::Unchanged,
        Some(_) => Classification::Changed,
    }
}
