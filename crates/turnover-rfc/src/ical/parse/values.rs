//! Value type parsers for iCalendar (RFC 5545 §3.3).

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::ical::core::ContentLine;

/// A DATE or DATE-TIME property value resolved to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedInstant {
    pub instant: DateTime<Utc>,
    /// Calendar date as written in the feed (local to its TZID, if any).
    pub local_date: NaiveDate,
    /// `true` for `VALUE=DATE` values.
    pub all_day: bool,
}

/// Parses a DATE value (RFC 5545 §3.3.4).
///
/// Format: YYYYMMDD (e.g., "19970714")
///
/// ## Errors
/// Returns an error if the string is not a valid calendar date.
pub fn parse_date(s: &str, line: usize, col: usize) -> ParseResult<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(ParseErrorKind::InvalidDate, line, col));
    }

    let year = digits(&s[0..4]);
    let month = digits(&s[4..6]);
    let day = digits(&s[6..8]);

    i32::try_from(year)
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, month, day))
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidDate, line, col))
}

/// Reads an all-ASCII-digit slice as a number.
fn digits(s: &str) -> u32 {
    s.bytes()
        .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

/// Parses a TIME value (RFC 5545 §3.3.12).
///
/// Format: HHMMSS[Z]. Returns the time and whether it is UTC.
///
/// ## Errors
/// Returns an error if the string is not a valid 6-digit time.
pub fn parse_time(s: &str, line: usize, col: usize) -> ParseResult<(NaiveTime, bool)> {
    let (time_str, is_utc) = match s.strip_suffix('Z') {
        Some(stripped) => (stripped, true),
        None => (s, false),
    };

    if time_str.len() != 6 || !time_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(ParseErrorKind::InvalidTime, line, col));
    }

    // Leap second 60 is clamped to 59.
    let second = digits(&time_str[4..6]).min(59);

    let time = NaiveTime::from_hms_opt(digits(&time_str[0..2]), digits(&time_str[2..4]), second)
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidTime, line, col))?;

    Ok((time, is_utc))
}

/// Parses a DATE-TIME value (RFC 5545 §3.3.5).
///
/// Format: YYYYMMDD"T"HHMMSS[Z]. Returns the local date-time and whether it is UTC.
///
/// ## Errors
/// Returns an error if the string is not a valid date-time.
pub fn parse_datetime(s: &str, line: usize, col: usize) -> ParseResult<(NaiveDateTime, bool)> {
    let Some((date_str, time_str)) = s.split_once('T') else {
        return Err(ParseError::new(ParseErrorKind::InvalidDateTime, line, col));
    };

    let date = parse_date(date_str, line, col)?;
    let (time, is_utc) = parse_time(time_str, line, col + date_str.len() + 1)?;

    Ok((date.and_time(time), is_utc))
}

/// ## Summary
/// Resolves a `DTSTART`/`DTEND` content line to a UTC instant.
///
/// DATE values resolve to midnight UTC of that date. DATE-TIME values honour a
/// trailing `Z`, then a `TZID` parameter; floating times and unknown zones are
/// read as UTC.
///
/// ## Errors
/// Returns an error if the value is neither a DATE nor a DATE-TIME.
pub fn resolve_instant(line: &ContentLine, line_num: usize) -> ParseResult<ResolvedInstant> {
    let value = line.raw_value.trim();
    let col = line.name.len() + 2;

    let is_date = line
        .param("VALUE")
        .is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
        || (value.len() == 8 && !value.contains('T'));

    if is_date {
        let date = parse_date(value, line_num, col)?;
        return Ok(ResolvedInstant {
            instant: date.and_time(NaiveTime::MIN).and_utc(),
            local_date: date,
            all_day: true,
        });
    }

    let (naive, is_utc) = parse_datetime(value, line_num, col)?;

    let instant = if is_utc {
        naive.and_utc()
    } else if let Some(tzid) = line.param("TZID") {
        match tzid.parse::<chrono_tz::Tz>() {
            Ok(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map_or_else(|| naive.and_utc(), |local| local.with_timezone(&Utc)),
            Err(_) => {
                tracing::warn!(tzid = %tzid, line = line_num, "Unknown TZID, reading time as UTC");
                naive.and_utc()
            }
        }
    } else {
        naive.and_utc()
    };

    Ok(ResolvedInstant {
        instant,
        local_date: naive.date(),
        all_day: false,
    })
}

/// Unescapes text values (RFC 5545 §3.3.11).
///
/// Escape sequences: \\ \, \; \n \N
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n' | 'N') => result.push('\n'),
                Some(',') => result.push(','),
                Some(';') => result.push(';'),
                Some('\\') | None => result.push('\\'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}
