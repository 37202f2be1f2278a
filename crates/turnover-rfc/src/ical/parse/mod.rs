//! Booking feed parser.
//!
//! Walks the content lines of a `VCALENDAR` and turns every usable `VEVENT`
//! into a [`Booking`]. Malformed content lines and incomplete events are
//! skipped with a warning; structural errors (no calendar, unbalanced
//! `BEGIN`/`END`) fail the whole feed.

pub mod error;
pub mod lexer;
pub mod values;

use chrono::Days;

use self::error::{ParseError, ParseErrorKind, ParseResult};
use self::lexer::{parse_content_line, split_lines};
use self::values::{resolve_instant, unescape_text};
use crate::ical::core::{Booking, ContentLine, FeedWindow};
use turnover_core::constants::DEFAULT_BOOKING_TITLE;

/// ## Summary
/// Parses an iCalendar feed into bookings, keeping only those overlapping `window`.
///
/// ## Errors
/// Returns an error if the input is not a `VCALENDAR` or its components are
/// not properly nested.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse_bookings(input: &str, window: Option<&FeedWindow>) -> ParseResult<Vec<Booking>> {
    let lines = split_lines(input.trim_start_matches('\u{feff}'));

    let Some((first_line, first)) = lines.first() else {
        return Err(ParseError::new(ParseErrorKind::MissingBegin, 1, 1).with_context("empty feed"));
    };
    if !first.trim().eq_ignore_ascii_case("BEGIN:VCALENDAR") {
        return Err(ParseError::new(ParseErrorKind::MissingBegin, *first_line, 1)
            .with_context("expected BEGIN:VCALENDAR"));
    }

    let mut stack: Vec<String> = Vec::new();
    let mut current: Option<Vec<(usize, ContentLine)>> = None;
    let mut bookings = Vec::new();
    let mut last_line = 1;

    for (line_num, raw) in lines {
        last_line = line_num;
        let content_line = match parse_content_line(&raw, line_num) {
            Ok(cl) => cl,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed content line");
                continue;
            }
        };

        match content_line.name.as_str() {
            "BEGIN" => {
                let component = content_line.raw_value.trim().to_ascii_uppercase();
                // Only top-level VEVENTs are bookings; VALARMs and the like nest deeper.
                if component == "VEVENT" && stack.len() == 1 {
                    current = Some(Vec::new());
                }
                stack.push(component);
            }
            "END" => {
                let component = content_line.raw_value.trim().to_ascii_uppercase();
                match stack.pop() {
                    Some(open) if open == component => {}
                    Some(open) => {
                        return Err(ParseError::new(
                            ParseErrorKind::MismatchedComponent,
                            line_num,
                            1,
                        )
                        .with_context(format!("expected END:{open}, got END:{component}")));
                    }
                    None => {
                        return Err(ParseError::new(
                            ParseErrorKind::MismatchedComponent,
                            line_num,
                            1,
                        )
                        .with_context(format!("END:{component} without BEGIN")));
                    }
                }
                if component == "VEVENT"
                    && stack.len() == 1
                    && let Some(props) = current.take()
                {
                    match booking_from_properties(&props, line_num) {
                        Ok(Some(booking)) => {
                            if window.is_none_or(|w| w.overlaps(booking.start_date, booking.end_date)) {
                                bookings.push(booking);
                            }
                        }
                        Ok(None) => {}
                        Err(e) => tracing::warn!(error = %e, "Skipping VEVENT with invalid dates"),
                    }
                }
            }
            _ => {
                if stack.len() == 2
                    && let Some(props) = current.as_mut()
                {
                    props.push((line_num, content_line));
                }
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::new(ParseErrorKind::MissingEnd, last_line, 1)
            .with_context(format!("missing END:{open}")));
    }

    tracing::debug!(count = bookings.len(), "Parsed bookings from feed");

    Ok(bookings)
}

/// Builds a booking from the properties of one `VEVENT`.
///
/// Returns `Ok(None)` for cancelled events and events lacking `UID` or `DTSTART`.
fn booking_from_properties(
    props: &[(usize, ContentLine)],
    end_line: usize,
) -> ParseResult<Option<Booking>> {
    let find = |name: &str| props.iter().find(|(_, p)| p.name == name);

    if find("STATUS").is_some_and(|(_, p)| p.raw_value.trim().eq_ignore_ascii_case("CANCELLED")) {
        return Ok(None);
    }

    let Some((_, uid)) = find("UID") else {
        tracing::warn!(line = end_line, "Skipping VEVENT without UID");
        return Ok(None);
    };
    let uid = uid.raw_value.trim();
    if uid.is_empty() {
        tracing::warn!(line = end_line, "Skipping VEVENT with empty UID");
        return Ok(None);
    }

    let Some((start_line, dtstart)) = find("DTSTART") else {
        tracing::warn!(uid = %uid, "Skipping VEVENT without DTSTART");
        return Ok(None);
    };
    let start = resolve_instant(dtstart, *start_line)?;

    let end = match find("DTEND") {
        Some((end_line, dtend)) => resolve_instant(dtend, *end_line)?,
        None if start.all_day => {
            let next = start.local_date + Days::new(1);
            values::ResolvedInstant {
                instant: start.instant + chrono::Duration::days(1),
                local_date: next,
                all_day: true,
            }
        }
        None => start,
    };

    let title = find("SUMMARY")
        .map(|(_, p)| unescape_text(p.raw_value.trim()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_BOOKING_TITLE.to_string());

    let guest_name = find("X-GUEST-NAME")
        .map(|(_, p)| unescape_text(p.raw_value.trim()))
        .or_else(|| {
            find("ATTENDEE")
                .and_then(|(_, p)| p.param("CN"))
                .map(str::to_string)
        })
        .filter(|g| !g.is_empty());

    Ok(Some(Booking {
        uid: uid.to_string(),
        title,
        guest_name,
        start: start.instant,
        end: end.instant,
        start_date: start.local_date,
        end_date: end.local_date,
    }))
}
