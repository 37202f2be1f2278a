//! iCalendar (RFC 5545) feed parsing for booking calendars.

pub mod ical;
