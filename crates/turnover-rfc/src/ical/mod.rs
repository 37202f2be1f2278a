//! iCalendar support limited to what booking feeds need: content lines,
//! `VEVENT` components, and DATE / DATE-TIME values.

pub mod core;
pub mod parse;

pub use self::core::{Booking, ContentLine, FeedWindow, Parameter};
pub use parse::parse_bookings;
