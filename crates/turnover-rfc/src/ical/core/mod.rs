//! Core iCalendar types used by the feed parser.

mod booking;
mod content_line;

pub use booking::{Booking, FeedWindow};
pub use content_line::{ContentLine, Parameter};
