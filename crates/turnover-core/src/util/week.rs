//! Monday-to-Sunday pay weeks.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

/// An inclusive Monday..=Sunday week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WeekRange {
    pub monday: NaiveDate,
    pub sunday: NaiveDate,
}

impl WeekRange {
    /// ## Summary
    /// Returns the week containing `day`.
    ///
    /// A Sunday belongs to the week that started six days earlier; any other day
    /// belongs to the week starting `weekday - 1` days earlier. Both bounds are
    /// whole days, so a Sunday check-out at any time of day is inside.
    ///
    /// Returns `None` when the week runs past the calendar's representable range.
    #[must_use]
    pub fn containing(day: NaiveDate) -> Option<Self> {
        let back = if day.weekday() == Weekday::Sun {
            6
        } else {
            u64::from(day.weekday().number_from_monday() - 1)
        };
        let monday = day.checked_sub_days(Days::new(back))?;
        let sunday = monday.checked_add_days(Days::new(6))?;
        Some(Self { monday, sunday })
    }

    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.monday && day <= self.sunday
    }
}
