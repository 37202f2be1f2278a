//! Query composition and persistence functions, one module per table family.

pub mod assignment;
pub mod cleaner;
pub mod event;
pub mod extra_hours;
pub mod feed;
pub mod listing;
pub mod notification;
pub mod payment_report;
pub mod sync;
