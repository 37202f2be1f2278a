//! Shared configuration, errors, and calendar/money helpers for the turnover
//! property-management backend.

pub mod config;
pub mod constants;
pub mod error;
pub mod util;
