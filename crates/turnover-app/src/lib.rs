//! HTTP surface of the turnover backend.

pub mod app;
pub mod config;
pub mod db_handler;
pub mod error;
pub mod sync_handler;
