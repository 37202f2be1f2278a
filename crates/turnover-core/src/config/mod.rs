use anyhow::Result;
use chrono::NaiveTime;
use config::Config;
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub sync: SyncConfig,
    pub payments: PaymentsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Listings synced concurrently within one sync-all run.
    pub batch_size: usize,
    /// Seconds between scheduled sync-all runs; `0` disables the scheduler.
    pub interval_secs: u64,
    pub lookback_days: u32,
    pub lookahead_days: u32,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    /// Checkout time given to new check-out events, `HH:MM`.
    pub default_checkout_time: String,
}

impl SyncConfig {
    /// ## Summary
    /// Parses the configured default checkout time.
    ///
    /// ## Errors
    /// Returns `CoreError::ConfigError` if the value is not `HH:MM` or `HH:MM:SS`.
    pub fn default_checkout_time(&self) -> CoreResult<NaiveTime> {
        parse_clock_time(&self.default_checkout_time).ok_or_else(|| {
            CoreError::ConfigError(format!(
                "sync.default_checkout_time is not a valid time: {}",
                self.default_checkout_time
            ))
        })
    }
}

/// What happens to an existing report's status when the report is regenerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegenerateStatus {
    /// The fresh snapshot starts over as `pending`.
    Reset,
    /// The fresh snapshot keeps the status of the row it replaces.
    Preserve,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentsConfig {
    pub default_hours_per_clean: f64,
    pub regenerate_status: RegenerateStatus,
}

/// ## Summary
/// Parses `HH:MM` or `HH:MM:SS`.
#[must_use]
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

impl Settings {
    /// ## Summary
    /// Loads configuration from defaults, environment variables, and an optional
    /// `config.toml`. `DATABASE_URL` is honoured for the database URL.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8698)?
            .set_default("database.max_connections", 4)?
            .set_default("logging.level", "debug")?
            .set_default("sync.batch_size", 5)?
            .set_default("sync.interval_secs", 300)?
            .set_default("sync.lookback_days", 30)?
            .set_default("sync.lookahead_days", 365)?
            .set_default("sync.fetch_timeout_secs", 30)?
            .set_default("sync.user_agent", "turnover-sync/0.1")?
            .set_default("sync.default_checkout_time", "11:00")?
            .set_default("payments.default_hours_per_clean", 2.0)?
            .set_default("payments.regenerate_status", "reset")?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env (SYNC__BATCH_SIZE=10 -> sync.batch_size)
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "No .env file loaded");
    }

    Settings::load()
}
