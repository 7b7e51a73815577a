use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::constants::{DEFAULT_HORIZON_DAYS, MAX_OCCURRENCES_PER_SERIES};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub booking: BookingConfig,
    pub logging: LoggingConfig,
}

/// Limits applied to booking validation and expansion.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// Horizon for validating recurring rules without UNTIL, in days past
    /// the anchor.
    pub horizon_days: i64,
    /// Cap on materialized occurrences per series per expansion.
    pub max_occurrences: u16,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            max_occurrences: MAX_OCCURRENCES_PER_SERIES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from environment variables into a `Settings`.
    /// Environment variables take precedence over `config.toml` values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("booking.horizon_days", DEFAULT_HORIZON_DAYS)?
            .set_default("booking.max_occurrences", i64::from(MAX_OCCURRENCES_PER_SERIES))?
            .set_default("logging.level", "debug")?
            // Env file
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("_")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
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
    dotenvy::dotenv().ok();

    Settings::load()
}
