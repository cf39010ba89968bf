use anyhow::Result;
use chrono::Locale;
use chrono_tz::Tz;
use config::{Config, ConfigBuilder, builder::DefaultState};
use serde::Deserialize;

use crate::constants::{DEFAULT_EVENTS_SOURCE, DEFAULT_STREAMS_SOURCE};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub sources: SourcesConfig,
    pub schedule: ScheduleConfig,
    pub refresh: RefreshConfig,
    pub logging: LoggingConfig,
}

/// Where the two JSON documents come from. Either a file path or an
/// `http(s)://` URL.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub events: String,
    pub streams: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    pub timezone: String,
    pub locale: String,
    pub horizon_days: u32,
    pub timeline_days: u32,
    pub upcoming_limit: usize,
}

impl ScheduleConfig {
    /// ## Summary
    /// Resolves the configured IANA zone used for all local-date arithmetic.
    ///
    /// ## Errors
    /// Returns `CoreError::ConfigError` if the zone name is unknown.
    pub fn tz(&self) -> CoreResult<Tz> {
        self.timezone
            .trim()
            .parse::<Tz>()
            .map_err(|e| CoreError::ConfigError(format!("timezone {:?}: {e}", self.timezone)))
    }

    /// ## Summary
    /// Resolves the configured display locale (e.g. `en_US`, `de_DE`).
    ///
    /// ## Errors
    /// Returns `CoreError::ConfigError` if the locale is not known to chrono.
    pub fn locale(&self) -> CoreResult<Locale> {
        Locale::try_from(self.locale.trim()).map_err(|_unknown| {
            CoreError::ConfigError(format!("unknown locale {:?}", self.locale))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    /// Unconditional reload period.
    pub hard_refresh_secs: u64,
    /// Added after a status boundary so the reload lands on the far side of it.
    pub boundary_slack_ms: u64,
    pub min_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    fn builder() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("sources.events", DEFAULT_EVENTS_SOURCE)?
            .set_default("sources.streams", DEFAULT_STREAMS_SOURCE)?
            .set_default("schedule.timezone", "UTC")?
            .set_default("schedule.locale", "en_US")?
            .set_default("schedule.horizon_days", 14)?
            .set_default("schedule.timeline_days", 7)?
            .set_default("schedule.upcoming_limit", 25)?
            .set_default("refresh.hard_refresh_secs", 60)?
            .set_default("refresh.boundary_slack_ms", 450)?
            .set_default("refresh.min_delay_ms", 500)?
            .set_default("logging.level", "debug")?)
    }

    /// ## Summary
    /// Builds `Settings` from built-in defaults only.
    ///
    /// ## Errors
    /// Returns an error if the defaults fail to deserialize.
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::builder()?.build()?.try_deserialize::<Settings>()?)
    }

    /// ## Summary
    /// Loads configuration from defaults, `ONAIR_`-prefixed environment
    /// variables and an optional `config.toml`.
    ///
    /// Nested keys use a double underscore, e.g. `ONAIR_SCHEDULE__TIMEZONE`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Self::builder()?
            // ONAIR_* variables
            .add_source(
                config::Environment::with_prefix("ONAIR")
                    .prefix_separator("_")
                    .separator("__")
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_defaults() {
        let settings = Settings::with_defaults().unwrap();

        assert_eq!(settings.sources.events, "events.json");
        assert_eq!(settings.sources.streams, "streams.json");
        assert_eq!(settings.schedule.horizon_days, 14);
        assert_eq!(settings.schedule.timeline_days, 7);
        assert_eq!(settings.schedule.upcoming_limit, 25);
        assert_eq!(settings.refresh.hard_refresh_secs, 60);
        assert_eq!(settings.refresh.boundary_slack_ms, 450);
        assert_eq!(settings.refresh.min_delay_ms, 500);
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn test_default_zone_and_locale_resolve() {
        let settings = Settings::with_defaults().unwrap();

        assert_eq!(settings.schedule.tz().unwrap(), chrono_tz::UTC);
        assert_eq!(settings.schedule.locale().unwrap(), Locale::en_US);
    }

    #[test]
    fn test_unknown_timezone() {
        let schedule = ScheduleConfig {
            timezone: "Mars/Olympus_Mons".to_string(),
            locale: "en_US".to_string(),
            horizon_days: 14,
            timeline_days: 7,
            upcoming_limit: 25,
        };

        assert!(matches!(schedule.tz(), Err(CoreError::ConfigError(_))));
    }

    #[test]
    fn test_unknown_locale() {
        let schedule = ScheduleConfig {
            timezone: "Europe/Berlin".to_string(),
            locale: "xx_YY".to_string(),
            horizon_days: 14,
            timeline_days: 7,
            upcoming_limit: 25,
        };

        assert_eq!(schedule.tz().unwrap(), chrono_tz::Europe::Berlin);
        assert!(matches!(schedule.locale(), Err(CoreError::ConfigError(_))));
    }

    #[test]
    fn test_settings_debug() {
        let settings = Settings::with_defaults().unwrap();

        let debug_str = format!("{settings:?}");
        assert!(debug_str.contains("Settings"));
        assert!(debug_str.contains("schedule"));
        assert!(debug_str.contains("refresh"));
    }
}
