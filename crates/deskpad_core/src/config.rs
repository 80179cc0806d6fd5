//! Engine configuration.
//!
//! # Responsibility
//! - Hold the tunables of event synthesis, analysis debounce, delete
//!   behavior and logging.
//! - Load them from a JSON file where missing keys fall back to defaults.
//!
//! # Invariants
//! - A config that passed `validate()` always yields a usable `EventTiming`.

use crate::logging::{default_log_level, normalize_level};
use crate::outline::editor::OrphanPolicy;
use crate::resolver::EventTiming;
use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

const TIME_FORMAT: &str = "%H:%M";
/// One week.
const MAX_EVENT_DURATION_MINUTES: i64 = 7 * 24 * 60;
const MAX_ANALYSIS_DEBOUNCE_MS: u64 = 60_000;

/// Errors from loading or validating configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    /// A field holds a value outside its accepted range.
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::InvalidValue { field, message } => write!(f, "invalid `{field}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Engine tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `HH:MM` start time of events whose text has a date only.
    pub default_event_time: String,
    pub event_duration_minutes: i64,
    /// Added to two-digit years found in note text.
    pub two_digit_year_base: i32,
    /// Typing pause before calendar analysis re-runs on a note.
    pub analysis_debounce_ms: u64,
    pub orphan_policy: OrphanPolicy,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_event_time: "09:00".to_string(),
            event_duration_minutes: 60,
            two_digit_year_base: 2000,
            analysis_debounce_ms: 800,
            orphan_policy: OrphanPolicy::default(),
            log_level: default_log_level().to_string(),
        }
    }
}

impl EngineConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parses and validates a JSON config document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects out-of-range durations, malformed times and unknown levels.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parse_default_time()?;
        self.event_duration()?;
        if self.analysis_debounce_ms > MAX_ANALYSIS_DEBOUNCE_MS {
            return Err(ConfigError::InvalidValue {
                field: "analysis_debounce_ms",
                message: format!(
                    "must be at most {MAX_ANALYSIS_DEBOUNCE_MS}, got {}",
                    self.analysis_debounce_ms
                ),
            });
        }
        normalize_level(&self.log_level).map_err(|err| ConfigError::InvalidValue {
            field: "log_level",
            message: err.to_string(),
        })?;
        Ok(())
    }

    /// Builds the event synthesis settings.
    pub fn event_timing(&self) -> Result<EventTiming, ConfigError> {
        self.validate()?;
        Ok(EventTiming {
            default_time: self.parse_default_time()?,
            duration: self.event_duration()?,
            two_digit_year_base: self.two_digit_year_base,
        })
    }

    /// Debounce delay as a std duration.
    pub fn analysis_debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.analysis_debounce_ms)
    }

    fn event_duration(&self) -> Result<Duration, ConfigError> {
        let minutes = self.event_duration_minutes;
        if !(1..=MAX_EVENT_DURATION_MINUTES).contains(&minutes) {
            return Err(ConfigError::InvalidValue {
                field: "event_duration_minutes",
                message: format!("must be between 1 and {MAX_EVENT_DURATION_MINUTES}, got {minutes}"),
            });
        }
        Duration::try_minutes(minutes).ok_or_else(|| ConfigError::InvalidValue {
            field: "event_duration_minutes",
            message: format!("out of range: {minutes}"),
        })
    }

    fn parse_default_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(self.default_event_time.trim(), TIME_FORMAT).map_err(|_| {
            ConfigError::InvalidValue {
                field: "default_event_time",
                message: format!("expected HH:MM, got `{}`", self.default_event_time),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, EngineConfig};
    use crate::outline::editor::OrphanPolicy;
    use crate::resolver::EventTiming;

    #[test]
    fn default_config_matches_default_timing() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.event_timing().unwrap(), EventTiming::default());
        assert_eq!(config.analysis_debounce().as_millis(), 800);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            EngineConfig::from_json(r#"{"orphan_policy":"reparent","log_level":"warn"}"#).unwrap();
        assert_eq!(config.orphan_policy, OrphanPolicy::Reparent);
        assert_eq!(config.event_duration_minutes, 60);
        assert_eq!(config.default_event_time, "09:00");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_time = EngineConfig::from_json(r#"{"default_event_time":"25:00"}"#);
        assert!(matches!(
            bad_time,
            Err(ConfigError::InvalidValue {
                field: "default_event_time",
                ..
            })
        ));
        let bad_duration = EngineConfig::from_json(r#"{"event_duration_minutes":0}"#);
        assert!(matches!(
            bad_duration,
            Err(ConfigError::InvalidValue {
                field: "event_duration_minutes",
                ..
            })
        ));
        let huge = EngineConfig {
            event_duration_minutes: 1_000_000_000_000_000,
            ..EngineConfig::default()
        };
        assert!(matches!(
            huge.event_timing(),
            Err(ConfigError::InvalidValue {
                field: "event_duration_minutes",
                ..
            })
        ));
        assert!(EngineConfig::from_json(r#"{"event_duration_minutes":1000000000000000}"#).is_err());
        assert!(EngineConfig::from_json(r#"{"event_duration_minutes":10080}"#).is_ok());
        assert!(matches!(
            EngineConfig::from_json(r#"{"analysis_debounce_ms":18446744073709551615}"#),
            Err(ConfigError::InvalidValue {
                field: "analysis_debounce_ms",
                ..
            })
        ));
        assert!(matches!(
            EngineConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
