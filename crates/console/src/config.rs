//! Process configuration, read from the environment.
//!
//! | Variable | Values | Default |
//! |---|---|---|
//! | `BISTRO_SIMULATED_LATENCY` | `on` / `off` | `on` |
//! | `BISTRO_LOG_FORMAT` | `json` / `compact` | `json` |
//! | `BISTRO_SEED_DEMO_DATA` | `true` / `false` | `true` |

use std::time::Duration;

use bistro_auth::DEFAULT_AUTH_LATENCY;
use bistro_menu::CatalogLatency;
use bistro_observability::LogFormat;

pub const SIMULATED_LATENCY_VAR: &str = "BISTRO_SIMULATED_LATENCY";
pub const LOG_FORMAT_VAR: &str = "BISTRO_LOG_FORMAT";
pub const SEED_DEMO_DATA_VAR: &str = "BISTRO_SEED_DEMO_DATA";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid; expected {expected}")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Simulated latency for every store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyProfile {
    /// `login` / `register`.
    pub auth: Duration,
    pub catalog: CatalogLatency,
}

impl LatencyProfile {
    pub fn standard() -> Self {
        Self {
            auth: DEFAULT_AUTH_LATENCY,
            catalog: CatalogLatency::default(),
        }
    }

    pub fn zero() -> Self {
        Self {
            auth: Duration::ZERO,
            catalog: CatalogLatency::zero(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub simulated_latency: bool,
    pub log_format: LogFormat,
    pub seed_demo_data: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            simulated_latency: true,
            log_format: LogFormat::Json,
            seed_demo_data: true,
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source; unset variables take their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let simulated_latency = match lookup(SIMULATED_LATENCY_VAR) {
            None => defaults.simulated_latency,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "on" => true,
                "off" => false,
                _ => return Err(invalid(SIMULATED_LATENCY_VAR, raw.clone(), "'on' or 'off'")),
            },
        };

        let log_format = match lookup(LOG_FORMAT_VAR) {
            None => defaults.log_format,
            Some(raw) => raw
                .parse::<LogFormat>()
                .map_err(|_| invalid(LOG_FORMAT_VAR, raw.clone(), "'json' or 'compact'"))?,
        };

        let seed_demo_data = match lookup(SEED_DEMO_DATA_VAR) {
            None => defaults.seed_demo_data,
            Some(raw) => raw
                .trim()
                .parse::<bool>()
                .map_err(|_| invalid(SEED_DEMO_DATA_VAR, raw.clone(), "'true' or 'false'"))?,
        };

        Ok(Self {
            simulated_latency,
            log_format,
            seed_demo_data,
        })
    }

    pub fn latency(&self) -> LatencyProfile {
        if self.simulated_latency {
            LatencyProfile::standard()
        } else {
            LatencyProfile::zero()
        }
    }
}

fn invalid(var: &'static str, value: String, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        value,
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ConsoleConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ConsoleConfig::default());
        assert_eq!(config.latency(), LatencyProfile::standard());
        assert_eq!(config.latency().auth, Duration::from_millis(1500));
    }

    #[test]
    fn latency_off_zeroes_every_delay() {
        let config = ConsoleConfig::from_lookup(lookup(&[(SIMULATED_LATENCY_VAR, "OFF")])).unwrap();
        assert!(!config.simulated_latency);
        assert_eq!(config.latency(), LatencyProfile::zero());
    }

    #[test]
    fn reads_format_and_seed_flag() {
        let config = ConsoleConfig::from_lookup(lookup(&[
            (LOG_FORMAT_VAR, "compact"),
            (SEED_DEMO_DATA_VAR, "false"),
        ]))
        .unwrap();
        assert_eq!(config.log_format, LogFormat::Compact);
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn rejects_unknown_values() {
        let err = ConsoleConfig::from_lookup(lookup(&[(SIMULATED_LATENCY_VAR, "sometimes")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: SIMULATED_LATENCY_VAR,
                value: "sometimes".to_string(),
                expected: "'on' or 'off'",
            }
        );
        assert!(ConsoleConfig::from_lookup(lookup(&[(LOG_FORMAT_VAR, "xml")])).is_err());
        assert!(ConsoleConfig::from_lookup(lookup(&[(SEED_DEMO_DATA_VAR, "yes")])).is_err());
    }
}
