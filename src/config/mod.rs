//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `EQUIV_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_BATCH_CONCURRENCY, DEFAULT_EXTRACTION_CONCURRENCY};

/// Runtime configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `EQUIV_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Parallel per-publisher extractions within one pipeline run. Default: `4`.
    pub extraction_concurrency: usize,

    /// Subjects evaluated at once by the batch runner. Default: `8`.
    pub batch_concurrency: usize,

    /// TOML routing table.
    pub routing_path: Option<PathBuf>,

    /// Per-subject timeout applied by the batch runner. Unset means no timeout.
    pub run_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extraction_concurrency: DEFAULT_EXTRACTION_CONCURRENCY,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            routing_path: None,
            run_timeout: None,
        }
    }
}

impl Config {
    const ENV_EXTRACTION_CONCURRENCY: &'static str = "EQUIV_EXTRACTION_CONCURRENCY";
    const ENV_BATCH_CONCURRENCY: &'static str = "EQUIV_BATCH_CONCURRENCY";
    const ENV_ROUTING_PATH: &'static str = "EQUIV_ROUTING_PATH";
    const ENV_RUN_TIMEOUT_SECS: &'static str = "EQUIV_RUN_TIMEOUT_SECS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let extraction_concurrency = Self::parse_positive_from_env(
            Self::ENV_EXTRACTION_CONCURRENCY,
            defaults.extraction_concurrency,
        )?;
        let batch_concurrency =
            Self::parse_positive_from_env(Self::ENV_BATCH_CONCURRENCY, defaults.batch_concurrency)?;
        let routing_path = Self::parse_optional_path_from_env(Self::ENV_ROUTING_PATH);
        let run_timeout = Self::parse_optional_secs_from_env(Self::ENV_RUN_TIMEOUT_SECS)?;

        Ok(Self {
            extraction_concurrency,
            batch_concurrency,
            routing_path,
            run_timeout,
        })
    }

    /// Validates bounds and the routing path (when set).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extraction_concurrency == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_EXTRACTION_CONCURRENCY,
            });
        }
        if self.batch_concurrency == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_BATCH_CONCURRENCY,
            });
        }
        if self.run_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_RUN_TIMEOUT_SECS,
            });
        }

        if let Some(ref path) = self.routing_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        Ok(())
    }

    fn parse_positive_from_env(name: &'static str, default: usize) -> Result<usize, ConfigError> {
        match env::var(name) {
            Ok(value) => {
                let parsed: usize =
                    value
                        .trim()
                        .parse()
                        .map_err(|e| ConfigError::NumberParseError {
                            name,
                            value: value.clone(),
                            source: e,
                        })?;

                if parsed == 0 {
                    return Err(ConfigError::ZeroValue { name });
                }

                Ok(parsed)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_optional_secs_from_env(name: &'static str) -> Result<Option<Duration>, ConfigError> {
        match env::var(name) {
            Ok(value) if !value.trim().is_empty() => {
                let secs: u64 =
                    value
                        .trim()
                        .parse()
                        .map_err(|e| ConfigError::NumberParseError {
                            name,
                            value: value.clone(),
                            source: e,
                        })?;
                if secs == 0 {
                    return Err(ConfigError::ZeroValue { name });
                }
                Ok(Some(Duration::from_secs(secs)))
            }
            _ => Ok(None),
        }
    }
}
