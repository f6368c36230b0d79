//! Configuration management for the scanner.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::camera::{BarcodeFormat, ScannerSettings, ScreenSize};
use crate::types::{EventId, EventScope, OrganiserId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::env;
use std::time::Duration;
use thiserror::Error;
use ticket_scan_firestore::{DEFAULT_BASE_URL, DEFAULT_DATABASE};

/// Longest accepted lookup timeout, in seconds
pub const MAX_LOOKUP_TIMEOUT_SECS: u64 = 300;

/// Errors raised while loading configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set to something unusable
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// Value found
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Event whose tickets are scanned
    pub scope: EventScope,
    /// Document store connection
    pub firestore: FirestoreConfig,
    /// Scanner behaviour
    pub scanner: ScannerConfig,
}

/// Firestore connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirestoreConfig {
    /// Google Cloud project id
    pub project_id: String,
    /// Database id, usually `(default)`
    pub database: String,
    /// REST endpoint (point at an emulator for local runs)
    pub base_url: String,
    /// Web API key sent as the `key` query parameter
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
}

/// Scanner behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Seconds to wait for a lookup before showing an error
    pub lookup_timeout_secs: u64,
    /// Accepted symbology
    pub barcode_format: BarcodeFormat,
    /// Screen width in points
    pub screen_width: f64,
    /// Screen height in points
    pub screen_height: f64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_secs: 10,
            barcode_format: BarcodeFormat::Code128,
            screen_width: 390.0,
            screen_height: 844.0,
        }
    }
}

impl ScannerConfig {
    /// Lookup timeout as a `Duration`.
    #[must_use]
    pub const fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    /// Camera settings derived from the screen size and format.
    #[must_use]
    pub fn settings(&self) -> ScannerSettings {
        ScannerSettings::new(
            self.barcode_format,
            ScreenSize {
                width: self.screen_width,
                height: self.screen_height,
            },
        )
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Missing`] if `SCANNER_ORGANISER_ID`, `SCANNER_EVENT_ID`
    ///   or `FIRESTORE_PROJECT_ID` is unset or empty
    /// - [`ConfigError::Invalid`] if a numeric or format variable cannot be used
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let defaults = ScannerConfig::default();

        let lookup_timeout_secs = match var("SCANNER_LOOKUP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = parse_positive::<u64>("SCANNER_LOOKUP_TIMEOUT_SECS", &raw)?;
                if secs > MAX_LOOKUP_TIMEOUT_SECS {
                    return Err(ConfigError::Invalid {
                        var: "SCANNER_LOOKUP_TIMEOUT_SECS",
                        value: raw,
                        reason: format!("must be at most {MAX_LOOKUP_TIMEOUT_SECS}"),
                    });
                }
                secs
            },
            None => defaults.lookup_timeout_secs,
        };
        let screen_width = match var("SCANNER_SCREEN_WIDTH") {
            Some(raw) => parse_dimension("SCANNER_SCREEN_WIDTH", &raw)?,
            None => defaults.screen_width,
        };
        let screen_height = match var("SCANNER_SCREEN_HEIGHT") {
            Some(raw) => parse_dimension("SCANNER_SCREEN_HEIGHT", &raw)?,
            None => defaults.screen_height,
        };
        let barcode_format = match var("SCANNER_BARCODE_FORMAT") {
            Some(raw) => parse_linear_format(&raw)?,
            None => defaults.barcode_format,
        };

        Ok(Self {
            scope: EventScope::new(
                OrganiserId::new(required("SCANNER_ORGANISER_ID")?),
                EventId::new(required("SCANNER_EVENT_ID")?),
            ),
            firestore: FirestoreConfig {
                project_id: required("FIRESTORE_PROJECT_ID")?,
                database: var("FIRESTORE_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
                base_url: var("FIRESTORE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                api_key: var("FIRESTORE_API_KEY"),
            },
            scanner: ScannerConfig {
                lookup_timeout_secs,
                barcode_format,
                screen_width,
                screen_height,
            },
        })
    }
}

fn parse_positive<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let invalid = |reason: String| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason,
    };

    let value: T = raw.trim().parse().map_err(|e: T::Err| invalid(e.to_string()))?;
    // NaN is unordered and fails this check too
    if value.partial_cmp(&T::default()) != Some(Ordering::Greater) {
        return Err(invalid("must be greater than zero".to_string()));
    }
    Ok(value)
}

/// Screen dimensions must be finite as well as positive
fn parse_dimension(var: &'static str, raw: &str) -> Result<f64, ConfigError> {
    let value = parse_positive::<f64>(var, raw)?;
    if !value.is_finite() {
        return Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    Ok(value)
}

/// Only one-dimensional symbologies can be scanned
fn parse_linear_format(raw: &str) -> Result<BarcodeFormat, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var: "SCANNER_BARCODE_FORMAT",
        value: raw.to_string(),
        reason,
    };

    let format: BarcodeFormat = raw
        .parse()
        .map_err(|e: crate::camera::UnknownBarcodeFormat| invalid(e.to_string()))?;
    if !format.is_linear() {
        return Err(invalid(format!("{format} is not a linear barcode format")));
    }
    Ok(format)
}
