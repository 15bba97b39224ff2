//! Construction-time errors for the engines.

use thiserror::Error;

/// Invalid configuration. Raised eagerly; an engine is never built from a bad config.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{parameter} must be positive and finite, got {value}")]
    NonPositive { parameter: &'static str, value: f64 },

    #[error("{parameter} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Config I/O error: {0}")]
    Io(String),
}

impl ConfigError {
    /// Checks `value > 0` and finite.
    pub(crate) fn require_positive(parameter: &'static str, value: f64) -> Result<(), Self> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(Self::NonPositive { parameter, value })
        }
    }

    /// Checks `min <= value <= max` (NaN fails).
    pub(crate) fn require_within(parameter: &'static str, value: f64, min: f64, max: f64) -> Result<(), Self> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(Self::OutOfRange { parameter, value, min, max })
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
