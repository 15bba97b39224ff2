//! Aggregate configuration for one warning pipeline.

use crate::clock::{SimulationClock, DEFAULT_STEP_LENGTH};
use crate::collision::CollisionConfig;
use crate::dissemination::DisseminationConfig;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// All five tunables. Missing JSON fields fall back to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VanetConfig {
    /// Collision horizon (s)
    pub time_threshold: f64,

    /// Prefilter distance (m)
    pub distance_threshold: f64,

    /// Disk radio range (m)
    pub transmission_range: f64,

    /// Loss probability per attempted message
    pub packet_loss_rate: f64,

    /// Duration of one simulator step (s)
    pub step_length: f64,
}

impl Default for VanetConfig {
    fn default() -> Self {
        let collision = CollisionConfig::default();
        let dissemination = DisseminationConfig::default();
        Self {
            time_threshold: collision.time_threshold,
            distance_threshold: collision.distance_threshold,
            transmission_range: dissemination.transmission_range,
            packet_loss_rate: dissemination.packet_loss_rate,
            step_length: DEFAULT_STEP_LENGTH,
        }
    }
}

impl VanetConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(ConfigError::from)
    }

    /// Checks every parameter, returning the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.collision().validate()?;
        self.dissemination().validate()?;
        ConfigError::require_positive("step_length", self.step_length)?;
        Ok(())
    }

    pub fn collision(&self) -> CollisionConfig {
        CollisionConfig {
            time_threshold: self.time_threshold,
            distance_threshold: self.distance_threshold,
        }
    }

    pub fn dissemination(&self) -> DisseminationConfig {
        DisseminationConfig {
            transmission_range: self.transmission_range,
            packet_loss_rate: self.packet_loss_rate,
        }
    }

    pub fn clock(&self) -> Result<SimulationClock, ConfigError> {
        SimulationClock::new(self.step_length)
    }
}
