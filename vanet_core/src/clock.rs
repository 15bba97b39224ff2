//! Step counter used to label records with elapsed simulated time.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Default traffic-simulator step length (s).
pub const DEFAULT_STEP_LENGTH: f64 = 0.1;

/// Integer step count plus a fixed step duration.
///
/// Only ever used for labels; no geometric result depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationClock {
    step: u64,
    step_length: f64,
}

impl SimulationClock {
    /// Creates a clock at step 0. `step_length` must be positive.
    pub fn new(step_length: f64) -> Result<Self, ConfigError> {
        ConfigError::require_positive("step_length", step_length)?;
        Ok(Self { step: 0, step_length })
    }

    /// Advances one step and returns the new step number.
    pub fn tick(&mut self) -> u64 {
        self.step += 1;
        self.step
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn step_length(&self) -> f64 {
        self.step_length
    }

    /// `step × step_length`, in seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.step as f64 * self.step_length
    }

    /// Elapsed time as `MM:SS.d`.
    pub fn label(&self) -> String {
        format_elapsed(self.elapsed_secs())
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self {
            step: 0,
            step_length: DEFAULT_STEP_LENGTH,
        }
    }
}

/// Formats seconds as `MM:SS.d` (tenths truncated, minutes may exceed 99).
pub fn format_elapsed(seconds: f64) -> String {
    // Nudge before truncating so 0.7000000001 and 0.6999999999 both read as 0.7
    let tenths = (seconds.max(0.0) * 10.0 + 1e-6).floor() as u64;
    let minutes = tenths / 600;
    let secs = (tenths / 10) % 60;
    let frac = tenths % 10;
    format!("{:02}:{:02}.{}", minutes, secs, frac)
}
