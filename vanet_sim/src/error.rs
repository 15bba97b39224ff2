//! Harness error type.

use thiserror::Error;
use vanet_core::ConfigError;
use vanet_env::EnvError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment error: {0}")]
    Env(#[from] EnvError),

    #[error("Export failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Summary serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),
}
