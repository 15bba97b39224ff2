//! Error types for the VANET environment boundary.

use thiserror::Error;

/// Errors raised at the boundary between the engines and their collaborators.
#[derive(Debug, Error)]
pub enum EnvError {
    /// A kinematic record failed validation at ingestion
    #[error("Invalid state for agent {id}: {reason}")]
    InvalidAgentState { id: String, reason: String },

    /// Two records in one snapshot share an id
    #[error("Duplicate agent id in snapshot: {0}")]
    DuplicateAgent(String),

    /// The sink has no live consumer (channel closed, writer gone)
    #[error("Event sink closed: {0}")]
    SinkClosed(String),

    /// Record channel capacity outside `1..=max`
    #[error("Invalid channel capacity {requested}: must be between 1 and {max}")]
    InvalidCapacity { requested: usize, max: usize },
}

impl EnvError {
    /// Creates an invalid-state error.
    pub fn invalid_state(id: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Self::InvalidAgentState {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a sink-closed error.
    pub fn sink_closed(msg: impl Into<String>) -> Self {
        Self::SinkClosed(msg.into())
    }
}
