//! Common value types exchanged between the driver, the engines and the sinks.

use crate::error::EnvError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque identifier for a vehicle.
///
/// Ordering is lexicographic on the underlying string; the engines rely on it
/// for canonical pair ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Creates an id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kinematic state of one vehicle at one step.
///
/// Fields are validated once in [`AgentState::new`]; everything downstream
/// can assume finite values, non-negative speed and a heading in `[0, 360)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    id: AgentId,

    /// Position [x, y] in meters
    position: [f64; 2],

    /// Scalar speed in m/s
    speed: f64,

    /// Compass heading in degrees (0 = north, clockwise)
    heading: f64,

    /// Vehicle length in meters (informational)
    length: f64,

    /// Vehicle width in meters (informational)
    width: f64,
}

impl AgentState {
    /// Creates a validated agent state.
    pub fn new(
        id: impl Into<AgentId>,
        position: [f64; 2],
        speed: f64,
        heading: f64,
        length: f64,
        width: f64,
    ) -> Result<Self, EnvError> {
        let id = id.into();

        if !position[0].is_finite() || !position[1].is_finite() {
            return Err(EnvError::invalid_state(&id, format!("non-finite position {:?}", position)));
        }
        if !speed.is_finite() || speed < 0.0 {
            return Err(EnvError::invalid_state(&id, format!("speed must be finite and >= 0, got {}", speed)));
        }
        if !heading.is_finite() || !(0.0..360.0).contains(&heading) {
            return Err(EnvError::invalid_state(&id, format!("heading must be in [0, 360), got {}", heading)));
        }
        if !length.is_finite() || length < 0.0 || !width.is_finite() || width < 0.0 {
            return Err(EnvError::invalid_state(
                &id,
                format!("dimensions must be finite and >= 0, got {}x{}", length, width),
            ));
        }

        Ok(Self {
            id,
            position,
            speed,
            heading,
            length,
            width,
        })
    }

    /// Creates a state with default passenger-car dimensions (5.0 x 1.8 m).
    pub fn point(
        id: impl Into<AgentId>,
        position: [f64; 2],
        speed: f64,
        heading: f64,
    ) -> Result<Self, EnvError> {
        Self::new(id, position, speed, heading, 5.0, 1.8)
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn position(&self) -> [f64; 2] {
        self.position
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn width(&self) -> f64 {
        self.width
    }
}

/// All agent states observed at one simulation step, keyed and ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    agents: BTreeMap<AgentId, AgentState>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from states, rejecting duplicate ids.
    pub fn from_states<I>(states: I) -> Result<Self, EnvError>
    where
        I: IntoIterator<Item = AgentState>,
    {
        let mut snapshot = Self::new();
        for state in states {
            snapshot.insert(state)?;
        }
        Ok(snapshot)
    }

    /// Adds a state. Fails if the id is already present.
    pub fn insert(&mut self, state: AgentState) -> Result<(), EnvError> {
        if self.agents.contains_key(state.id()) {
            return Err(EnvError::DuplicateAgent(state.id().to_string()));
        }
        self.agents.insert(state.id().clone(), state);
        Ok(())
    }

    /// Removes an agent (e.g. it left the network between two stages).
    pub fn remove(&mut self, id: &AgentId) -> Option<AgentState> {
        self.agents.remove(id)
    }

    pub fn get(&self, id: &AgentId) -> Option<&AgentState> {
        self.agents.get(id)
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        self.agents.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &AgentId> {
        self.agents.keys()
    }

    /// States in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentState> {
        self.agents.values()
    }
}

/// Discrete collision risk tier, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// How a warning reached its receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
    /// Between the two endpoints of an at-risk pair
    Direct,

    /// From an endpoint to a bystander in its range
    Relay,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Direct => "DIRECT",
            MessageKind::Relay => "RELAY",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
