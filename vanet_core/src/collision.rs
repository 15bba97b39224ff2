//! The "RISK" Engine - pairwise time-to-collision screening
//!
//! Every step, each unordered pair of vehicles in the snapshot goes through:
//! 1. Distance Prefilter (skip pairs farther apart than `distance_threshold`)
//! 2. Velocity Reconstruction (compass heading + speed -> 2D velocity)
//! 3. Closest-Approach Projection (TTC under constant velocity)
//! 4. Threshold Gate (`0 < ttc < time_threshold`)
//! 5. Severity Classification (shared policy in [`crate::severity`])
//!
//! Pairs are visited in ascending id order so the output is reproducible
//! regardless of how the driver built the snapshot.

use crate::error::ConfigError;
use crate::geometry;
use crate::severity;
use serde::{Deserialize, Serialize};
use vanet_env::{AgentId, AgentState, Severity, Snapshot};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the CollisionEngine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionConfig {
    /// Report pairs whose TTC is below this (default: 3.0 s)
    pub time_threshold: f64,

    /// Ignore pairs farther apart than this (default: 30.0 m)
    pub distance_threshold: f64,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            time_threshold: 3.0,
            distance_threshold: 30.0,
        }
    }
}

impl CollisionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("time_threshold", self.time_threshold)?;
        ConfigError::require_positive("distance_threshold", self.distance_threshold)?;
        Ok(())
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

/// Unordered pair of distinct agents, stored with the smaller id first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentPair {
    first: AgentId,
    second: AgentId,
}

impl AgentPair {
    /// Canonicalizes `(a, b)`. Returns `None` for a self-pair.
    pub fn new(a: AgentId, b: AgentId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { first: a, second: b }),
            std::cmp::Ordering::Greater => Some(Self { first: b, second: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn first(&self) -> &AgentId {
        &self.first
    }

    pub fn second(&self) -> &AgentId {
        &self.second
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        &self.first == id || &self.second == id
    }
}

impl std::fmt::Display for AgentPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

/// A pair predicted to reach minimum separation within the time threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionCandidate {
    pub pair: AgentPair,

    /// Seconds until minimum separation, finite and > 0
    pub ttc: f64,

    /// Current separation (m), <= distance threshold
    pub distance: f64,

    /// |speed_a - speed_b| (m/s)
    pub relative_speed: f64,

    pub severity: Severity,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Screens every pair of a snapshot for imminent collisions.
#[derive(Debug, Clone)]
pub struct CollisionEngine {
    config: CollisionConfig,
}

impl CollisionEngine {
    /// Creates an engine. Fails if either threshold is not positive.
    pub fn new(config: CollisionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Returns every at-risk pair of the snapshot, in canonical order.
    ///
    /// Pure: evaluating the same snapshot twice gives the same result.
    pub fn evaluate(&self, snapshot: &Snapshot) -> Vec<CollisionCandidate> {
        let states: Vec<&AgentState> = snapshot.iter().collect();
        let mut candidates = Vec::new();

        for (i, a) in states.iter().enumerate() {
            for b in &states[i + 1..] {
                if let Some(candidate) = self.assess_pair(a, b) {
                    candidates.push(candidate);
                }
            }
        }

        candidates
    }

    /// Runs the full screening for one pair. `a` and `b` may come in any order.
    pub fn assess_pair(&self, a: &AgentState, b: &AgentState) -> Option<CollisionCandidate> {
        let pair = AgentPair::new(a.id().clone(), b.id().clone())?;

        let distance = geometry::distance(a.position(), b.position());
        if distance > self.config.distance_threshold {
            return None;
        }

        let ttc = Self::time_to_collision(a, b);
        if !(ttc > 0.0 && ttc < self.config.time_threshold) {
            return None;
        }

        let relative_speed = severity::relative_speed(a.speed(), b.speed());
        Some(CollisionCandidate {
            pair,
            ttc,
            distance,
            relative_speed,
            severity: severity::classify(ttc, relative_speed),
        })
    }

    /// Constant-velocity TTC between two agents, `f64::INFINITY` if they are not closing.
    ///
    /// Symmetric in its arguments.
    pub fn time_to_collision(a: &AgentState, b: &AgentState) -> f64 {
        let dp = geometry::to_vector(b.position()) - geometry::to_vector(a.position());
        let dv = geometry::velocity_from_heading(b.speed(), b.heading())
            - geometry::velocity_from_heading(a.speed(), a.heading());
        geometry::time_to_collision(&dp, &dv)
    }
}
