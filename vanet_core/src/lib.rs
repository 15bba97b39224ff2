//! VANET Core - Collision Warning Engines
//!
//! Two stateless-per-step engines and the glue that runs them:
//! 1. **RISK**: pairwise time-to-collision screening under constant velocity
//! 2. **WARN**: direct and relayed warning dissemination over a lossy disk-model radio
//!
//! [`WarningPipeline`] runs both per snapshot and hands labelled records to an
//! [`vanet_env::EventSink`].

pub mod clock;
pub mod collision;
pub mod config;
pub mod dissemination;
pub mod error;
pub mod geometry;
pub mod metrics;
pub mod pipeline;
pub mod severity;

// Re-export key types for convenience
pub use clock::SimulationClock;
pub use collision::{AgentPair, CollisionCandidate, CollisionConfig, CollisionEngine};
pub use config::VanetConfig;
pub use dissemination::{DisseminationConfig, DisseminationEngine, MessageEvent};
pub use error::ConfigError;
pub use metrics::{DeliveryCounts, RunStats, SeverityCounts, StepMetrics};
pub use pipeline::{StepReport, WarningPipeline};
pub use severity::classify;
