//! VANET Reference Simulation Harness
//!
//! Stands in for the external traffic simulator and operator display so the
//! engines in `vanet_core` can be exercised end to end, deterministically.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           SimWorld                           │
//! │  ┌───────────────┐  Snapshot  ┌────────────────────────────┐ │
//! │  │ TrafficOracle │───────────►│ WarningPipeline            │ │
//! │  │ (ground truth)│            │  CollisionEngine           │ │
//! │  └───────────────┘            │  DisseminationEngine       │ │
//! │                               └─────────────┬──────────────┘ │
//! └─────────────────────────────────────────────┼────────────────┘
//!                                               │ SimRecord
//!                               ┌───────────────┴──────────────┐
//!                               ▼                              ▼
//!                        LogExporter                 record_channel ──► WarningBoard
//!                        (CSV + JSON)                (drops oldest)
//! ```
//!
//! All randomness derives from one 64-bit seed via [`SimContext`].
//!
//! # Usage
//!
//! ```ignore
//! use vanet_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42).with_steps(200).run(ScenarioId::HeadOn)?;
//! assert!(result.passed);
//! ```

mod context;
mod display;
mod error;
mod exporter;
mod oracle;
mod runner;
mod world;
pub mod scenarios;

pub use context::SimContext;
pub use display::{WarningBoard, BOARD_CAPACITY};
pub use error::SimError;
pub use exporter::{ExportPaths, LogExporter, RunSummary};
pub use oracle::{TrafficOracle, Vehicle};
pub use runner::{ScenarioResult, ScenarioRunner};
pub use world::{SimConfig, SimWorld};
