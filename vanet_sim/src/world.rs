//! SimWorld - the simulation harness container.

use crate::context::SimContext;
use crate::error::SimError;
use crate::oracle::TrafficOracle;
use crate::scenarios::ScenarioId;

use serde::{Deserialize, Serialize};
use tracing::debug;
use vanet_core::{RunStats, SimulationClock, StepReport, VanetConfig, WarningPipeline};
use vanet_env::{EventSink, SnapshotSource};

/// Configuration for a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Vehicles spawned by the random-traffic scenarios
    pub vehicles: usize,

    /// Upper bound on processed steps
    pub max_steps: u64,

    /// Position noise standard deviation for reported positions (m)
    pub position_noise_std: f64,

    /// Engine parameters
    pub vanet: VanetConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            vehicles: 30,
            max_steps: 1000,
            position_noise_std: 0.0,
            vanet: VanetConfig::default(),
        }
    }
}

/// The SimWorld - oracle plus pipeline for one scenario.
pub struct SimWorld<S> {
    pub context: SimContext,

    /// Ground truth oracle
    pub oracle: TrafficOracle,

    /// Engine parameters after scenario overrides
    vanet: VanetConfig,

    pipeline: WarningPipeline<S>,
}

impl<S: EventSink> SimWorld<S> {
    /// Seeds the oracle and the loss trials from `config.seed` and places the scenario's vehicles.
    pub fn new(config: &SimConfig, scenario: ScenarioId, sink: S) -> Result<Self, SimError> {
        let mut vanet = config.vanet;
        if let Some(loss) = scenario.loss_override() {
            vanet.packet_loss_rate = loss;
        }
        vanet.validate()?;

        let context = SimContext::new(config.seed);
        let mut oracle = TrafficOracle::new(context.physics_seed()).with_step_length(vanet.step_length);
        oracle.set_position_noise(config.position_noise_std);
        scenario.populate(&mut oracle, config.vehicles)?;

        let pipeline = WarningPipeline::new(&vanet, context.network_seed(), sink)?;
        debug!(
            "World ready: {} vehicles, range={}m, loss={}",
            oracle.active_count(),
            vanet.transmission_range,
            vanet.packet_loss_rate
        );

        Ok(Self {
            context,
            oracle,
            vanet,
            pipeline,
        })
    }

    /// Advances the oracle one step and runs the engines on the result.
    ///
    /// `None` once every vehicle has left.
    pub fn step(&mut self) -> Option<StepReport> {
        let snapshot = self.oracle.next_snapshot()?;
        if snapshot.is_empty() {
            return None;
        }
        Some(self.pipeline.step(&snapshot))
    }

    /// Emits the end-of-stream marker and returns the final counters.
    pub fn finish(&mut self) -> RunStats {
        self.pipeline.finish().clone()
    }

    pub fn vanet_config(&self) -> &VanetConfig {
        &self.vanet
    }

    pub fn clock(&self) -> &SimulationClock {
        self.pipeline.clock()
    }

    pub fn stats(&self) -> &RunStats {
        self.pipeline.stats()
    }

    pub fn into_sink(self) -> S {
        self.pipeline.into_sink()
    }
}
