//! Scenario runner - drives a scenario to completion and checks its expectation.

use crate::error::SimError;
use crate::scenarios::{Expectation, ScenarioId};
use crate::world::{SimConfig, SimWorld};

use serde::Serialize;
use tracing::{debug, info, warn};
use vanet_core::{RunStats, StepReport, VanetConfig};
use vanet_env::{EventSink, Severity, VecSink};

/// Results from running a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    #[serde(serialize_with = "serialize_scenario")]
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether the scenario met its expectation
    pub passed: bool,

    /// Steps processed
    pub total_steps: u64,

    /// Simulated time covered (s)
    pub final_time_secs: f64,

    /// Vehicles still in the world at the end
    pub final_vehicle_count: usize,

    /// Most severe tier observed
    pub worst_severity: Option<Severity>,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Counters collected during the run
    pub stats: RunStats,

    /// Engine parameters after scenario overrides
    pub vanet: VanetConfig,
}

fn serialize_scenario<S: serde::Serializer>(scenario: &ScenarioId, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(scenario.name())
}

/// Running tally of what the engines produced, checked at the end.
#[derive(Debug, Default)]
struct Observations {
    worst: Option<Severity>,
    foreign_pairs: u64,
    violations: Vec<String>,
}

impl Observations {
    fn record(&mut self, report: &StepReport, vanet: &VanetConfig, expected_pair: Option<(&str, &str)>) {
        for candidate in &report.candidates {
            self.worst = self.worst.max(Some(candidate.severity));

            if let Some((a, b)) = expected_pair {
                if candidate.pair.first().as_str() != a || candidate.pair.second().as_str() != b {
                    self.foreign_pairs += 1;
                }
            }

            if !(candidate.ttc > 0.0 && candidate.ttc < vanet.time_threshold) {
                self.violations.push(format!(
                    "[{}] {} ttc {:.3} outside (0, {})",
                    report.time_label, candidate.pair, candidate.ttc, vanet.time_threshold
                ));
            }
            if candidate.distance > vanet.distance_threshold {
                self.violations.push(format!(
                    "[{}] {} reported at {:.2}m beyond {}m",
                    report.time_label, candidate.pair, candidate.distance, vanet.distance_threshold
                ));
            }
        }

        for event in &report.events {
            if event.distance > vanet.transmission_range {
                self.violations.push(format!(
                    "[{}] {} -> {} sent over {:.2}m",
                    report.time_label, event.sender, event.receiver, event.distance
                ));
            }
        }
    }

    /// `None` if the expectation holds, otherwise the reason.
    fn verdict(&self, expectation: Expectation, stats: &RunStats) -> Option<String> {
        if let Some(first) = self.violations.first() {
            return Some(format!("{} invariant violations, first: {}", self.violations.len(), first));
        }

        match expectation {
            Expectation::PairAtRisk { first, second, worst } => {
                if stats.total_collisions() == 0 {
                    Some(format!("no collision risk reported for ({}, {})", first, second))
                } else if self.foreign_pairs > 0 {
                    Some(format!("{} candidates involved other pairs", self.foreign_pairs))
                } else if self.worst != Some(worst) {
                    Some(format!("worst severity {:?}, expected {}", self.worst, worst))
                } else {
                    None
                }
            }
            Expectation::NoCandidates => (stats.total_collisions() > 0)
                .then(|| format!("{} unexpected collision candidates", stats.total_collisions())),
            Expectation::DeliveryNear {
                ratio,
                tolerance,
                min_attempts,
            } => {
                let messages = stats.messages();
                match messages.ratio() {
                    _ if messages.attempted < min_attempts => Some(format!(
                        "only {} messages attempted, need {}",
                        messages.attempted, min_attempts
                    )),
                    Some(observed) if (observed - ratio).abs() > tolerance => Some(format!(
                        "delivery ratio {:.3} not within {} of {}",
                        observed, tolerance, ratio
                    )),
                    _ => None,
                }
            }
            Expectation::Consistent => None,
        }
    }
}

/// Runs scenarios.
pub struct ScenarioRunner {
    config: SimConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            config: SimConfig {
                seed,
                ..Default::default()
            },
        }
    }

    pub fn with_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the step bound.
    pub fn with_steps(mut self, steps: u64) -> Self {
        self.config.max_steps = steps;
        self
    }

    /// Sets the vehicle count for random traffic.
    pub fn with_vehicles(mut self, vehicles: usize) -> Self {
        self.config.vehicles = vehicles;
        self
    }

    /// Sets the engine parameters.
    pub fn with_vanet_config(mut self, vanet: VanetConfig) -> Self {
        self.config.vanet = vanet;
        self
    }

    /// Sets the position noise standard deviation.
    pub fn with_position_noise(mut self, std_dev: f64) -> Self {
        self.config.position_noise_std = std_dev;
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Runs a scenario, keeping its records in memory.
    pub fn run(&self, scenario: ScenarioId) -> Result<ScenarioResult, SimError> {
        self.run_with_sink(scenario, VecSink::new()).map(|(result, _)| result)
    }

    /// Runs a scenario, streaming its records into `sink`, and hands the sink back.
    pub fn run_with_sink<S: EventSink>(&self, scenario: ScenarioId, sink: S) -> Result<(ScenarioResult, S), SimError> {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.config.seed);
        debug!("  {}", scenario.description());

        let mut world = SimWorld::new(&self.config, scenario, sink)?;
        let vanet = *world.vanet_config();
        let expectation = scenario.expectation();
        let expected_pair = match expectation {
            Expectation::PairAtRisk { first, second, .. } => Some((first, second)),
            _ => None,
        };

        let mut observations = Observations::default();
        while world.clock().step() < self.config.max_steps {
            let Some(report) = world.step() else {
                debug!("All vehicles left after {} steps", world.clock().step());
                break;
            };
            observations.record(&report, &vanet, expected_pair);

            if report.step % 100 == 0 {
                debug!(
                    "  [{}] vehicles={} candidates={}",
                    report.time_label,
                    report.metrics.agents,
                    report.candidates.len()
                );
            }
        }

        let stats = world.finish();
        if stats.sink_errors > 0 {
            warn!("{} records were refused by the sink", stats.sink_errors);
        }

        let failure_reason = observations.verdict(expectation, &stats);
        let result = ScenarioResult {
            scenario,
            seed: self.config.seed,
            passed: failure_reason.is_none(),
            total_steps: world.clock().step(),
            final_time_secs: world.clock().elapsed_secs(),
            final_vehicle_count: world.oracle.active_count(),
            worst_severity: observations.worst,
            failure_reason,
            stats,
            vanet,
        };

        info!(
            "Scenario {} complete: {} steps, {} collision risks, {} messages",
            scenario.name(),
            result.total_steps,
            result.stats.total_collisions(),
            result.stats.messages().attempted
        );

        Ok((result, world.into_sink()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vanet_env::SimRecord;

    #[test]
    fn test_head_on_passes() {
        let result = ScenarioRunner::new(42).with_steps(60).run(ScenarioId::HeadOn).unwrap();

        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.worst_severity, Some(Severity::Critical));
        assert_eq!(result.total_steps, 60);
        assert!(result.stats.direct.attempted > 0);
        assert!(result.stats.relay.attempted > 0);
    }

    #[test]
    fn test_intersection_passes() {
        let result = ScenarioRunner::new(42).with_steps(100).run(ScenarioId::Intersection).unwrap();
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.worst_severity, Some(Severity::High));
    }

    #[test]
    fn test_platoon_is_silent() {
        let result = ScenarioRunner::new(42).with_steps(200).run(ScenarioId::Platoon).unwrap();
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.stats.total_collisions(), 0);
        assert_eq!(result.stats.messages().attempted, 0);
    }

    #[test]
    fn test_highway_is_consistent() {
        let result = ScenarioRunner::new(7).with_steps(150).with_vehicles(20).run(ScenarioId::Highway).unwrap();
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.stats.steps, result.total_steps);
    }

    #[test]
    fn test_lossy_highway_delivery_ratio() {
        let result = ScenarioRunner::new(3).with_steps(300).run(ScenarioId::LossyHighway).unwrap();
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.vanet.packet_loss_rate, 0.5);
    }

    #[test]
    fn test_same_seed_same_result() {
        let runner = ScenarioRunner::new(11).with_steps(100).with_vehicles(15);
        let (r1, s1) = runner.run_with_sink(ScenarioId::Highway, VecSink::new()).unwrap();
        let (r2, s2) = runner.run_with_sink(ScenarioId::Highway, VecSink::new()).unwrap();

        assert_eq!(r1.stats, r2.stats);
        assert_eq!(s1.records(), s2.records());
    }

    #[test]
    fn test_records_end_with_marker() {
        let (result, sink) = ScenarioRunner::new(42)
            .with_steps(30)
            .run_with_sink(ScenarioId::HeadOn, VecSink::new())
            .unwrap();

        let records = sink.records();
        assert_eq!(records.last(), Some(&SimRecord::End));
        let collisions = records.iter().filter(|r| matches!(r, SimRecord::Collision(_))).count() as u64;
        assert_eq!(collisions, result.stats.total_collisions());
    }

    #[test]
    fn test_expectation_failure_is_reported() {
        // Only the step where the pair coincides passes a 1m prefilter, and zero separation has no finite TTC
        let vanet = VanetConfig {
            distance_threshold: 1.0,
            ..Default::default()
        };
        let result = ScenarioRunner::new(42)
            .with_steps(60)
            .with_vanet_config(vanet)
            .run(ScenarioId::HeadOn)
            .unwrap();

        assert!(!result.passed);
        assert!(result.failure_reason.is_some());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_highway_consistent_for_any_seed(seed in any::<u64>(), noise in 0.0f64..1.0) {
            let result = ScenarioRunner::new(seed)
                .with_steps(50)
                .with_vehicles(12)
                .with_position_noise(noise)
                .run(ScenarioId::Highway)
                .unwrap();

            prop_assert!(result.passed, "{:?}", result.failure_reason);
            prop_assert_eq!(result.stats.sink_errors, 0);
        }
    }
}
