//! Traffic scenarios for the reference harness.

use crate::oracle::TrafficOracle;
use nalgebra::Vector2;
use vanet_env::{EnvError, Severity};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Two vehicles closing head-on at different speeds, one parked bystander
    HeadOn,

    /// Two vehicles converging on the same junction at right angles
    Intersection,

    /// Four vehicles in a steady convoy
    Platoon,

    /// Seeded two-way traffic on a straight road
    Highway,

    /// Highway with half of all warnings lost
    LossyHighway,
}

/// What a scenario must produce to pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expectation {
    /// At least one candidate, every candidate is this pair, worst tier as given
    PairAtRisk {
        first: &'static str,
        second: &'static str,
        worst: Severity,
    },

    /// The engines must stay silent
    NoCandidates,

    /// Delivery ratio within `tolerance` of `ratio` over at least `min_attempts`
    DeliveryNear {
        ratio: f64,
        tolerance: f64,
        min_attempts: u64,
    },

    /// Only structural checks (thresholds and radio range respected)
    Consistent,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::HeadOn,
            ScenarioId::Intersection,
            ScenarioId::Platoon,
            ScenarioId::Highway,
            ScenarioId::LossyHighway,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::HeadOn => "head_on",
            ScenarioId::Intersection => "intersection",
            ScenarioId::Platoon => "platoon",
            ScenarioId::Highway => "highway",
            ScenarioId::LossyHighway => "lossy_highway",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::HeadOn => "10 m/s vs 25 m/s head-on with a parked bystander, expect CRITICAL",
            ScenarioId::Intersection => "Right-angle approach at equal speed, expect HIGH at worst",
            ScenarioId::Platoon => "Convoy at identical velocity, expect no warnings",
            ScenarioId::Highway => "Random two-way traffic, structural checks only",
            ScenarioId::LossyHighway => "Random two-way traffic at 50% packet loss",
        }
    }

    /// Loss rate this scenario forces regardless of configuration.
    pub fn loss_override(&self) -> Option<f64> {
        match self {
            ScenarioId::LossyHighway => Some(0.5),
            _ => None,
        }
    }

    pub fn expectation(&self) -> Expectation {
        match self {
            ScenarioId::HeadOn => Expectation::PairAtRisk {
                first: "veh_0",
                second: "veh_1",
                worst: Severity::Critical,
            },
            ScenarioId::Intersection => Expectation::PairAtRisk {
                first: "veh_0",
                second: "veh_1",
                worst: Severity::High,
            },
            ScenarioId::Platoon => Expectation::NoCandidates,
            ScenarioId::Highway => Expectation::Consistent,
            ScenarioId::LossyHighway => Expectation::DeliveryNear {
                ratio: 0.5,
                tolerance: 0.1,
                min_attempts: 200,
            },
        }
    }

    /// Places the scenario's vehicles into an empty oracle.
    ///
    /// `vehicles` only applies to the random-traffic scenarios.
    pub fn populate(&self, oracle: &mut TrafficOracle, vehicles: usize) -> Result<(), EnvError> {
        match self {
            ScenarioId::HeadOn => {
                oracle.spawn_vehicle(Vector2::new(0.0, 0.0), 10.0, 90.0)?;
                oracle.spawn_vehicle(Vector2::new(70.0, 0.0), 25.0, 270.0)?;
                oracle.spawn_vehicle(Vector2::new(35.0, 40.0), 0.0, 0.0)?;
            }
            ScenarioId::Intersection => {
                oracle.spawn_vehicle(Vector2::new(0.0, -60.0), 10.0, 0.0)?;
                oracle.spawn_vehicle(Vector2::new(-60.0, 0.0), 10.0, 90.0)?;
            }
            ScenarioId::Platoon => {
                for i in 0..4 {
                    oracle.spawn_vehicle(Vector2::new(-15.0 * i as f64, 0.0), 20.0, 90.0)?;
                }
            }
            ScenarioId::Highway | ScenarioId::LossyHighway => {
                oracle.spawn_highway(vehicles, 300.0, 25.0, 3.0)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "head_on" | "headon" => Ok(ScenarioId::HeadOn),
            "intersection" => Ok(ScenarioId::Intersection),
            "platoon" => Ok(ScenarioId::Platoon),
            "highway" => Ok(ScenarioId::Highway),
            "lossy_highway" | "lossyhighway" | "lossy" => Ok(ScenarioId::LossyHighway),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
