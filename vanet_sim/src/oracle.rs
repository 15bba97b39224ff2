//! Ground truth traffic oracle.
//!
//! Stands in for the external traffic simulator:
//! - True positions of all vehicles
//! - Constant-velocity kinematics in the compass-heading convention
//! - Departure when a vehicle leaves the world bounds
//! - Optional Gaussian noise on reported positions

use nalgebra::Vector2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};
use vanet_core::clock::DEFAULT_STEP_LENGTH;
use vanet_core::geometry;
use vanet_env::{AgentId, AgentState, EnvError, Snapshot, SnapshotSource};

/// Passenger-car footprint used for every spawned vehicle (m).
pub const VEHICLE_LENGTH: f64 = 5.0;
pub const VEHICLE_WIDTH: f64 = 1.8;

/// Half-width of the square world (m).
pub const DEFAULT_WORLD_HALF_EXTENT: f64 = 500.0;

/// A ground truth vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: AgentId,

    /// Position [x, y] in meters
    pub position: Vector2<f64>,

    /// m/s, non-negative
    pub speed: f64,

    /// Compass degrees, 0 = north, clockwise
    pub heading: f64,

    /// False once the vehicle has left the world
    pub active: bool,
}

/// The Oracle - owns ground truth and produces one snapshot per step.
pub struct TrafficOracle {
    /// RNG for placement, speed jitter and sensor noise
    physics_rng: ChaCha8Rng,

    vehicles: BTreeMap<AgentId, Vehicle>,

    next_id: u64,

    /// Seconds advanced by each `next_snapshot`
    step_length: f64,

    current_time: f64,

    half_extent: f64,

    /// Position noise standard deviation (meters)
    position_noise_std: f64,
}

impl TrafficOracle {
    /// Creates an empty world with the given physics seed.
    pub fn new(physics_seed: u64) -> Self {
        Self {
            physics_rng: ChaCha8Rng::seed_from_u64(physics_seed),
            vehicles: BTreeMap::new(),
            next_id: 0,
            step_length: DEFAULT_STEP_LENGTH,
            current_time: 0.0,
            half_extent: DEFAULT_WORLD_HALF_EXTENT,
            position_noise_std: 0.0,
        }
    }

    pub fn with_step_length(mut self, step_length: f64) -> Self {
        self.step_length = step_length;
        self
    }

    pub fn with_bounds(mut self, half_extent: f64) -> Self {
        self.half_extent = half_extent;
        self
    }

    /// Sets the position noise standard deviation. Zero disables noise.
    pub fn set_position_noise(&mut self, std_dev: f64) {
        self.position_noise_std = std_dev.max(0.0);
    }

    /// Spawns a vehicle with the next `veh_<n>` id.
    pub fn spawn_vehicle(&mut self, position: Vector2<f64>, speed: f64, heading: f64) -> Result<AgentId, EnvError> {
        let id = AgentId::new(format!("veh_{}", self.next_id));

        // Reject bad kinematics now rather than at snapshot time
        AgentState::new(id.clone(), [position.x, position.y], speed, heading, VEHICLE_LENGTH, VEHICLE_WIDTH)?;

        self.next_id += 1;
        self.vehicles.insert(
            id.clone(),
            Vehicle {
                id: id.clone(),
                position,
                speed,
                heading,
                active: true,
            },
        );
        Ok(id)
    }

    /// Spawns `count` vehicles on a two-lane road along the x axis.
    ///
    /// Lane y = 0 runs east (heading 90), lane y = 3.5 runs west (heading 270).
    /// Speeds are drawn from `Normal(mean_speed, speed_std)` and clamped at zero.
    pub fn spawn_highway(
        &mut self,
        count: usize,
        road_half_length: f64,
        mean_speed: f64,
        speed_std: f64,
    ) -> Result<Vec<AgentId>, EnvError> {
        let speeds = Normal::new(mean_speed, speed_std.max(0.0))
            .map_err(|e| EnvError::invalid_state("highway", e.to_string()))?;

        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let eastbound = self.physics_rng.gen_bool(0.5);
            let x = self.physics_rng.gen_range(-road_half_length..=road_half_length);
            let speed = speeds.sample(&mut self.physics_rng).max(0.0);
            let (y, heading) = if eastbound { (0.0, 90.0) } else { (3.5, 270.0) };
            ids.push(self.spawn_vehicle(Vector2::new(x, y), speed, heading)?);
        }
        Ok(ids)
    }

    /// Advances kinematics by `dt` seconds and retires vehicles that left the world.
    pub fn step(&mut self, dt: f64) {
        self.current_time += dt;

        for vehicle in self.vehicles.values_mut().filter(|v| v.active) {
            vehicle.position += geometry::velocity_from_heading(vehicle.speed, vehicle.heading) * dt;

            if vehicle.position.x.abs() > self.half_extent || vehicle.position.y.abs() > self.half_extent {
                debug!("{} left the world at t={:.1}s", vehicle.id, self.current_time);
                vehicle.active = false;
            }
        }
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.current_time
    }

    pub fn vehicle(&self, id: &AgentId) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    pub fn active_count(&self) -> usize {
        self.vehicles.values().filter(|v| v.active).count()
    }

    /// Builds the snapshot the engines would see, noise included.
    pub fn snapshot(&mut self) -> Snapshot {
        let noise = if self.position_noise_std > 0.0 {
            Normal::new(0.0, self.position_noise_std).ok()
        } else {
            None
        };

        let mut snapshot = Snapshot::new();
        for vehicle in self.vehicles.values().filter(|v| v.active) {
            let mut position = [vehicle.position.x, vehicle.position.y];
            if let Some(normal) = &noise {
                position[0] += normal.sample(&mut self.physics_rng);
                position[1] += normal.sample(&mut self.physics_rng);
            }

            let inserted = AgentState::new(
                vehicle.id.clone(),
                position,
                vehicle.speed,
                vehicle.heading,
                VEHICLE_LENGTH,
                VEHICLE_WIDTH,
            )
            .and_then(|state| snapshot.insert(state));

            if let Err(e) = inserted {
                warn!("Skipping {} in snapshot: {}", vehicle.id, e);
            }
        }
        snapshot
    }
}

impl SnapshotSource for TrafficOracle {
    fn next_snapshot(&mut self) -> Option<Snapshot> {
        self.step(self.step_length);
        Some(self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_oracle_spawn_vehicle() {
        let mut oracle = TrafficOracle::new(42);
        let id = oracle.spawn_vehicle(Vector2::new(100.0, 200.0), 10.0, 90.0).unwrap();

        assert_eq!(id.as_str(), "veh_0");
        let vehicle = oracle.vehicle(&id).unwrap();
        assert_eq!(vehicle.position.x, 100.0);
        assert!(vehicle.active);

        // Invalid heading is refused and does not consume an id
        assert!(oracle.spawn_vehicle(Vector2::zeros(), 10.0, 400.0).is_err());
        let next = oracle.spawn_vehicle(Vector2::zeros(), 0.0, 0.0).unwrap();
        assert_eq!(next.as_str(), "veh_1");
    }

    #[test]
    fn test_oracle_compass_kinematics() {
        let mut oracle = TrafficOracle::new(42);
        let east = oracle.spawn_vehicle(Vector2::zeros(), 20.0, 90.0).unwrap();
        let north = oracle.spawn_vehicle(Vector2::zeros(), 10.0, 0.0).unwrap();

        oracle.step(1.0);

        let e = oracle.vehicle(&east).unwrap().position;
        let n = oracle.vehicle(&north).unwrap().position;
        assert_relative_eq!(e.x, 20.0, epsilon = 1e-9);
        assert_relative_eq!(e.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(n.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(n.y, 10.0, epsilon = 1e-9);
        assert_relative_eq!(oracle.time(), 1.0);
    }

    #[test]
    fn test_oracle_departure() {
        let mut oracle = TrafficOracle::new(42).with_bounds(50.0);
        let id = oracle.spawn_vehicle(Vector2::new(45.0, 0.0), 10.0, 90.0).unwrap();
        oracle.spawn_vehicle(Vector2::zeros(), 0.0, 0.0).unwrap();

        oracle.step(1.0);

        assert!(!oracle.vehicle(&id).unwrap().active);
        assert_eq!(oracle.active_count(), 1);
        assert!(!oracle.snapshot().contains(&id));
    }

    #[test]
    fn test_oracle_snapshot_source() {
        let mut oracle = TrafficOracle::new(42).with_step_length(0.5);
        let id = oracle.spawn_vehicle(Vector2::zeros(), 10.0, 90.0).unwrap();

        let snapshot = oracle.next_snapshot().unwrap();
        let state = snapshot.get(&id).unwrap();
        assert_relative_eq!(state.position()[0], 5.0, epsilon = 1e-9);
        assert_eq!(state.length(), VEHICLE_LENGTH);
    }

    #[test]
    fn test_oracle_deterministic_highway() {
        let mut o1 = TrafficOracle::new(7);
        let mut o2 = TrafficOracle::new(7);
        o1.spawn_highway(20, 200.0, 25.0, 3.0).unwrap();
        o2.spawn_highway(20, 200.0, 25.0, 3.0).unwrap();

        // Same seed = same traffic
        assert_eq!(o1.snapshot(), o2.snapshot());
        assert_eq!(o1.active_count(), 20);
    }

    #[test]
    fn test_oracle_deterministic_noise() {
        let mut o1 = TrafficOracle::new(42);
        let mut o2 = TrafficOracle::new(42);
        for oracle in [&mut o1, &mut o2] {
            oracle.spawn_vehicle(Vector2::zeros(), 0.0, 0.0).unwrap();
            oracle.set_position_noise(0.5);
        }

        let s1 = o1.snapshot();
        assert_eq!(s1, o2.snapshot());

        let id = AgentId::from("veh_0");
        assert_ne!(s1.get(&id).unwrap().position(), [0.0, 0.0]);
    }
}
