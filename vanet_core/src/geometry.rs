//! Planar kinematics shared by the engines.
//!
//! Positions are meters in a flat 2D frame. Headings use the compass
//! convention of traffic simulators (0° = north, clockwise), which is
//! converted to the mathematical convention (0° = east, counter-clockwise)
//! before any trigonometry.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Relative speeds below this (m/s) are treated as "not closing".
pub const MIN_CLOSING_SPEED: f64 = 0.1;

/// Default miss distance (m) under which two vehicles count as colliding.
pub const DEFAULT_COLLISION_RADIUS: f64 = 2.5;

/// Converts a position array into a vector.
pub fn to_vector(position: [f64; 2]) -> Vector2<f64> {
    Vector2::new(position[0], position[1])
}

/// Euclidean distance between two positions.
pub fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (to_vector(b) - to_vector(a)).norm()
}

/// Compass heading (clockwise from north) to math angle (counter-clockwise from east), degrees.
pub fn compass_to_math_deg(heading_deg: f64) -> f64 {
    (90.0 - heading_deg).rem_euclid(360.0)
}

/// Velocity vector for a speed along a compass heading.
pub fn velocity_from_heading(speed: f64, heading_deg: f64) -> Vector2<f64> {
    let angle = compass_to_math_deg(heading_deg).to_radians();
    Vector2::new(speed * angle.cos(), speed * angle.sin())
}

/// Math-convention angle of the segment `from -> to`, normalized to `[0, 360)`.
pub fn bearing_deg(from: [f64; 2], to: [f64; 2]) -> f64 {
    let dx = to[0] - from[0];
    let dy = to[1] - from[1];
    dy.atan2(dx).to_degrees().rem_euclid(360.0)
}

/// Constant-velocity projection of a position `dt` seconds ahead.
pub fn predict_position(position: [f64; 2], speed: f64, heading_deg: f64, dt: f64) -> [f64; 2] {
    let next = to_vector(position) + velocity_from_heading(speed, heading_deg) * dt;
    [next.x, next.y]
}

/// Point of minimum separation under constant-velocity extrapolation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosestApproach {
    /// Seconds from now until minimum separation
    pub time: f64,

    /// Separation at that moment (m)
    pub distance: f64,
}

/// Closest point of approach for relative position `dp = pB - pA` and
/// relative velocity `dv = vB - vA`.
///
/// Returns `None` when the pair is not closing: relative speed below
/// [`MIN_CLOSING_SPEED`], or `dp·dv >= 0` (separating or constant range).
pub fn closest_approach(dp: &Vector2<f64>, dv: &Vector2<f64>) -> Option<ClosestApproach> {
    if dv.norm() < MIN_CLOSING_SPEED {
        return None;
    }

    let dot = dp.dot(dv);
    if dot >= 0.0 {
        return None;
    }

    let time = -dot / dv.dot(dv);
    let distance = (dp + dv * time).norm();
    Some(ClosestApproach { time, distance })
}

/// Time until minimum separation, `f64::INFINITY` when the pair is not closing.
pub fn time_to_collision(dp: &Vector2<f64>, dv: &Vector2<f64>) -> f64 {
    closest_approach(dp, dv).map_or(f64::INFINITY, |cpa| cpa.time)
}

/// Stricter TTC: only finite when the predicted miss distance is below `radius`.
///
/// Near-zero relative velocity (< 1e-4 m/s) and approaches already in the
/// past both yield infinity.
pub fn ttc_within_radius(dp: &Vector2<f64>, dv: &Vector2<f64>, radius: f64) -> f64 {
    let speed = dv.norm();
    if speed < 1e-4 {
        return f64::INFINITY;
    }

    let t_closest = -dp.dot(dv) / (speed * speed);
    if t_closest < 0.0 {
        return f64::INFINITY;
    }

    let miss = (dp + dv * t_closest).norm();
    if miss < radius {
        t_closest
    } else {
        f64::INFINITY
    }
}
