//! Severity policy shared by the collision and dissemination engines.
//!
//! Both engines (and any external consumer) must call [`classify`]; a pair's
//! severity is never derived anywhere else.

pub use vanet_env::Severity;

/// TTC below which a pair is at least HIGH (s).
pub const IMMINENT_TTC: f64 = 1.0;

/// TTC below which a pair is at least MEDIUM (s).
pub const NEAR_TTC: f64 = 2.0;

/// Speed difference above which an imminent pair becomes CRITICAL (m/s).
pub const CRITICAL_RELATIVE_SPEED: f64 = 10.0;

/// Classifies a pair from its time-to-collision and speed difference.
///
/// | condition                                | tier     |
/// |------------------------------------------|----------|
/// | `ttc < 1.0` and `relative_speed > 10.0`  | CRITICAL |
/// | `ttc < 1.0`                              | HIGH     |
/// | `1.0 <= ttc < 2.0`                       | MEDIUM   |
/// | `ttc >= 2.0`                             | LOW      |
///
/// Total over all inputs; NaN falls through to LOW.
pub fn classify(ttc: f64, relative_speed: f64) -> Severity {
    if ttc < IMMINENT_TTC {
        if relative_speed > CRITICAL_RELATIVE_SPEED {
            Severity::Critical
        } else {
            Severity::High
        }
    } else if ttc < NEAR_TTC {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Absolute difference of two scalar speeds.
pub fn relative_speed(speed_a: f64, speed_b: f64) -> f64 {
    (speed_a - speed_b).abs()
}
