//! Inverted-pendulum (segway) voltage feedforward (`spec.md §4.6`).
//!
//! This is an additive per-wheel term computed from pitch/pitch-rate/wheel
//! velocity; the cascade controller knows nothing about it and it is summed
//! with `CascadeController::process`'s output by the actuator sink. Grounded
//! on `examples/original_source/src/motor_controller.c`'s
//! `segway_voltage_setpoint`.

/// Which wheel the feedforward is being computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Side {
    Left,
    Right,
}

const K_THETA: f32 = 11.0;
const K_THETA_DOT: f32 = 1.7;
const K_X_DOT: f32 = -1.58;

/// Radius of the drive wheel, used to convert angular wheel velocity to
/// linear wheel velocity for callers that only have the former.
pub const R_WHEEL: f32 = 0.034;

/// Converts angular wheel velocity (rad/s) to linear wheel velocity (m/s).
#[must_use]
pub fn wheel_linear_velocity(angular_velocity: f32) -> f32 {
    angular_velocity * R_WHEEL
}

/// Computes the segway feedforward voltage for one side.
///
/// `wheel_velocity` is already linear (m/s) — see [`wheel_linear_velocity`]
/// for converting from the wheel's angular rate. Left and right are always
/// sign-antisymmetric for equal inputs (`spec.md §8`, invariant 8).
#[must_use]
pub fn feedforward(side: Side, pitch: f32, pitch_rate: f32, wheel_velocity: f32) -> f32 {
    let magnitude = K_THETA * pitch - K_THETA_DOT * pitch_rate - K_X_DOT * wheel_velocity;
    match side {
        Side::Left => magnitude,
        Side::Right => -magnitude,
    }
}

#[cfg(test)]
mod tests {
    use super::{feedforward, Side};
    use proptest::prelude::*;

    /// Scenario S6.
    #[test]
    fn s6_segway_constants() {
        let left = feedforward(Side::Left, 0.1, 0.0, 0.0);
        let right = feedforward(Side::Right, 0.1, 0.0, 0.0);
        assert!((left - 1.1).abs() < 1e-4);
        assert!((right - -1.1).abs() < 1e-4);
    }

    proptest! {
        /// Invariant 8: left and right are always sign-antisymmetric for
        /// equal inputs.
        #[test]
        fn prop_segway_sign_symmetry(
            pitch in -3.14f32..3.14,
            pitch_rate in -10.0f32..10.0,
            wheel_velocity in -5.0f32..5.0,
        ) {
            let left = feedforward(Side::Left, pitch, pitch_rate, wheel_velocity);
            let right = feedforward(Side::Right, pitch, pitch_rate, wheel_velocity);
            prop_assert!((left + right).abs() < 1e-3);
        }
    }
}
