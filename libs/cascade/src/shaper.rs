//! Motion shaper: a jerk-free-ish bang-bang-with-braking position/velocity
//! profile generator (`spec.md §4.4`).
//!
//! Grounded directly on `motor_controller.c`'s `motor_controller_vel_ramp`,
//! `motor_controller_pos_setpt_interpolation`, and
//! `motor_controller_vel_setpt_interpolation`, renamed to Rust conventions
//! and folded into one public entry point, [`step`], since the cascade
//! controller only ever needs the combined "next acceleration, then
//! integrate" result.

use pid::limit_symmetric;

/// `sign(0)` is `+1` per `spec.md §4.4`'s platform convention; unlike
/// `f32::signum`, this also treats `-0.0` as `+1` rather than `-1`, since
/// `-0.0 < 0.0` is false under IEEE-754 comparison.
fn sign(x: f32) -> f32 {
    if x < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Time-optimal (bang-bang, under velocity/acceleration bounds) choice of
/// acceleration to apply over the next `delta_t`.
fn next_acceleration(
    position: f32,
    velocity: f32,
    target_position: f32,
    delta_t: f32,
    max_velocity: f32,
    max_acceleration: f32,
) -> f32 {
    let error = position - target_position;
    let braking_distance = velocity * velocity / (2.0 * max_acceleration);
    let eps = max_acceleration * delta_t * delta_t / 2.0;
    let error_sign = sign(error);

    if error_sign != sign(velocity) {
        // Moving toward the target.
        if error.abs() <= braking_distance || error.abs() <= eps {
            -limit_symmetric(velocity / delta_t, max_acceleration)
        } else if velocity.abs() >= max_velocity {
            0.0
        } else {
            -error_sign * max_acceleration
        }
    } else {
        // Moving away, or stationary with a non-zero error.
        if error.abs() <= eps {
            -limit_symmetric(velocity / delta_t, max_acceleration)
        } else {
            -error_sign * max_acceleration
        }
    }
}

/// Advances the shaper by one `delta_t`, returning `(new_position_setpoint,
/// new_velocity_setpoint)`.
///
/// `position`/`velocity` are the shaper's current position and velocity
/// setpoints (not the plant's measurement); `target_position` is the
/// externally requested target. `max_velocity`/`max_acceleration` of
/// `f32::INFINITY` disable the corresponding bound, per `spec.md §4.4`.
#[must_use]
pub fn step(
    position: f32,
    velocity: f32,
    target_position: f32,
    delta_t: f32,
    max_velocity: f32,
    max_acceleration: f32,
) -> (f32, f32) {
    let acceleration = next_acceleration(
        position,
        velocity,
        target_position,
        delta_t,
        max_velocity,
        max_acceleration,
    );
    let new_position = position + velocity * delta_t + acceleration * delta_t * delta_t / 2.0;
    let new_velocity = velocity + acceleration * delta_t;
    (new_position, new_velocity)
}
