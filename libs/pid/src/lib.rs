//! Discrete-time PID primitive.
//!
//! A single-input single-output regulator that is a pure function of its own
//! state: [`Pid::process`] takes an error and returns an output, updating the
//! integrator and the last-error sample as its only side effect. It has no
//! notion of parameters, dividers, or modes — those live one layer up.

#![cfg_attr(any(not(test), target_arch = "arm"), no_std)]

/// Errors returned by the configuration calls. The controller never panics;
/// a rejected call leaves the PID in its previous, still-valid configuration.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PidError {
    /// `set_frequency` was called with a non-positive value.
    InvalidArgument,
}

/// Clamp `x` symmetrically to `[-limit, limit]`.
///
/// NaN is never masked: if `x` is NaN, it is returned unchanged, per the
/// single-precision IEEE-754 semantics this controller is specified to use.
/// `limit == f32::INFINITY` disables the clamp.
#[must_use]
pub fn limit_symmetric(x: f32, limit: f32) -> f32 {
    if x.is_nan() {
        x
    } else if x > limit {
        limit
    } else if x < -limit {
        -limit
    } else {
        x
    }
}

/// Discrete PID controller over `f32`.
///
/// `process(error)` is the only per-tick entry point; everything else
/// reconfigures the controller between ticks.
#[derive(Debug, Clone, Copy)]
pub struct Pid {
    kp: f32,
    ki: f32,
    kd: f32,
    i_limit: f32,
    frequency_hz: f32,
    integrator: f32,
    previous_error: f32,
    previous_output: f32,
}

impl Pid {
    /// Creates a zeroed PID running at `frequency_hz` with an unbounded
    /// integrator. `frequency_hz` must be positive; callers that can't
    /// guarantee that at construction time should build with `1.0` and call
    /// [`Pid::set_frequency`] immediately.
    #[must_use]
    pub const fn new(frequency_hz: f32) -> Self {
        Self {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            i_limit: f32::INFINITY,
            frequency_hz,
            integrator: 0.0,
            previous_error: 0.0,
            previous_output: 0.0,
        }
    }

    #[must_use]
    pub fn kp(&self) -> f32 {
        self.kp
    }

    #[must_use]
    pub fn ki(&self) -> f32 {
        self.ki
    }

    #[must_use]
    pub fn kd(&self) -> f32 {
        self.kd
    }

    #[must_use]
    pub fn i_limit(&self) -> f32 {
        self.i_limit
    }

    #[must_use]
    pub fn frequency(&self) -> f32 {
        self.frequency_hz
    }

    #[must_use]
    pub fn integrator(&self) -> f32 {
        self.integrator
    }

    #[must_use]
    pub fn previous_output(&self) -> f32 {
        self.previous_output
    }

    /// Runs one control step. Integrator accumulates `error / frequency_hz`,
    /// clamped to `±i_limit`; the derivative term is a one-sample backward
    /// difference scaled by `frequency_hz`. NaN in `error` propagates to the
    /// output and to `integrator`/`previous_error` rather than being masked.
    pub fn process(&mut self, error: f32) -> f32 {
        let dt = 1.0 / self.frequency_hz;
        self.integrator = limit_symmetric(self.integrator + error * dt, self.i_limit);
        let derivative = (error - self.previous_error) * self.frequency_hz;
        self.previous_error = error;

        let output = self.kp * error + self.ki * self.integrator + self.kd * derivative;
        self.previous_output = output;
        output
    }

    /// Sets new gains and resets the integrator to 0. A gain change without
    /// a corresponding integrator reset would otherwise apply the new `ki`
    /// to an integral accumulated under the old gains.
    pub fn set_gains(&mut self, kp: f32, ki: f32, kd: f32) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
        self.integrator = 0.0;
    }

    /// Sets a new symmetric integral limit, immediately clamping any
    /// integrator value already outside the new bound.
    pub fn set_integral_limit(&mut self, limit: f32) {
        self.i_limit = limit;
        self.integrator = limit_symmetric(self.integrator, limit);
    }

    /// Sets the sample frequency used for both integration and
    /// differentiation. Rejects non-positive values, leaving the previous
    /// frequency in place.
    pub fn set_frequency(&mut self, frequency_hz: f32) -> Result<(), PidError> {
        if frequency_hz > 0.0 {
            self.frequency_hz = frequency_hz;
            Ok(())
        } else {
            Err(PidError::InvalidArgument)
        }
    }

    /// Zeroes the integrator and the last-error sample, leaving gains,
    /// limit, and frequency untouched.
    pub fn reset(&mut self) {
        self.integrator = 0.0;
        self.previous_error = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::{limit_symmetric, Pid};
    use proptest::prelude::*;

    #[test]
    fn p_gain_only() {
        let mut pid = Pid::new(1000.0);
        pid.set_gains(2.0, 0.0, 0.0);
        assert_eq!(pid.process(3.0), 6.0);
        assert_eq!(pid.process(-1.0), -2.0);
    }

    #[test]
    fn i_gain_accumulates_and_resets_on_regain() {
        let mut pid = Pid::new(1.0);
        pid.set_gains(0.0, 1.0, 0.0);
        assert_eq!(pid.process(1.0), 1.0);
        assert_eq!(pid.process(1.0), 2.0);
        pid.set_gains(0.0, 1.0, 0.0);
        assert_eq!(pid.integrator(), 0.0);
        assert_eq!(pid.process(1.0), 1.0);
    }

    #[test]
    fn d_gain_backward_difference() {
        let mut pid = Pid::new(1.0);
        pid.set_gains(0.0, 0.0, 1.0);
        assert_eq!(pid.process(0.0), 0.0);
        assert_eq!(pid.process(1.0), 1.0);
        assert_eq!(pid.process(1.0), 0.0);
    }

    #[test]
    fn integral_clamp_applies_immediately() {
        let mut pid = Pid::new(1.0);
        pid.set_gains(0.0, 1.0, 0.0);
        pid.set_integral_limit(5.0);
        assert_eq!(pid.process(100.0), 5.0);
        pid.set_integral_limit(2.0);
        assert_eq!(pid.integrator(), 2.0);
    }

    #[test]
    fn infinite_limit_disables_clamp() {
        let mut pid = Pid::new(1.0);
        pid.set_gains(0.0, 1.0, 0.0);
        for _ in 0..1000 {
            pid.process(1000.0);
        }
        assert_eq!(pid.integrator(), 1_000_000.0);
    }

    #[test]
    fn nan_propagates_rather_than_being_masked() {
        let mut pid = Pid::new(1.0);
        pid.set_gains(1.0, 1.0, 1.0);
        assert!(pid.process(f32::NAN).is_nan());
        assert!(pid.integrator().is_nan());
    }

    #[test]
    fn set_frequency_rejects_non_positive() {
        let mut pid = Pid::new(100.0);
        assert!(pid.set_frequency(0.0).is_err());
        assert!(pid.set_frequency(-1.0).is_err());
        assert_eq!(pid.frequency(), 100.0);
        assert!(pid.set_frequency(50.0).is_ok());
        assert_eq!(pid.frequency(), 50.0);
    }

    #[test]
    fn reset_zeroes_integrator_and_previous_error() {
        let mut pid = Pid::new(1.0);
        pid.set_gains(0.0, 1.0, 1.0);
        pid.process(3.0);
        pid.reset();
        assert_eq!(pid.integrator(), 0.0);
        // Derivative of the next sample is now taken against 0, not 3.
        assert_eq!(pid.process(0.0), 0.0);
    }

    #[test]
    fn limit_symmetric_is_symmetric_for_all_finite_inputs() {
        assert_eq!(limit_symmetric(10.0, 5.0), 5.0);
        assert_eq!(limit_symmetric(-10.0, 5.0), -5.0);
        assert_eq!(limit_symmetric(3.0, 5.0), 3.0);
        assert_eq!(limit_symmetric(5.0, f32::INFINITY), 5.0);
    }

    proptest! {
        /// Invariant 1: a gain change always resets the integrator to 0,
        /// regardless of what it held before.
        #[test]
        fn prop_gain_change_resets_integrator(
            errors in prop::collection::vec(-1000.0f32..1000.0, 0..20),
            kp in -10.0f32..10.0,
            ki in -10.0f32..10.0,
            kd in -10.0f32..10.0,
        ) {
            let mut pid = Pid::new(1000.0);
            pid.set_gains(1.0, 1.0, 0.0);
            for e in errors {
                pid.process(e);
            }
            pid.set_gains(kp, ki, kd);
            prop_assert_eq!(pid.integrator(), 0.0);
        }

        /// Invariant 2: after every `process` call, the integrator stays
        /// within `[-i_limit, i_limit]`.
        #[test]
        fn prop_integrator_stays_within_limit(
            errors in prop::collection::vec(-1e6f32..1e6, 1..50),
            limit in 0.0f32..1000.0,
        ) {
            let mut pid = Pid::new(1000.0);
            pid.set_gains(0.0, 1.0, 0.0);
            pid.set_integral_limit(limit);
            for e in errors {
                pid.process(e);
                prop_assert!(pid.integrator().abs() <= limit + f32::EPSILON);
            }
        }

        /// Invariant 7: `limit_symmetric` clamps any finite `x` into
        /// `[-L, L]` for any non-negative finite `L`.
        #[test]
        fn prop_limit_symmetric_clamps(x in -1e6f32..1e6, limit in 0.0f32..1e6) {
            let clamped = limit_symmetric(x, limit);
            prop_assert!(clamped >= -limit && clamped <= limit);
        }
    }
}
