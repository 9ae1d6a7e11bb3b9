//! Dual-wheel driver: two [`CascadeController`]s, ticked together
//! (`spec.md §4.7`).

use crate::controller::CascadeController;
use crate::param::DualControlParams;
use crate::segway::Side;
use crate::ConfigError;

/// Where a wheel's final actuator command goes. The driver never holds the
/// motor driver handle itself — only a reference to something that
/// implements this — mirroring `odometry.rs`'s `Motor<S>` split between the
/// control math and the concrete sink.
pub trait MotorSink {
    fn set_motor_command(&mut self, side: Side, command: f32);
}

/// Two [`CascadeController`]s, one per side, ticked together each base
/// period. Each controller carries its own optional segway feedforward
/// getters and enable flag (`spec.md §3`'s data model attaches these to the
/// per-wheel controller, mirroring `motor_controller_t`'s `theta`/`thetad`
/// getters in the original source) — this driver only forwards
/// configuration calls to both sides.
pub struct DualWheelController<'a> {
    left: CascadeController<'a>,
    right: CascadeController<'a>,
}

impl<'a> DualWheelController<'a> {
    #[must_use]
    pub const fn new(params: &'a DualControlParams) -> Self {
        Self {
            left: CascadeController::new(&params.left, Side::Left),
            right: CascadeController::new(&params.right, Side::Right),
        }
    }

    #[must_use]
    pub fn left(&self) -> &CascadeController<'a> {
        &self.left
    }

    #[must_use]
    pub fn right(&self) -> &CascadeController<'a> {
        &self.right
    }

    pub fn left_mut(&mut self) -> &mut CascadeController<'a> {
        &mut self.left
    }

    pub fn right_mut(&mut self) -> &mut CascadeController<'a> {
        &mut self.right
    }

    /// Binds the same chassis pitch and pitch-rate getters to both sides —
    /// there is one physical attitude estimate shared by both wheels.
    pub fn set_pitch_getters(
        &mut self,
        pitch: Option<&'a dyn Fn() -> f32>,
        pitch_rate: Option<&'a dyn Fn() -> f32>,
    ) {
        self.left.set_pitch_getter(pitch);
        self.left.set_pitch_rate_getter(pitch_rate);
        self.right.set_pitch_getter(pitch);
        self.right.set_pitch_rate_getter(pitch_rate);
    }

    /// Enables or disables segway feedforward on both sides together.
    pub fn set_segway_enabled(&mut self, enabled: bool) {
        self.left.set_segway_enabled(enabled);
        self.right.set_segway_enabled(enabled);
    }

    pub fn set_frequency(&mut self, base_hz: f32) -> Result<(), ConfigError> {
        self.left.set_frequency(base_hz)?;
        self.right.set_frequency(base_hz)?;
        Ok(())
    }

    pub fn set_prescaler(
        &mut self,
        velocity_divider: u32,
        position_divider: u32,
    ) -> Result<(), ConfigError> {
        self.left.set_prescaler(velocity_divider, position_divider)?;
        self.right.set_prescaler(velocity_divider, position_divider)?;
        Ok(())
    }

    /// Runs one tick of both cascades (each already including its own
    /// segway feedforward, if enabled) and hands the resulting commands to
    /// `sink`.
    pub fn process(&mut self, sink: &mut dyn MotorSink) {
        let left_command = self.left.process();
        let right_command = self.right.process();
        sink.set_motor_command(Side::Left, left_command);
        sink.set_motor_command(Side::Right, right_command);
    }
}

#[cfg(test)]
mod tests {
    use super::{DualWheelController, MotorSink};
    use crate::mode::Mode;
    use crate::param::DualControlParams;
    use crate::segway::Side;

    struct RecordingSink {
        left: f32,
        right: f32,
    }

    impl MotorSink for RecordingSink {
        fn set_motor_command(&mut self, side: Side, command: f32) {
            match side {
                Side::Left => self.left = command,
                Side::Right => self.right = command,
            }
        }
    }

    #[test]
    fn segway_disabled_by_default_leaves_cascade_output_untouched() {
        let params = DualControlParams::new();
        params.left.current.kp.set(1.0);
        params.right.current.kp.set(1.0);
        let mut dual = DualWheelController::new(&params);
        dual.set_frequency(1000.0).unwrap();
        dual.left_mut().set_mode(Mode::Current);
        dual.right_mut().set_mode(Mode::Current);
        dual.left_mut().set_target_current(1.0);
        dual.right_mut().set_target_current(1.0);

        let mut sink = RecordingSink {
            left: 0.0,
            right: 0.0,
        };
        dual.process(&mut sink);
        assert!((sink.left - -1.0).abs() < 1e-4);
        assert!((sink.right - -1.0).abs() < 1e-4);
    }

    #[test]
    fn segway_feedforward_is_antisymmetric_between_sides() {
        let params = DualControlParams::new();
        let mut dual = DualWheelController::new(&params);
        dual.set_frequency(1000.0).unwrap();
        dual.set_segway_enabled(true);
        let pitch = || 0.1f32;
        dual.set_pitch_getters(Some(&pitch), None);

        let mut sink = RecordingSink {
            left: 0.0,
            right: 0.0,
        };
        dual.process(&mut sink);
        assert!((sink.left + sink.right).abs() < 1e-3);
        assert!(sink.left > 0.0);
    }
}
