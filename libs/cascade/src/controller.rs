//! The cascade controller: composes the position/velocity/current stages,
//! owns the mode state machine, and runs one `process()` tick
//! (`spec.md §4.5`).

use pid::limit_symmetric;

use crate::mode::Mode;
use crate::param::ControlParams;
use crate::segway::{self, Side};
use crate::shaper;
use crate::stage::CascadeStage;
use crate::ConfigError;

/// Composes the three stages of `spec.md §2`/§4.5 into one wheel's worth of
/// cascade control.
///
/// The controller owns its stages and their PIDs outright; it only
/// references the [`ControlParams`] subtree (never owns it — some other
/// part of the firmware, e.g. a static, does) and the sensor getters bound
/// into each stage via [`CascadeController::set_position_getter`] and
/// friends. Like `motor_controller_t` in the original source, it also holds
/// its own optional attitude getters (`theta`/`thetad`) for the segway
/// feedforward, rather than having that term threaded in from outside.
pub struct CascadeController<'a> {
    position: CascadeStage<'a>,
    velocity: CascadeStage<'a>,
    current: CascadeStage<'a>,
    limits: &'a crate::param::Limits,
    mode: Mode,
    base_frequency: f32,
    side: Side,
    segway_enabled: bool,
    pitch_getter: Option<&'a dyn Fn() -> f32>,
    pitch_rate_getter: Option<&'a dyn Fn() -> f32>,
}

impl<'a> CascadeController<'a> {
    /// Constructs a controller bound to `params`, zeroed, running at 1 Hz
    /// with divider 1 on every stage until [`CascadeController::set_frequency`]
    /// and [`CascadeController::set_prescaler`] are called. This matches
    /// `spec.md §3`'s lifecycle: "constructed zeroed, bound to a parameter
    /// subtree, configured with a base tick frequency and per-stage
    /// dividers, then ticked periodically." `side` determines the sign of
    /// the segway feedforward term (`spec.md §4.6`); it has no other effect
    /// and segway feedforward stays disabled until
    /// [`CascadeController::set_segway_enabled`] is called.
    #[must_use]
    pub const fn new(params: &'a ControlParams, side: Side) -> Self {
        Self {
            position: CascadeStage::new(&params.position, 1.0),
            velocity: CascadeStage::new(&params.velocity, 1.0),
            current: CascadeStage::new(&params.current, 1.0),
            limits: &params.limits,
            mode: Mode::Current,
            base_frequency: 1.0,
            side,
            segway_enabled: false,
            pitch_getter: None,
            pitch_rate_getter: None,
        }
    }

    pub fn set_position_getter(&mut self, getter: Option<&'a dyn Fn() -> f32>) {
        self.position.set_getter(getter);
    }

    pub fn set_velocity_getter(&mut self, getter: Option<&'a dyn Fn() -> f32>) {
        self.velocity.set_getter(getter);
    }

    pub fn set_current_getter(&mut self, getter: Option<&'a dyn Fn() -> f32>) {
        self.current.set_getter(getter);
    }

    /// Binds (or unbinds, with `None`) the chassis pitch and pitch-rate
    /// getters used by the segway feedforward. An external attitude
    /// estimator owns these; this crate never estimates pitch itself
    /// (`spec.md §1`, out of scope).
    pub fn set_pitch_getter(&mut self, getter: Option<&'a dyn Fn() -> f32>) {
        self.pitch_getter = getter;
    }

    pub fn set_pitch_rate_getter(&mut self, getter: Option<&'a dyn Fn() -> f32>) {
        self.pitch_rate_getter = getter;
    }

    /// Enables or disables the additive segway feedforward term. Disabled
    /// by default, since not every chassis built on this crate balances on
    /// two wheels (`spec.md §4.6`: the feedforward is optional and
    /// independent of the cascade).
    pub fn set_segway_enabled(&mut self, enabled: bool) {
        self.segway_enabled = enabled;
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn position_stage(&self) -> &CascadeStage<'a> {
        &self.position
    }

    #[must_use]
    pub fn velocity_stage(&self) -> &CascadeStage<'a> {
        &self.velocity
    }

    #[must_use]
    pub fn current_stage(&self) -> &CascadeStage<'a> {
        &self.current
    }

    /// Sets the base tick frequency, deriving each stage's effective PID
    /// frequency as `base_hz / divider` (current stage runs undivided).
    /// Rejects non-positive frequencies, leaving the previous configuration
    /// in place.
    pub fn set_frequency(&mut self, base_hz: f32) -> Result<(), ConfigError> {
        if base_hz <= 0.0 {
            defmt::warn!("rejected set_frequency: non-positive base frequency");
            return Err(ConfigError::InvalidFrequency);
        }
        self.current
            .pid_mut()
            .set_frequency(base_hz)
            .map_err(|_| ConfigError::InvalidFrequency)?;
        self.velocity
            .pid_mut()
            .set_frequency(base_hz / self.velocity.divider() as f32)
            .map_err(|_| ConfigError::InvalidFrequency)?;
        self.position
            .pid_mut()
            .set_frequency(base_hz / self.position.divider() as f32)
            .map_err(|_| ConfigError::InvalidFrequency)?;
        self.base_frequency = base_hz;
        defmt::info!("base frequency set to {}", base_hz);
        Ok(())
    }

    /// Sets the velocity and position stage dividers. Zero is rejected
    /// (`spec.md §3`: `divider ∈ ℕ≥1`); using `u32` already rules out
    /// negative dividers by construction. Both dividers are validated
    /// before either is applied, so a rejected call leaves both stages'
    /// dividers exactly as they were (`spec.md §7`: "the controller remains
    /// in its previous configuration"). Callers should call
    /// [`CascadeController::set_frequency`] again afterwards so each
    /// stage's effective PID frequency reflects the new divider.
    pub fn set_prescaler(
        &mut self,
        velocity_divider: u32,
        position_divider: u32,
    ) -> Result<(), ConfigError> {
        if velocity_divider == 0 || position_divider == 0 {
            defmt::warn!("rejected set_prescaler: divider of 0");
            return Err(ConfigError::InvalidDivider);
        }
        self.velocity.set_divider(velocity_divider)?;
        self.position.set_divider(position_divider)?;
        defmt::info!(
            "prescaler set: velocity /{}, position /{}",
            velocity_divider,
            position_divider
        );
        Ok(())
    }

    /// Transitions to `mode`, seeding setpoints bumplessly when entering a
    /// higher mode from a lower one (`spec.md §4.5`). Downgrading performs
    /// no seeding — stale higher-stage state is ignored until re-entered.
    pub fn set_mode(&mut self, mode: Mode) {
        match mode {
            Mode::Position => {
                if self.mode < Mode::Position {
                    self.position.setpoint = self.position.read_measurement();
                    self.velocity.target_setpoint = self.velocity.read_measurement();
                }
            }
            Mode::Velocity => {
                if self.mode < Mode::Velocity {
                    self.velocity.setpoint = self.velocity.read_measurement();
                }
            }
            Mode::Current => {}
        }
        defmt::info!("mode transition");
        self.mode = mode;
    }

    pub fn set_target_position(&mut self, target: f32) {
        self.position.target_setpoint = target;
    }

    pub fn set_target_velocity(&mut self, target: f32) {
        self.velocity.target_setpoint = target;
    }

    pub fn set_target_current(&mut self, target: f32) {
        self.current.target_setpoint = target;
    }

    /// Runs one tick of the cascade and returns the current-loop PID
    /// output — the actuator command. Non-blocking, non-suspending, and
    /// bounded: every sensor read is a plain getter call (`spec.md §5`).
    pub fn process(&mut self) -> f32 {
        self.position.refresh_gains();
        self.velocity.refresh_gains();
        self.current.refresh_gains();

        let max_velocity = self.limits.max_velocity.get_scalar();
        let max_acceleration = self.limits.max_acceleration.get_scalar();
        let max_current = self.limits.max_current.get_scalar();

        // `should_run` increments each stage's divider counter and must be
        // called unconditionally every tick, even while the mode gate below
        // keeps the stage from executing — otherwise the counter freezes
        // while a lower mode is active and, on raising the mode, the stage
        // requires a full fresh `divider` ticks rather than firing on the
        // next tick as `examples/original_source/src/motor_controller.c`
        // does (it increments the counters unconditionally in
        // `motor_controller_process` and gates only the reset-and-execute).
        let position_due = self.position.should_run();
        let velocity_due = self.velocity.should_run();

        if self.mode >= Mode::Position && position_due {
            let delta_t_pos = 1.0 / self.position.frequency();
            let (new_position, new_velocity_target) = shaper::step(
                self.position.setpoint,
                self.velocity.target_setpoint,
                self.position.target_setpoint,
                delta_t_pos,
                max_velocity,
                max_acceleration,
            );
            self.position.setpoint = new_position;
            self.velocity.target_setpoint = new_velocity_target;

            let measured_position = self.position.read_measurement();
            self.position.error = measured_position - self.position.setpoint;
            self.velocity.setpoint =
                self.velocity.target_setpoint + self.position.pid_mut().process(self.position.error);
        }

        // Velocity-only slewing. Runs every base tick (not every
        // velocity-stage tick) using the base frequency's delta_t — see
        // SPEC_FULL.md §3 for why this differs from the original source.
        if self.mode == Mode::Velocity {
            let delta_t_vel = 1.0 / self.base_frequency;
            self.velocity.target_setpoint =
                limit_symmetric(self.velocity.target_setpoint, max_velocity);
            let max_step = max_acceleration * delta_t_vel;
            let delta = limit_symmetric(
                self.velocity.target_setpoint - self.velocity.setpoint,
                max_step,
            );
            self.velocity.setpoint += delta;
        }

        if self.mode >= Mode::Velocity && velocity_due {
            let measured_velocity = self.velocity.read_measurement();
            self.velocity.error = measured_velocity - self.velocity.setpoint;
            self.current.setpoint = self.velocity.pid_mut().process(self.velocity.error);
        }

        if self.mode == Mode::Current {
            self.current.setpoint = self.current.target_setpoint;
        }
        self.current.setpoint = limit_symmetric(self.current.setpoint, max_current);
        if self.current.setpoint.abs() >= max_current {
            defmt::trace!("current setpoint saturated at limit");
        }

        let measured_current = self.current.read_measurement();
        self.current.error = measured_current - self.current.setpoint;
        let output = self.current.pid_mut().process(self.current.error);

        if self.segway_enabled {
            let pitch = self.pitch_getter.map_or(0.0, |get| get());
            let pitch_rate = self.pitch_rate_getter.map_or(0.0, |get| get());
            let wheel_velocity = segway::wheel_linear_velocity(self.velocity.read_measurement());
            output + segway::feedforward(self.side, pitch, pitch_rate, wheel_velocity)
        } else {
            output
        }
    }
}
