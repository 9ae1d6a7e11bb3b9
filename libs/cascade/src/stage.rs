//! A single stage of the cascade: a PID, the gain bundle it reads, a
//! prescaler divider/counter, and the setpoint/error pair it owns
//! (`spec.md §4.3`).

use pid::Pid;

use crate::param::GainBundle;
use crate::ConfigError;

/// One stage (position, velocity, or current) of a [`crate::controller::CascadeController`].
///
/// The stage owns its [`Pid`] outright (`spec.md §3`: "the controller
/// exclusively owns its three stages and their PIDs") and only *references*
/// the [`GainBundle`] parameters and the measurement getter, both of which
/// outlive the stage.
pub struct CascadeStage<'a> {
    pid: Pid,
    gains: &'a GainBundle,
    divider: u32,
    divider_counter: u32,
    pub setpoint: f32,
    pub target_setpoint: f32,
    pub error: f32,
    getter: Option<&'a dyn Fn() -> f32>,
}

impl<'a> CascadeStage<'a> {
    /// Builds a zeroed stage at `frequency_hz` with divider 1 (runs every
    /// tick) and no measurement getter bound yet.
    #[must_use]
    pub const fn new(gains: &'a GainBundle, frequency_hz: f32) -> Self {
        Self {
            pid: Pid::new(frequency_hz),
            gains,
            divider: 1,
            divider_counter: 0,
            setpoint: 0.0,
            target_setpoint: 0.0,
            error: 0.0,
            getter: None,
        }
    }

    /// Binds (or unbinds, with `None`) the measurement getter. An unbound
    /// getter is a deliberate "safe no-op" (`spec.md §7`,
    /// `UnboundSensor`), not an error.
    pub fn set_getter(&mut self, getter: Option<&'a dyn Fn() -> f32>) {
        self.getter = getter;
    }

    #[must_use]
    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    pub(crate) fn pid_mut(&mut self) -> &mut Pid {
        &mut self.pid
    }

    #[must_use]
    pub fn frequency(&self) -> f32 {
        self.pid.frequency()
    }

    pub(crate) fn set_divider(&mut self, divider: u32) -> Result<(), ConfigError> {
        if divider == 0 {
            return Err(ConfigError::InvalidDivider);
        }
        self.divider = divider;
        Ok(())
    }

    #[must_use]
    pub fn divider(&self) -> u32 {
        self.divider
    }

    /// If any of `kp`/`ki`/`kd` changed since the last call, pushes the new
    /// gains into the PID (resetting its integrator). Independently, if
    /// `i_limit` changed, pushes the new limit. Called once per controller
    /// tick regardless of whether the stage runs this tick.
    ///
    /// The three `changed()` calls are evaluated unconditionally (not
    /// short-circuited) so that every dirty flag is cleared this tick even
    /// when an earlier one already triggered the gain update — each
    /// parameter has exactly one consumer, so a flag left set here would
    /// never be cleared by anyone else.
    pub fn refresh_gains(&mut self) {
        let kp_changed = self.gains.kp.changed();
        let ki_changed = self.gains.ki.changed();
        let kd_changed = self.gains.kd.changed();
        if kp_changed || ki_changed || kd_changed {
            self.pid.set_gains(
                self.gains.kp.get_scalar(),
                self.gains.ki.get_scalar(),
                self.gains.kd.get_scalar(),
            );
        }
        if self.gains.i_limit.changed() {
            self.pid.set_integral_limit(self.gains.i_limit.get_scalar());
        }
    }

    /// Increments the divider counter; returns `true` (and resets the
    /// counter) exactly every `divider`-th call.
    pub fn should_run(&mut self) -> bool {
        self.divider_counter += 1;
        if self.divider_counter >= self.divider {
            self.divider_counter = 0;
            true
        } else {
            false
        }
    }

    /// Reads the measurement getter, or `0.0` if none is bound.
    #[must_use]
    pub fn read_measurement(&self) -> f32 {
        self.getter.map_or(0.0, |get| get())
    }
}
