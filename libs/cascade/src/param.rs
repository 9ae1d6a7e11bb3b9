//! Parameter binding: hierarchical scalar parameters with a read-and-clear
//! "changed" flag, readable only by the core.
//!
//! `spec.md §4.2` asks for `declare_namespace`/`declare_scalar`/`get_scalar`/
//! `changed`. This implementation realizes the namespace as compile-time
//! struct nesting rather than a runtime string-keyed tree (see
//! `SPEC_FULL.md §2`): `ControlParams` is the `control/...` subtree for one
//! wheel, built the same way `configprovider.rs::ConfigV0` assembles its
//! fixed set of `Parameter` fields. `"control/left/position/kp"` becomes
//! `dual.left.position.kp`.
//!
//! Each [`Parameter`] is a single atomic value plus a single atomic dirty
//! bit. `spec.md` is explicit that there is exactly one consumer per
//! parameter (its owning stage); a second reader racing the first would see
//! an already-cleared flag, which is why `Parameter` has no subscriber list
//! (unlike the teacher's `Observable`, which is genuinely multi-consumer).

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// A single scalar parameter: an atomically-stored `f32` with a
/// read-and-clear dirty bit. `declare_scalar` in `spec.md §4.2` is
/// [`Parameter::new`]; the namespace the parameter lives under is just the
/// field path of the struct it's declared in.
pub struct Parameter {
    bits: AtomicU32,
    dirty: AtomicBool,
}

impl Parameter {
    /// Declares a scalar parameter with the given default. The dirty flag
    /// starts clear: the default is not itself a "change".
    #[must_use]
    pub const fn new(default: f32) -> Self {
        Self {
            bits: AtomicU32::new(default.to_bits()),
            dirty: AtomicBool::new(false),
        }
    }

    /// Reads the current value. Does not affect the dirty flag.
    #[must_use]
    pub fn get_scalar(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Writes a new value and marks the parameter dirty. This is the
    /// parameter-command handler's side of the contract; the core never
    /// calls it.
    pub fn set(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
        self.dirty.store(true, Ordering::Relaxed);
    }

    /// Returns whether the parameter changed since the last call to
    /// `changed`, clearing the flag as it reads it.
    pub fn changed(&self) -> bool {
        self.dirty.swap(false, Ordering::Relaxed)
    }
}

/// The four gains of one PID stage, under a shared namespace
/// (`control/<wheel>/<stage>/{kp,ki,kd,i_limit}`).
pub struct GainBundle {
    pub kp: Parameter,
    pub ki: Parameter,
    pub kd: Parameter,
    pub i_limit: Parameter,
}

impl GainBundle {
    /// Declares a gain bundle with all gains defaulting to 0 and an
    /// unbounded integrator, matching `spec.md §6`'s documented defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            kp: Parameter::new(0.0),
            ki: Parameter::new(0.0),
            kd: Parameter::new(0.0),
            i_limit: Parameter::new(f32::INFINITY),
        }
    }
}

impl Default for GainBundle {
    fn default() -> Self {
        Self::new()
    }
}

/// `control/{velocity_limit,torque_limit,acceleration_limit}`. All default
/// to "no limit".
pub struct Limits {
    pub max_velocity: Parameter,
    pub max_current: Parameter,
    pub max_acceleration: Parameter,
}

impl Limits {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_velocity: Parameter::new(f32::INFINITY),
            max_current: Parameter::new(f32::INFINITY),
            max_acceleration: Parameter::new(f32::INFINITY),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new()
    }
}

/// The full `control/...` subtree for one wheel's cascade.
pub struct ControlParams {
    pub position: GainBundle,
    pub velocity: GainBundle,
    pub current: GainBundle,
    pub limits: Limits,
}

impl ControlParams {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            position: GainBundle::new(),
            velocity: GainBundle::new(),
            current: GainBundle::new(),
            limits: Limits::new(),
        }
    }
}

impl Default for ControlParams {
    fn default() -> Self {
        Self::new()
    }
}

/// `control/left/...` and `control/right/...` for a dual-wheel deployment
/// (`spec.md §6`).
pub struct DualControlParams {
    pub left: ControlParams,
    pub right: ControlParams,
}

impl DualControlParams {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            left: ControlParams::new(),
            right: ControlParams::new(),
        }
    }
}

impl Default for DualControlParams {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{GainBundle, Parameter};

    #[test]
    fn fresh_parameter_is_not_changed() {
        let p = Parameter::new(1.5);
        assert_eq!(p.get_scalar(), 1.5);
        assert!(!p.changed());
    }

    #[test]
    fn set_marks_dirty_and_read_clears_it() {
        let p = Parameter::new(0.0);
        p.set(3.0);
        assert!(p.changed());
        assert!(!p.changed());
        assert_eq!(p.get_scalar(), 3.0);
    }

    #[test]
    fn gain_bundle_defaults_match_spec() {
        let g = GainBundle::new();
        assert_eq!(g.kp.get_scalar(), 0.0);
        assert_eq!(g.ki.get_scalar(), 0.0);
        assert_eq!(g.kd.get_scalar(), 0.0);
        assert_eq!(g.i_limit.get_scalar(), f32::INFINITY);
    }
}
