//! Cascaded position/velocity/current motor control for a differentially
//! driven mobile robot.
//!
//! Built on top of the `pid` crate's single-loop primitive, this crate adds
//! the parameter-binding, prescaling, mode state machine, motion shaping,
//! and segway feedforward that together make up one wheel's control stack,
//! plus [`dual::DualWheelController`] wiring two of them together for a
//! two-wheel chassis.

#![cfg_attr(any(not(test), target_arch = "arm"), no_std)]

mod controller;
mod dual;
mod mode;
mod param;
mod segway;
mod shaper;
mod stage;

pub use controller::CascadeController;
pub use dual::{DualWheelController, MotorSink};
pub use mode::Mode;
pub use param::{ControlParams, DualControlParams, GainBundle, Limits, Parameter};
pub use segway::{wheel_linear_velocity, Side, R_WHEEL};
pub use stage::CascadeStage;

/// Configuration errors rejected by the cascade's setup calls. Mirrors
/// `tmc4671::nonblocking::Error`'s shape: a plain, hand-written `defmt`
/// enum, no `thiserror`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, defmt::Format)]
pub enum ConfigError {
    /// `set_frequency` was called with a non-positive base frequency.
    InvalidFrequency,
    /// `set_prescaler` was called with a divider of 0.
    InvalidDivider,
}
