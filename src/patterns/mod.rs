//! Pattern Compilers
//!
//! Turn high-level vibration patterns into ordered `LogicalCommand` lists
//! with `delay_ms` relative to pattern start. Compilers do no I/O; range
//! checks against a wire layout happen later, at encode time.
//!
//! - `compile_static()` - every actuator on for one duration
//! - `compile_pulse()` - synchronous on/off bursts
//! - `compile_sequential()` - one actuator after another, never overlapping
//! - `compile_stop_all()` - immediate stop for a set of actuators
//! - `TrajectoryCompiler` - apparent motion through ids and phantom points

pub mod basic;
pub mod trajectory;

pub use basic::{compile_pulse, compile_sequential, compile_static, compile_stop_all};
pub use trajectory::{Resampling, SoaModel, TrajectoryCompiler, Waypoint, WaypointParseError};

use crate::phantom::PhantomError;
use crate::types::ActuatorId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    #[error("{pattern} pattern delay {delay_ms} ms exceeds the u32 millisecond range")]
    DelayOverflow { pattern: &'static str, delay_ms: u64 },

    #[error("Step duration must be a positive finite number of seconds, got {0}")]
    InvalidStepDuration(f64),

    #[error("{pattern} pattern onset {delay_ms} ms is negative")]
    NegativeDelay { pattern: &'static str, delay_ms: f64 },

    #[error("SOA must be a finite, non-negative number of seconds, got {0}")]
    InvalidSoa(f64),

    #[error("Resampling would insert {points} points into one segment (limit {limit})")]
    ResampleTooDense { points: u64, limit: usize },

    #[error("Intensity must be a finite number, got {0}")]
    InvalidIntensity(f64),

    #[error("Actuator {id} is not part of the layout")]
    UnknownActuator { id: ActuatorId },

    #[error(transparent)]
    Phantom(#[from] PhantomError),
}

/// Narrow a millisecond offset computed in `u64` to the command's `u32` field.
fn delay_u32(pattern: &'static str, delay_ms: u64) -> Result<u32, PatternError> {
    u32::try_from(delay_ms).map_err(|_| PatternError::DelayOverflow { pattern, delay_ms })
}
