//! Fixed-timing patterns: static, pulse, sequential and stop-all.

use super::{delay_u32, PatternError};
use crate::types::{ActuatorId, LogicalCommand};

/// Start every actuator at 0 and stop it at `duration_ms`.
///
/// Output is all starts (in input order) followed by all stops.
pub fn compile_static(
    actuators: &[ActuatorId],
    duty: u8,
    freq_index: u8,
    duration_ms: u32,
) -> Vec<LogicalCommand> {
    let starts = actuators
        .iter()
        .map(|&a| LogicalCommand::start(a, duty, freq_index, 0));
    let stops = actuators
        .iter()
        .map(|&a| LogicalCommand::stop(a, duration_ms));
    starts.chain(stops).collect()
}

/// `repetitions` synchronous bursts: pulse `k` starts every actuator at
/// `k * (pulse_ms + pause_ms)` and stops them `pulse_ms` later.
pub fn compile_pulse(
    actuators: &[ActuatorId],
    duty: u8,
    freq_index: u8,
    pulse_ms: u32,
    pause_ms: u32,
    repetitions: u32,
) -> Result<Vec<LogicalCommand>, PatternError> {
    let period = u64::from(pulse_ms) + u64::from(pause_ms);
    let mut commands = Vec::new();

    for k in 0..u64::from(repetitions) {
        let on = delay_u32("pulse", k * period)?;
        let off = delay_u32("pulse", k * period + u64::from(pulse_ms))?;
        commands.extend(
            actuators
                .iter()
                .map(|&a| LogicalCommand::start(a, duty, freq_index, on)),
        );
        commands.extend(actuators.iter().map(|&a| LogicalCommand::stop(a, off)));
    }

    Ok(commands)
}

/// Actuator `i` runs over `[i * (duration_ms + pause_ms), +duration_ms)`.
///
/// Active intervals never overlap, even with a zero pause, because each
/// interval is half-open.
pub fn compile_sequential(
    actuators: &[ActuatorId],
    duty: u8,
    freq_index: u8,
    duration_ms: u32,
    pause_ms: u32,
) -> Result<Vec<LogicalCommand>, PatternError> {
    let slot = u64::from(duration_ms) + u64::from(pause_ms);
    let mut commands = Vec::with_capacity(actuators.len() * 2);

    for (i, &actuator) in (0u64..).zip(actuators) {
        let on = i * slot;
        commands.push(LogicalCommand::start(
            actuator,
            duty,
            freq_index,
            delay_u32("sequential", on)?,
        ));
        commands.push(LogicalCommand::stop(
            actuator,
            delay_u32("sequential", on + u64::from(duration_ms))?,
        ));
    }

    Ok(commands)
}

/// Immediate stop for each actuator.
///
/// Sending this does not cancel commands the device has already scheduled;
/// it races with them.
pub fn compile_stop_all(actuators: &[ActuatorId]) -> Vec<LogicalCommand> {
    actuators
        .iter()
        .map(|&a| LogicalCommand::stop(a, 0))
        .collect()
}
