//! Trajectory compiler
//!
//! Apparent motion along a list of waypoints. Each waypoint is either a
//! physical actuator or a continuous position rendered as a phantom.
//!
//! Onsets follow the stimulus-onset-asynchrony model
//!
//! ```text
//! soa = slope * step_duration_s + base_s
//! ```
//!
//! accumulated after every waypoint, so each step starts `soa` seconds after
//! the previous one regardless of how far apart the waypoints are.
//!
//! When the SOA is shorter than a step, consecutive steps overlap. An
//! actuator shared by both is restarted with the new duty and its earlier
//! stop is dropped, so it stays on until the later step ends.

use super::basic::compile_sequential;
use super::{delay_u32, PatternError};
use crate::config::defaults::{MAX_RESAMPLE_POINTS, SEQUENTIAL_PAUSE_RATIO, SOA_BASE_S, SOA_SLOPE};
use crate::phantom::{PhantomResult, PhantomSynthesizer};
use crate::protocol::DutyScale;
use crate::types::{ActuatorId, LogicalCommand, Position};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// Waypoints
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Waypoint {
    Actuator(ActuatorId),
    Point(Position),
}

impl From<ActuatorId> for Waypoint {
    fn from(id: ActuatorId) -> Self {
        Waypoint::Actuator(id)
    }
}

impl From<Position> for Waypoint {
    fn from(position: Position) -> Self {
        Waypoint::Point(position)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid waypoint '{0}': expected an actuator id or 'x,y'")]
pub struct WaypointParseError(pub String);

/// `"5"` is actuator 5, `"30,45.5"` is a continuous point.
impl FromStr for Waypoint {
    type Err = WaypointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let invalid = || WaypointParseError(token.to_string());

        match token.split_once(',') {
            Some((x, y)) => {
                let x: f64 = x.trim().parse().map_err(|_| invalid())?;
                let y: f64 = y.trim().parse().map_err(|_| invalid())?;
                let position = Position::new(x, y);
                if !position.is_finite() {
                    return Err(invalid());
                }
                Ok(Waypoint::Point(position))
            }
            None => token.parse().map(Waypoint::Actuator).map_err(|_| invalid()),
        }
    }
}

// ============================================================================
// Timing
// ============================================================================

/// Stimulus-onset-asynchrony constants, empirically fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoaModel {
    pub slope: f64,
    pub base_s: f64,
}

impl SoaModel {
    pub fn soa_s(&self, step_duration_s: f64) -> f64 {
        self.slope * step_duration_s + self.base_s
    }
}

impl Default for SoaModel {
    fn default() -> Self {
        Self {
            slope: SOA_SLOPE,
            base_s: SOA_BASE_S,
        }
    }
}

/// Densify long continuous segments before rendering.
///
/// A segment whose travel time `distance / speed` exceeds `max_interval_s`
/// gets `ceil(time / max_interval_s) - 1` evenly spaced points inserted,
/// at most `MAX_RESAMPLE_POINTS` per segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resampling {
    pub max_interval_s: f64,
    /// Layout units per second.
    pub speed: f64,
}

impl Resampling {
    fn inserted_points(&self, from: Position, to: Position) -> Result<Vec<Position>, PatternError> {
        let travel_s = from.distance_to(to) / self.speed;
        if travel_s.is_nan() || travel_s <= self.max_interval_s {
            return Ok(Vec::new());
        }
        let segments = (travel_s / self.max_interval_s).ceil();
        if segments.is_nan() || segments - 1.0 > MAX_RESAMPLE_POINTS as f64 {
            return Err(PatternError::ResampleTooDense {
                points: (segments - 1.0) as u64,
                limit: MAX_RESAMPLE_POINTS,
            });
        }
        let n = segments as u32;
        Ok((1..n)
            .map(|j| from.lerp(to, f64::from(j) / f64::from(n)))
            .collect())
    }
}

// ============================================================================
// Compiler
// ============================================================================

/// Waypoint after layout resolution.
#[derive(Debug, Clone, Copy)]
enum Stop {
    Exact(ActuatorId, Position),
    Phantom(Position),
}

impl Stop {
    fn position(self) -> Position {
        match self {
            Stop::Exact(_, p) | Stop::Phantom(p) => p,
        }
    }
}

/// Trajectory compiler bound to one layout, triangulation and duty scale.
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryCompiler<'a> {
    synthesizer: PhantomSynthesizer<'a>,
    duty: DutyScale,
    soa: SoaModel,
    pause_ratio: f64,
    resampling: Option<Resampling>,
}

impl<'a> TrajectoryCompiler<'a> {
    pub fn new(synthesizer: PhantomSynthesizer<'a>, duty: DutyScale) -> Self {
        Self {
            synthesizer,
            duty,
            soa: SoaModel::default(),
            pause_ratio: SEQUENTIAL_PAUSE_RATIO,
            resampling: None,
        }
    }

    pub fn with_soa(mut self, soa: SoaModel) -> Self {
        self.soa = soa;
        self
    }

    /// Pause between steps, as a fraction of the step duration, used when
    /// every waypoint is a physical actuator.
    pub fn with_pause_ratio(mut self, ratio: f64) -> Self {
        self.pause_ratio = ratio;
        self
    }

    pub fn with_resampling(mut self, resampling: Option<Resampling>) -> Self {
        self.resampling = resampling;
        self
    }

    /// Compile a trajectory into commands sorted by `delay_ms`.
    ///
    /// Fewer than two waypoints yield no commands. When every waypoint is an
    /// actuator id the result is a sequential pattern and no phantom is
    /// synthesized.
    pub fn compile(
        &self,
        waypoints: &[Waypoint],
        intensity: f64,
        freq_index: u8,
        step_duration_s: f64,
    ) -> Result<Vec<LogicalCommand>, PatternError> {
        if waypoints.len() < 2 {
            return Ok(Vec::new());
        }
        if !(step_duration_s.is_finite() && step_duration_s > 0.0) {
            return Err(PatternError::InvalidStepDuration(step_duration_s));
        }
        if !intensity.is_finite() {
            return Err(PatternError::InvalidIntensity(intensity));
        }

        let stops = self.resolve(waypoints)?;
        let duration_ms = seconds_to_ms(step_duration_s)?;

        if stops.iter().all(|s| matches!(s, Stop::Exact(..))) {
            let ids: Vec<ActuatorId> = stops
                .iter()
                .filter_map(|s| match s {
                    Stop::Exact(id, _) => Some(*id),
                    Stop::Phantom(_) => None,
                })
                .collect();
            let pause_ms = (f64::from(duration_ms) * self.pause_ratio).round();
            let pause_ms = delay_u32("trajectory", pause_ms.max(0.0) as u64)?;
            debug!(
                waypoints = ids.len(),
                duration_ms = duration_ms,
                pause_ms = pause_ms,
                "Trajectory has only physical actuators; compiling as sequential"
            );
            return compile_sequential(&ids, self.duty.duty_for(intensity), freq_index, duration_ms, pause_ms);
        }

        let soa_s = self.soa.soa_s(step_duration_s);
        if !(soa_s.is_finite() && soa_s >= 0.0) {
            return Err(PatternError::InvalidSoa(soa_s));
        }
        let stops = self.densify(stops)?;
        let mut onset_s = 0.0;
        let mut commands: Vec<LogicalCommand> = Vec::with_capacity(stops.len() * 6);
        // Index of each actuator's latest stop, and stops a restart overrides.
        let mut pending_stop: HashMap<ActuatorId, usize> = HashMap::new();
        let mut superseded: HashSet<usize> = HashSet::new();

        for stop in &stops {
            let rendered = match *stop {
                Stop::Exact(id, _) => PhantomResult::single(id, intensity),
                Stop::Phantom(p) => self.synthesizer.synthesize(p, intensity)?,
            };
            let on = seconds_to_ms(onset_s)?;
            let off = seconds_to_ms(onset_s + step_duration_s)?;
            for c in rendered.iter() {
                if let Some(&i) = pending_stop.get(&c.actuator) {
                    if commands[i].delay_ms >= on {
                        superseded.insert(i);
                    }
                }
                commands.push(LogicalCommand::start(
                    c.actuator,
                    self.duty.duty_for(c.intensity),
                    freq_index,
                    on,
                ));
                commands.push(LogicalCommand::stop(c.actuator, off));
                pending_stop.insert(c.actuator, commands.len() - 1);
            }
            onset_s += soa_s;
        }

        let mut commands: Vec<LogicalCommand> = commands
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !superseded.contains(i))
            .map(|(_, c)| c)
            .collect();
        // Stable: same-delay commands keep their generation order.
        commands.sort_by_key(|c| c.delay_ms);

        debug!(
            waypoints = waypoints.len(),
            rendered_steps = stops.len(),
            commands = commands.len(),
            merged_stops = superseded.len(),
            soa_ms = soa_s * 1000.0,
            "Trajectory compiled"
        );

        Ok(commands)
    }

    fn resolve(&self, waypoints: &[Waypoint]) -> Result<Vec<Stop>, PatternError> {
        let layout = self.synthesizer.layout();
        waypoints
            .iter()
            .map(|w| match *w {
                Waypoint::Actuator(id) => layout
                    .position(id)
                    .map(|p| Stop::Exact(id, p))
                    .ok_or(PatternError::UnknownActuator { id }),
                Waypoint::Point(p) => Ok(Stop::Phantom(p)),
            })
            .collect()
    }

    fn densify(&self, stops: Vec<Stop>) -> Result<Vec<Stop>, PatternError> {
        let Some(resampling) = self.resampling else {
            return Ok(stops);
        };

        let mut out = Vec::with_capacity(stops.len());
        for (i, stop) in stops.iter().enumerate() {
            if i > 0 {
                let from = stops[i - 1].position();
                out.extend(
                    resampling
                        .inserted_points(from, stop.position())?
                        .into_iter()
                        .map(Stop::Phantom),
                );
            }
            out.push(*stop);
        }
        Ok(out)
    }
}

/// Seconds to whole milliseconds, rounded to nearest.
fn seconds_to_ms(seconds: f64) -> Result<u32, PatternError> {
    let ms = (seconds * 1000.0).round();
    if ms.is_nan() || ms < 0.0 {
        return Err(PatternError::NegativeDelay {
            pattern: "trajectory",
            delay_ms: ms,
        });
    }
    if ms > f64::from(u32::MAX) {
        return Err(PatternError::DelayOverflow {
            pattern: "trajectory",
            delay_ms: ms as u64,
        });
    }
    Ok(ms as u32)
}
