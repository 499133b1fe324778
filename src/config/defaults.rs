//! Built-in default constants.
//!
//! Every `RenderConfig` default and every compiler default reads from here,
//! so a missing config file reproduces the firmware team's calibration.

// ============================================================================
// Layout
// ============================================================================

/// Default sleeve: 4 x 4 actuators wired as a serpentine chain.
pub const GRID_ROWS: usize = 4;
pub const GRID_COLS: usize = 4;

/// Centre-to-centre actuator spacing in layout units.
pub const GRID_SPACING: f64 = 60.0;

// ============================================================================
// Phantom Synthesis
// ============================================================================

/// Triangles smaller than this (squared layout units) are treated as
/// near-collinear and dropped from the index.
pub const MIN_TRIANGLE_AREA: f64 = 25.0;

/// Distance floor used in the energy model.
pub const MIN_PHANTOM_DISTANCE: f64 = 0.1;

// ============================================================================
// Timing
// ============================================================================

/// SOA = slope * duration + base (seconds).
pub const SOA_SLOPE: f64 = 0.32;
pub const SOA_BASE_S: f64 = 0.0473;

/// Pause between steps of an all-actuator trajectory, as a share of the step.
pub const SEQUENTIAL_PAUSE_RATIO: f64 = 0.2;

/// Upper bound on points resampling may insert between two waypoints.
pub const MAX_RESAMPLE_POINTS: usize = 1000;

// ============================================================================
// Frequency
// ============================================================================

pub const FREQ_MIN_HZ: f64 = 40.0;
pub const FREQ_MAX_HZ: f64 = 250.0;
pub const FREQ_STEPS: usize = 32;

// ============================================================================
// Protocol
// ============================================================================

/// Largest payload handed to the link in one write (bytes).
pub const MAX_FRAME_BYTES: usize = 250;

/// Intensity-to-duty gamma.
pub const DUTY_GAMMA: f64 = 0.7;
