//! Frequency Table
//!
//! Log-spaced quantizer between a continuous vibration frequency in Hz and
//! the small integer index carried on the wire:
//!
//! ```text
//! hz_i = min_hz * (max_hz / min_hz)^(i / (N - 1))
//! ```

use crate::config::defaults::{FREQ_MAX_HZ, FREQ_MIN_HZ, FREQ_STEPS};
use serde::Serialize;
use thiserror::Error;

/// Upper bound on table size; indices must fit a `u8`.
pub const MAX_STEPS: usize = 256;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrequencyError {
    #[error("Frequency range must satisfy 0 < min_hz < max_hz (got {min_hz} - {max_hz})")]
    InvalidRange { min_hz: f64, max_hz: f64 },

    #[error("Frequency table needs 2-{max} steps, got {steps}")]
    InvalidSteps { steps: usize, max: usize },
}

/// Strictly increasing Hz values. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyTable {
    hz: Vec<f64>,
}

impl FrequencyTable {
    pub fn new(min_hz: f64, max_hz: f64, steps: usize) -> Result<Self, FrequencyError> {
        if !(min_hz.is_finite() && max_hz.is_finite() && min_hz > 0.0 && max_hz > min_hz) {
            return Err(FrequencyError::InvalidRange { min_hz, max_hz });
        }
        if !(2..=MAX_STEPS).contains(&steps) {
            return Err(FrequencyError::InvalidSteps {
                steps,
                max: MAX_STEPS,
            });
        }

        Ok(Self {
            hz: log_spaced(min_hz, max_hz, steps),
        })
    }

    /// Closest table index for `hz`, clamping outside the table range.
    ///
    /// Ties between two neighbours resolve to the higher index. NaN maps to 0.
    pub fn hz_to_index(&self, hz: f64) -> u8 {
        let last = self.hz.len() - 1;
        if hz.is_nan() || hz <= self.hz[0] {
            return 0;
        }
        if hz >= self.hz[last] {
            return index_u8(last);
        }

        // First entry >= hz; strictly inside (0, last] here.
        let upper = self.hz.partition_point(|&h| h < hz);
        let lower = upper - 1;
        if (hz - self.hz[lower]).abs() < (self.hz[upper] - hz).abs() {
            index_u8(lower)
        } else {
            index_u8(upper)
        }
    }

    /// Hz value at `index`, clamped into the table.
    pub fn index_to_hz(&self, index: i64) -> f64 {
        let last = self.hz.len() - 1;
        let clamped = usize::try_from(index.max(0)).map_or(last, |i| i.min(last));
        self.hz[clamped]
    }

    pub fn min_hz(&self) -> f64 {
        self.hz[0]
    }

    pub fn max_hz(&self) -> f64 {
        self.hz[self.hz.len() - 1]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.hz
    }

    pub fn len(&self) -> usize {
        self.hz.len()
    }

    /// Always false; a table holds at least two entries.
    pub fn is_empty(&self) -> bool {
        self.hz.is_empty()
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self {
            hz: log_spaced(FREQ_MIN_HZ, FREQ_MAX_HZ, FREQ_STEPS),
        }
    }
}

/// `steps >= 2` and a valid range are checked by the caller.
fn log_spaced(min_hz: f64, max_hz: f64, steps: usize) -> Vec<f64> {
    let ratio = max_hz / min_hz;
    let last = (steps - 1) as f64;
    let mut hz: Vec<f64> = (0..steps)
        .map(|i| min_hz * ratio.powf(i as f64 / last))
        .collect();

    // Pin the endpoints so powf drift never moves the range.
    hz[0] = min_hz;
    hz[steps - 1] = max_hz;
    hz
}

fn index_u8(i: usize) -> u8 {
    u8::try_from(i).unwrap_or(u8::MAX)
}
