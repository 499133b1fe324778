//! Duty scaling
//!
//! Conversions between normalized drive intensity in [0, 1] and the
//! protocol-scoped duty integer. Perceived vibration strength is not linear
//! in duty, so intensities pass through a gamma curve.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DutyError {
    #[error("Duty percent must be within 0-100, got {0}")]
    PercentOutOfRange(f64),

    #[error("Raw duty {value} exceeds the protocol maximum {max}")]
    RawOutOfRange { value: u8, max: u8 },
}

/// A duty value with an explicit unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum DutyLevel {
    /// Protocol integer, passed through after a range check.
    Raw(u8),
    /// Share of the protocol maximum, 0-100.
    Percent(f64),
}

impl DutyLevel {
    /// Protocol integer for a descriptor whose duty field tops out at `max_duty`.
    pub fn resolve(self, max_duty: u8) -> Result<u8, DutyError> {
        match self {
            DutyLevel::Raw(value) if value > max_duty => Err(DutyError::RawOutOfRange {
                value,
                max: max_duty,
            }),
            DutyLevel::Raw(value) => Ok(value),
            DutyLevel::Percent(p) if !(0.0..=100.0).contains(&p) => {
                Err(DutyError::PercentOutOfRange(p))
            }
            DutyLevel::Percent(p) => Ok(scale(p / 100.0, max_duty)),
        }
    }
}

/// Gamma-corrected mapping between intensity and duty for one protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DutyScale {
    pub max_duty: u8,
    pub gamma: f64,
}

impl DutyScale {
    pub const fn new(max_duty: u8, gamma: f64) -> Self {
        Self { max_duty, gamma }
    }

    pub fn duty_for(&self, intensity: f64) -> u8 {
        intensity_to_duty(intensity, self.max_duty, self.gamma)
    }

    pub fn intensity_for(&self, duty: u8) -> f64 {
        duty_to_intensity(duty, self.max_duty, self.gamma)
    }
}

/// `round(intensity^gamma * max_duty)`, saturating at both ends. NaN maps to 0.
pub fn intensity_to_duty(intensity: f64, max_duty: u8, gamma: f64) -> u8 {
    if intensity.is_nan() || intensity <= 0.0 {
        return 0;
    }
    if intensity >= 1.0 {
        return max_duty;
    }
    scale(intensity.powf(gamma), max_duty)
}

/// Inverse of [`intensity_to_duty`] up to quantization.
pub fn duty_to_intensity(duty: u8, max_duty: u8, gamma: f64) -> f64 {
    if duty == 0 || max_duty == 0 {
        return 0.0;
    }
    if duty >= max_duty {
        return 1.0;
    }
    (f64::from(duty) / f64::from(max_duty)).powf(gamma.recip())
}

fn scale(fraction: f64, max_duty: u8) -> u8 {
    // Clamped to [0, max_duty] before the cast.
    (fraction * f64::from(max_duty)).round().clamp(0.0, f64::from(max_duty)) as u8
}
