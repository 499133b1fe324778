//! Render Configuration - layout, calibration and protocol as TOML values
//!
//! Every section implements `Default` with the calibrated constants from
//! `defaults.rs`, so an absent or partial file behaves like the stock sleeve.

use super::defaults;
use crate::patterns::{Resampling, SoaModel};
use crate::protocol::{DutyScale, FrequencyError, FrequencyTable, ProtocolVariant};
use crate::types::{ActuatorId, ActuatorLayout, LayoutError, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "HAPTIC_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "haptic.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one actuator sleeve and its link.
///
/// Load with `RenderConfig::load()` which searches:
/// 1. `$HAPTIC_CONFIG`
/// 2. `./haptic.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub triangulation: TriangulationConfig,

    #[serde(default)]
    pub phantom: PhantomConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub frequency: FrequencyConfig,

    #[serde(default)]
    pub protocol: ProtocolConfig,
}

impl RenderConfig {
    /// Load configuration using the standard search order. Invalid files are
    /// logged and skipped.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), actuators = config.layout.actuators.len(), "Loaded render config from HAPTIC_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from HAPTIC_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "HAPTIC_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(actuators = config.layout.actuators.len(), "Loaded render config from ./haptic.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./haptic.toml, using defaults");
                }
            }
        }

        info!("No haptic.toml found, using built-in defaults");
        Self::default()
    }

    /// Load and validate a specific TOML file.
    ///
    /// Unknown keys and suspicious values are logged as warnings; range
    /// violations fail with `ConfigError::Validation`.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, source) => ConfigError::Parse(path.to_path_buf(), source),
            other => other,
        })
    }

    /// Parse and validate TOML text. Parse errors carry an empty path.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        let (errors, warnings) = super::validation::validate_ranges(&config);
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
        for w in &warnings {
            warn!(field = %w.field, "{}", w);
        }
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Render config saved");
        Ok(())
    }

    /// Check every value for consistency, collecting all violations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, _) = super::validation::validate_ranges(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Duty scale for the configured protocol's duty width.
    pub fn duty_scale(&self) -> DutyScale {
        let max = self.protocol.variant.descriptor().duty_max();
        DutyScale::new(u8::try_from(max).unwrap_or(u8::MAX), self.protocol.duty_gamma)
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({path}): {err}", path = .0.display(), err = .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({path}): {err}", path = .0.display(), err = .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Frequency(#[from] FrequencyError),
}

// ============================================================================
// Layout
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorEntry {
    pub id: ActuatorId,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_actuators")]
    pub actuators: Vec<ActuatorEntry>,
}

fn default_actuators() -> Vec<ActuatorEntry> {
    ActuatorLayout::serpentine_grid(defaults::GRID_ROWS, defaults::GRID_COLS, defaults::GRID_SPACING)
        .map(|layout| {
            layout
                .iter()
                .map(|(id, p)| ActuatorEntry { id, x: p.x, y: p.y })
                .collect()
        })
        .unwrap_or_default()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            actuators: default_actuators(),
        }
    }
}

impl LayoutConfig {
    pub fn build(&self) -> Result<ActuatorLayout, LayoutError> {
        ActuatorLayout::new(
            self.actuators
                .iter()
                .map(|a| (a.id, Position::new(a.x, a.y))),
        )
    }

    /// Ids that appear more than once, in first-repeat order.
    pub fn duplicate_ids(&self) -> Vec<ActuatorId> {
        let mut seen = HashSet::new();
        let mut dups = Vec::new();
        for a in &self.actuators {
            if !seen.insert(a.id) && !dups.contains(&a.id) {
                dups.push(a.id);
            }
        }
        dups
    }
}

// ============================================================================
// Triangulation / Phantom
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangulationConfig {
    #[serde(default = "default_min_triangle_area")]
    pub min_triangle_area: f64,
}

fn default_min_triangle_area() -> f64 { defaults::MIN_TRIANGLE_AREA }

impl Default for TriangulationConfig {
    fn default() -> Self {
        Self {
            min_triangle_area: default_min_triangle_area(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhantomConfig {
    #[serde(default = "default_min_distance")]
    pub min_distance: f64,
}

fn default_min_distance() -> f64 { defaults::MIN_PHANTOM_DISTANCE }

impl Default for PhantomConfig {
    fn default() -> Self {
        Self {
            min_distance: default_min_distance(),
        }
    }
}

// ============================================================================
// Timing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_soa_slope")]
    pub soa_slope: f64,

    #[serde(default = "default_soa_base_s")]
    pub soa_base_s: f64,

    #[serde(default = "default_sequential_pause_ratio")]
    pub sequential_pause_ratio: f64,

    /// Resampling is active only when this and `resample_speed` are both set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resample_max_interval_s: Option<f64>,

    /// Layout units per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resample_speed: Option<f64>,
}

fn default_soa_slope() -> f64 { defaults::SOA_SLOPE }
fn default_soa_base_s() -> f64 { defaults::SOA_BASE_S }
fn default_sequential_pause_ratio() -> f64 { defaults::SEQUENTIAL_PAUSE_RATIO }

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            soa_slope: default_soa_slope(),
            soa_base_s: default_soa_base_s(),
            sequential_pause_ratio: default_sequential_pause_ratio(),
            resample_max_interval_s: None,
            resample_speed: None,
        }
    }
}

impl TimingConfig {
    pub fn soa_model(&self) -> SoaModel {
        SoaModel {
            slope: self.soa_slope,
            base_s: self.soa_base_s,
        }
    }

    pub fn resampling(&self) -> Option<Resampling> {
        match (self.resample_max_interval_s, self.resample_speed) {
            (Some(max_interval_s), Some(speed)) => Some(Resampling {
                max_interval_s,
                speed,
            }),
            _ => None,
        }
    }
}

// ============================================================================
// Frequency
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyConfig {
    #[serde(default = "default_min_hz")]
    pub min_hz: f64,

    #[serde(default = "default_max_hz")]
    pub max_hz: f64,

    #[serde(default = "default_steps")]
    pub steps: usize,
}

fn default_min_hz() -> f64 { defaults::FREQ_MIN_HZ }
fn default_max_hz() -> f64 { defaults::FREQ_MAX_HZ }
fn default_steps() -> usize { defaults::FREQ_STEPS }

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            min_hz: default_min_hz(),
            max_hz: default_max_hz(),
            steps: default_steps(),
        }
    }
}

impl FrequencyConfig {
    pub fn table(&self) -> Result<FrequencyTable, FrequencyError> {
        FrequencyTable::new(self.min_hz, self.max_hz, self.steps)
    }
}

// ============================================================================
// Protocol
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default)]
    pub variant: ProtocolVariant,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    #[serde(default = "default_duty_gamma")]
    pub duty_gamma: f64,
}

fn default_max_frame_bytes() -> usize { defaults::MAX_FRAME_BYTES }
fn default_duty_gamma() -> f64 { defaults::DUTY_GAMMA }

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            variant: ProtocolVariant::default(),
            max_frame_bytes: default_max_frame_bytes(),
            duty_gamma: default_duty_gamma(),
        }
    }
}
