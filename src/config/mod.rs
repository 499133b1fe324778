//! Render Configuration Module
//!
//! Actuator layout, calibration constants and protocol selection loaded from
//! TOML.
//!
//! ## Loading Order
//!
//! 1. `HAPTIC_CONFIG` environment variable (path to TOML file)
//! 2. `haptic.toml` in the current working directory
//! 3. Built-in defaults (the stock 4 x 4 sleeve)
//!
//! ## Usage
//!
//! The config is a plain value; pass it to whatever needs it:
//!
//! ```ignore
//! let config = RenderConfig::load();
//! let renderer = HapticRenderer::from_config(&config)?;
//! ```

mod render_config;
pub mod defaults;
pub mod validation;

pub use render_config::*;
