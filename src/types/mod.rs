//! Shared data structures for the compile-and-encode pipeline
//!
//! - `Position`: planar coordinate on the actuator surface
//! - `ActuatorLayout`: immutable actuator id -> position map
//! - `LogicalCommand`: one timed start/stop for a single actuator

mod command;
mod geometry;
mod layout;

pub use command::*;
pub use geometry::*;
pub use layout::*;
