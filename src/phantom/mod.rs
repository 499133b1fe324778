//! Phantom Sensation Module
//!
//! Renders vibrations at positions where no physical actuator exists.
//!
//! - `TriangulationIndex` - built once per layout, read-only afterwards
//! - `PhantomSynthesizer` - target position + intensity -> 1 or 3 actuator drives

pub mod synthesizer;
pub mod triangulation;

pub use synthesizer::{Contribution, PhantomError, PhantomResult, PhantomSynthesizer};
pub use triangulation::{shoelace_area, Triangle, TriangulationIndex};
