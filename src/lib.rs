//! haptic-render: Vibrotactile Rendering Core
//!
//! Turns spatial and temporal tactile intent into byte frames for an array
//! of vibration actuators.
//!
//! ## Architecture
//!
//! - **Phantom Synthesis**: energy-model intensities for points between actuators
//! - **Pattern Compilers**: static, pulse, sequential and apparent-motion trajectories
//! - **Protocol**: descriptor-driven command codec, frequency table, batch framing
//! - **Transport**: whole-frame dispatch to any byte sink, optional host pacing
//!
//! `HapticRenderer` bundles a layout, its triangulation index and the
//! protocol tables built from one `RenderConfig`.

pub mod config;
pub mod patterns;
pub mod phantom;
pub mod protocol;
pub mod renderer;
pub mod transport;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, RenderConfig};

// Re-export commonly used types
pub use types::{ActuatorId, ActuatorLayout, CommandKind, LogicalCommand, Position};

pub use patterns::{PatternError, TrajectoryCompiler, Waypoint};
pub use phantom::{PhantomError, PhantomResult, PhantomSynthesizer, TriangulationIndex};
pub use protocol::{CodecError, CommandCodec, Frame, FrequencyTable, ProtocolVariant};
pub use renderer::HapticRenderer;
pub use transport::{dispatch, dispatch_paced, schedule, TransportError};
