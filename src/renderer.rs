//! Haptic Renderer
//!
//! One value holding everything a session needs: the layout and its
//! triangulation index, the frequency table, the protocol codec and the
//! timing calibration. Built once from a `RenderConfig`, read-only after.

use crate::config::{ConfigError, RenderConfig};
use crate::patterns::{self, PatternError, Resampling, SoaModel, TrajectoryCompiler, Waypoint};
use crate::phantom::{PhantomError, PhantomResult, PhantomSynthesizer, TriangulationIndex};
use crate::protocol::{self, CodecError, CommandCodec, DutyScale, Frame, FrequencyTable};
use crate::types::{ActuatorId, ActuatorLayout, LogicalCommand, Position};
use tracing::info;

#[derive(Debug, Clone)]
pub struct HapticRenderer {
    layout: ActuatorLayout,
    index: TriangulationIndex,
    frequencies: FrequencyTable,
    codec: CommandCodec,
    duty: DutyScale,
    min_distance: f64,
    soa: SoaModel,
    pause_ratio: f64,
    resampling: Option<Resampling>,
    max_frame_bytes: usize,
}

impl HapticRenderer {
    /// Validate `config` and build the layout, index and tables it describes.
    pub fn from_config(config: &RenderConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let layout = config.layout.build()?;
        let index = TriangulationIndex::build(&layout, config.triangulation.min_triangle_area);
        let frequencies = config.frequency.table()?;
        let codec = CommandCodec::new(config.protocol.variant);

        info!(
            actuators = layout.len(),
            triangles = index.len(),
            protocol = %config.protocol.variant,
            frequency_steps = frequencies.len(),
            "Haptic renderer ready"
        );

        Ok(Self {
            layout,
            index,
            frequencies,
            codec,
            duty: config.duty_scale(),
            min_distance: config.phantom.min_distance,
            soa: config.timing.soa_model(),
            pause_ratio: config.timing.sequential_pause_ratio,
            resampling: config.timing.resampling(),
            max_frame_bytes: config.protocol.max_frame_bytes,
        })
    }

    pub fn layout(&self) -> &ActuatorLayout {
        &self.layout
    }

    pub fn index(&self) -> &TriangulationIndex {
        &self.index
    }

    pub fn frequencies(&self) -> &FrequencyTable {
        &self.frequencies
    }

    pub fn codec(&self) -> &CommandCodec {
        &self.codec
    }

    pub fn duty_scale(&self) -> DutyScale {
        self.duty
    }

    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    // ========================================================================
    // Phantom synthesis
    // ========================================================================

    pub fn synthesizer(&self) -> PhantomSynthesizer<'_> {
        PhantomSynthesizer::new(&self.layout, &self.index, self.min_distance)
    }

    pub fn synthesize(&self, target: Position, intensity: f64) -> Result<PhantomResult, PhantomError> {
        self.synthesizer().synthesize(target, intensity)
    }

    // ========================================================================
    // Pattern compilation
    // ========================================================================

    pub fn compile_static(
        &self,
        actuators: &[ActuatorId],
        duty: u8,
        freq_index: u8,
        duration_ms: u32,
    ) -> Vec<LogicalCommand> {
        patterns::compile_static(actuators, duty, freq_index, duration_ms)
    }

    pub fn compile_pulse(
        &self,
        actuators: &[ActuatorId],
        duty: u8,
        freq_index: u8,
        pulse_ms: u32,
        pause_ms: u32,
        repetitions: u32,
    ) -> Result<Vec<LogicalCommand>, PatternError> {
        patterns::compile_pulse(actuators, duty, freq_index, pulse_ms, pause_ms, repetitions)
    }

    pub fn compile_sequential(
        &self,
        actuators: &[ActuatorId],
        duty: u8,
        freq_index: u8,
        duration_ms: u32,
        pause_ms: u32,
    ) -> Result<Vec<LogicalCommand>, PatternError> {
        patterns::compile_sequential(actuators, duty, freq_index, duration_ms, pause_ms)
    }

    pub fn trajectory_compiler(&self) -> TrajectoryCompiler<'_> {
        TrajectoryCompiler::new(self.synthesizer(), self.duty)
            .with_soa(self.soa)
            .with_pause_ratio(self.pause_ratio)
            .with_resampling(self.resampling)
    }

    pub fn compile_trajectory(
        &self,
        waypoints: &[Waypoint],
        intensity: f64,
        freq_index: u8,
        step_duration_s: f64,
    ) -> Result<Vec<LogicalCommand>, PatternError> {
        self.trajectory_compiler()
            .compile(waypoints, intensity, freq_index, step_duration_s)
    }

    /// Stop every actuator in the layout.
    pub fn compile_stop_all(&self) -> Vec<LogicalCommand> {
        let ids: Vec<ActuatorId> = self.layout.ids().collect();
        patterns::compile_stop_all(&ids)
    }

    // ========================================================================
    // Codec
    // ========================================================================

    pub fn encode(&self, cmd: &LogicalCommand) -> Result<Vec<u8>, CodecError> {
        self.codec.encode(cmd)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<LogicalCommand, CodecError> {
        self.codec.decode(bytes)
    }

    /// Frame with the configured `max_frame_bytes`.
    pub fn encode_batch(&self, commands: &[LogicalCommand]) -> Result<Vec<Frame>, CodecError> {
        protocol::encode_batch(&self.codec, commands, self.max_frame_bytes)
    }

    pub fn encode_batch_with(
        &self,
        commands: &[LogicalCommand],
        max_frame_bytes: usize,
    ) -> Result<Vec<Frame>, CodecError> {
        protocol::encode_batch(&self.codec, commands, max_frame_bytes)
    }

    pub fn decode_batch(&self, frame: &[u8]) -> Result<Vec<LogicalCommand>, CodecError> {
        protocol::decode_batch(&self.codec, frame)
    }

    // ========================================================================
    // Frequency
    // ========================================================================

    pub fn hz_to_index(&self, hz: f64) -> u8 {
        self.frequencies.hz_to_index(hz)
    }

    pub fn index_to_hz(&self, index: i64) -> f64 {
        self.frequencies.index_to_hz(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProtocolVariant;

    #[test]
    fn test_from_default_config() {
        let renderer = HapticRenderer::from_config(&RenderConfig::default()).unwrap();
        assert_eq!(renderer.layout().len(), 16);
        assert!(!renderer.index().is_empty());
        assert_eq!(renderer.frequencies().len(), 32);
        assert_eq!(renderer.codec().command_width(), 5);
        assert_eq!(renderer.max_frame_bytes(), 250);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = RenderConfig::default();
        config.protocol.max_frame_bytes = 2;
        assert!(matches!(
            HapticRenderer::from_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_stop_all_covers_layout() {
        let renderer = HapticRenderer::from_config(&RenderConfig::default()).unwrap();
        let cmds = renderer.compile_stop_all();
        assert_eq!(cmds.len(), 16);
        assert!(cmds.iter().all(|c| !c.is_start() && c.delay_ms == 0));
    }

    #[test]
    fn test_legacy_session_uses_narrow_duty() {
        let mut config = RenderConfig::default();
        config.protocol.variant = ProtocolVariant::LegacyGrouped4;
        config.frequency.steps = 8;
        let renderer = HapticRenderer::from_config(&config).unwrap();
        assert_eq!(renderer.duty_scale().max_duty, 31);
        assert_eq!(renderer.codec().command_width(), 4);
        assert_eq!(renderer.hz_to_index(250.0), 7);
    }

    #[test]
    fn test_pipeline_end_to_end() {
        let renderer = HapticRenderer::from_config(&RenderConfig::default()).unwrap();
        let cmds = renderer
            .compile_trajectory(
                &[
                    Waypoint::Actuator(0),
                    Waypoint::Point(Position::new(90.0, 90.0)),
                    Waypoint::Actuator(10),
                ],
                0.8,
                4,
                0.06,
            )
            .unwrap();
        let frames = renderer.encode_batch(&cmds).unwrap();
        let decoded: Vec<LogicalCommand> = frames
            .iter()
            .flat_map(|f| renderer.decode_batch(f.as_bytes()).unwrap())
            .collect();
        assert_eq!(decoded, cmds);
    }
}
