//! Pattern Compiler Tests
//!
//! Timing properties of the compiled command lists, checked through the
//! public API and the default 4 x 4 sleeve.

use haptic_render::patterns::{compile_pulse, compile_sequential, compile_static, compile_stop_all};
use haptic_render::{CommandKind, HapticRenderer, LogicalCommand, PatternError, Position, RenderConfig, Waypoint};
use std::collections::{BTreeSet, HashMap};

fn renderer() -> HapticRenderer {
    HapticRenderer::from_config(&RenderConfig::default()).unwrap()
}

/// (start, stop) delay pairs per actuator, in order.
fn active_intervals(cmds: &[LogicalCommand]) -> HashMap<u8, Vec<(u32, u32)>> {
    let mut open: HashMap<u8, u32> = HashMap::new();
    let mut intervals: HashMap<u8, Vec<(u32, u32)>> = HashMap::new();
    let mut sorted = cmds.to_vec();
    sorted.sort_by_key(|c| c.delay_ms);
    for cmd in sorted {
        match cmd.kind {
            CommandKind::Start => {
                open.insert(cmd.address, cmd.delay_ms);
            }
            CommandKind::Stop => {
                if let Some(start) = open.remove(&cmd.address) {
                    intervals.entry(cmd.address).or_default().push((start, cmd.delay_ms));
                }
            }
        }
    }
    assert!(open.is_empty(), "unterminated start commands: {open:?}");
    intervals
}

/// Actuators a device would have running `t` ms into the pattern.
fn active_at(cmds: &[LogicalCommand], t: u32) -> BTreeSet<u8> {
    let mut on = BTreeSet::new();
    for cmd in cmds.iter().filter(|c| c.delay_ms <= t) {
        match cmd.kind {
            CommandKind::Start => on.insert(cmd.address),
            CommandKind::Stop => on.remove(&cmd.address),
        };
    }
    on
}

#[test]
fn test_static_single_actuator() {
    let cmds = compile_static(&[5], 10, 2, 1000);
    assert_eq!(
        cmds,
        vec![LogicalCommand::start(5, 10, 2, 0), LogicalCommand::stop(5, 1000)]
    );
}

#[test]
fn test_pulse_cadence() {
    let cmds = compile_pulse(&[0, 1], 8, 3, 200, 100, 2).unwrap();
    assert_eq!(cmds.len(), 8);

    let intervals = active_intervals(&cmds);
    for id in [0, 1] {
        assert_eq!(intervals[&id], vec![(0, 200), (300, 500)]);
    }
    assert!(cmds
        .iter()
        .filter(|c| c.is_start())
        .all(|c| c.duty == 8 && c.freq_index == 3));
}

#[test]
fn test_sequential_never_overlaps() {
    let cmds = compile_sequential(&[0, 1, 2], 5, 1, 300, 50).unwrap();
    let mut all: Vec<(u32, u32)> = active_intervals(&cmds).into_values().flatten().collect();
    all.sort_unstable();
    assert_eq!(all.len(), 3);
    for pair in all.windows(2) {
        assert!(pair[0].1 <= pair[1].0, "{:?} overlaps {:?}", pair[0], pair[1]);
    }
    assert_eq!(all, vec![(0, 300), (350, 650), (700, 1000)]);
}

#[test]
fn test_pulse_overflow_is_reported() {
    let err = compile_pulse(&[0], 1, 1, u32::MAX, u32::MAX, 4).unwrap_err();
    assert!(matches!(err, PatternError::DelayOverflow { .. }));
}

#[test]
fn test_stop_all_is_immediate() {
    let cmds = compile_stop_all(&[3, 9, 12]);
    assert_eq!(cmds.len(), 3);
    assert!(cmds.iter().all(|c| c.kind == CommandKind::Stop && c.delay_ms == 0));
}

#[test]
fn test_trajectory_of_ids_is_sequential() {
    let r = renderer();
    let cmds = r
        .compile_trajectory(&[Waypoint::Actuator(0), Waypoint::Actuator(1), Waypoint::Actuator(2)], 1.0, 4, 0.1)
        .unwrap();
    assert_eq!(cmds.len(), 6);
    let mut all: Vec<(u32, u32)> = active_intervals(&cmds).into_values().flatten().collect();
    all.sort_unstable();
    // 100 ms on, 20 ms gap
    assert_eq!(all, vec![(0, 100), (120, 220), (240, 340)]);
}

#[test]
fn test_trajectory_through_phantom_point() {
    let r = renderer();
    let waypoints = [Waypoint::Actuator(0), Waypoint::Point(Position::new(90.0, 90.0)), Waypoint::Actuator(10)];
    let cmds = r.compile_trajectory(&waypoints, 0.8, 4, 0.05).unwrap();

    // Exact hit + 3-actuator phantom + exact hit, one start and one stop each.
    assert_eq!(cmds.len(), 2 * (1 + 3 + 1));
    assert!(cmds.windows(2).all(|w| w[0].delay_ms <= w[1].delay_ms));

    // SOA = 0.32 * 0.05 + 0.0473 = 63.3 ms; onsets at 0, 63.3 and 126.6 ms.
    let mut starts: Vec<u32> = cmds.iter().filter(|c| c.is_start()).map(|c| c.delay_ms).collect();
    starts.dedup();
    assert_eq!(starts, vec![0, 63, 127]);

    for (_, intervals) in active_intervals(&cmds) {
        for (on, off) in intervals {
            assert_eq!(off - on, 50);
        }
    }
}

#[test]
fn test_overlapping_trajectory_steps_leave_no_gap() {
    let r = renderer();
    let (a, b) = (Position::new(20.0, 10.0), Position::new(25.0, 10.0));
    // SOA = 0.32 * 0.15 + 0.0473 = 95.3 ms, shorter than the 150 ms step.
    let cmds = r.compile_trajectory(&[Waypoint::Point(a), Waypoint::Point(b)], 1.0, 4, 0.15).unwrap();

    for t in 0..245 {
        assert!(!active_at(&cmds, t).is_empty(), "nothing running at {t} ms");
    }
    let second: BTreeSet<u8> = r.synthesize(b, 1.0).unwrap().iter().map(|c| c.actuator).collect();
    assert_eq!(active_at(&cmds, 160), second);
    assert!(active_at(&cmds, 245).is_empty());
}

#[test]
fn test_dense_resampling_is_an_error_not_an_allocation() {
    let mut config = RenderConfig::default();
    config.timing.resample_max_interval_s = Some(1e-9);
    config.timing.resample_speed = Some(1.0);
    assert!(config.validate().is_ok());

    let r = HapticRenderer::from_config(&config).unwrap();
    let err = r
        .compile_trajectory(
            &[Waypoint::Point(Position::new(20.0, 10.0)), Waypoint::Point(Position::new(25.0, 10.0))],
            1.0,
            4,
            0.15,
        )
        .unwrap_err();
    assert!(matches!(err, PatternError::ResampleTooDense { .. }), "{err}");
}

#[test]
fn test_trajectory_needs_two_waypoints() {
    let r = renderer();
    assert!(r.compile_trajectory(&[Waypoint::Actuator(0)], 1.0, 0, 0.1).unwrap().is_empty());
    assert!(r.compile_trajectory(&[], 1.0, 0, 0.1).unwrap().is_empty());
}

#[test]
fn test_trajectory_rejects_unknown_actuator() {
    let r = renderer();
    let err = r
        .compile_trajectory(&[Waypoint::Actuator(0), Waypoint::Actuator(99)], 1.0, 0, 0.1)
        .unwrap_err();
    assert_eq!(err, PatternError::UnknownActuator { id: 99 });
}

#[test]
fn test_trajectory_rejects_bad_step() {
    let r = renderer();
    let waypoints = [Waypoint::Actuator(0), Waypoint::Actuator(1)];
    assert!(matches!(
        r.compile_trajectory(&waypoints, 1.0, 0, 0.0),
        Err(PatternError::InvalidStepDuration(_))
    ));
    assert!(matches!(
        r.compile_trajectory(&waypoints, f64::NAN, 0, 0.1),
        Err(PatternError::InvalidIntensity(_))
    ));
}

#[test]
fn test_compiled_patterns_encode() {
    let r = renderer();
    let cmds = compile_pulse(&[0, 1, 2, 3], 100, 31, 50, 50, 20).unwrap();
    let frames = r.encode_batch(&cmds).unwrap();
    let total: usize = frames.iter().map(|f| f.len()).sum();
    assert_eq!(total, cmds.len() * 5);
}
