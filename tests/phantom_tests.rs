//! Phantom Synthesis Tests
//!
//! Energy-model properties over real layouts: exact hits, intensity ratios,
//! and layouts that cannot triangulate.

use haptic_render::phantom::{shoelace_area, PhantomError, PhantomSynthesizer, TriangulationIndex};
use haptic_render::{ActuatorLayout, HapticRenderer, Position, RenderConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn sleeve() -> (ActuatorLayout, TriangulationIndex) {
    let layout = ActuatorLayout::serpentine_grid(4, 4, 60.0).unwrap();
    let index = TriangulationIndex::build(&layout, 25.0);
    (layout, index)
}

#[test]
fn test_every_actuator_position_is_an_exact_hit() {
    let (layout, index) = sleeve();
    let synth = PhantomSynthesizer::new(&layout, &index, 0.1);
    for (id, position) in layout.iter() {
        let result = synth.synthesize(position, 0.42).unwrap();
        assert_eq!(result.len(), 1);
        let c = result.contributions()[0];
        assert_eq!(c.actuator, id);
        assert!((c.intensity - 0.42).abs() < 1e-12);
    }
}

#[test]
fn test_random_targets_follow_distance_ratio() {
    let (layout, index) = sleeve();
    let synth = PhantomSynthesizer::new(&layout, &index, 0.1);
    let mut rng = StdRng::seed_from_u64(2024);

    for _ in 0..500 {
        let target = Position::new(rng.gen_range(-20.0..200.0), rng.gen_range(-20.0..200.0));
        let intensity = rng.gen_range(0.0..1.0);
        let result = synth.synthesize(target, intensity).unwrap();
        if result.is_exact_hit() {
            continue;
        }

        assert_eq!(result.len(), 3);
        let c = result.contributions();
        assert!(c.iter().all(|c| (0.0..=1.0).contains(&c.intensity)));

        let d: Vec<f64> = c
            .iter()
            .map(|c| layout.position(c.actuator).unwrap().distance_to(target).max(0.1))
            .collect();
        for (i, j) in [(0, 1), (1, 2), (0, 2)] {
            if c[j].intensity == 0.0 {
                continue;
            }
            let observed = c[i].intensity / c[j].intensity;
            let expected = (d[j] / d[i]).sqrt();
            assert!(
                (observed - expected).abs() < 1e-9 * expected.max(1.0),
                "{target}: {observed} vs {expected}"
            );
        }
    }
}

#[test]
fn test_collinear_layout_has_empty_index() {
    let layout = ActuatorLayout::new([
        (0, Position::new(0.0, 0.0)),
        (1, Position::new(40.0, 0.0)),
        (2, Position::new(80.0, 0.0)),
    ])
    .unwrap();
    assert_eq!(
        shoelace_area(Position::new(0.0, 0.0), Position::new(40.0, 0.0), Position::new(80.0, 0.0)),
        0.0
    );

    let index = TriangulationIndex::build(&layout, 25.0);
    assert!(index.is_empty());

    let synth = PhantomSynthesizer::new(&layout, &index, 0.1);
    assert!(matches!(
        synth.synthesize(Position::new(20.0, 10.0), 0.5),
        Err(PhantomError::DegenerateLayout { actuators: 3 })
    ));
    // Exact hits still render without a triangle.
    assert!(synth.synthesize(Position::new(40.0, 0.0), 0.5).unwrap().is_exact_hit());
}

#[test]
fn test_two_actuator_layout_is_degenerate() {
    let layout = ActuatorLayout::new([(0, Position::new(0.0, 0.0)), (1, Position::new(60.0, 0.0))]).unwrap();
    let index = TriangulationIndex::build(&layout, 25.0);
    let synth = PhantomSynthesizer::new(&layout, &index, 0.1);
    assert!(matches!(
        synth.synthesize(Position::new(30.0, 30.0), 1.0),
        Err(PhantomError::DegenerateLayout { actuators: 2 })
    ));
}

#[test]
fn test_index_is_sorted_by_area() {
    let (_, index) = sleeve();
    assert!(index.triangles().windows(2).all(|w| w[0].area >= w[1].area));
    assert!(index.triangles().iter().all(|t| t.area >= index.min_area()));
}

#[test]
fn test_non_finite_input_is_rejected() {
    let renderer = HapticRenderer::from_config(&RenderConfig::default()).unwrap();
    assert!(matches!(
        renderer.synthesize(Position::new(f64::NAN, 1.0), 0.5),
        Err(PhantomError::NonFiniteTarget(_))
    ));
    assert!(matches!(
        renderer.synthesize(Position::new(10.0, 10.0), f64::INFINITY),
        Err(PhantomError::NonFiniteIntensity(_))
    ));
}
