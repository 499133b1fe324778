//! Phantom Synthesizer
//!
//! Turns a continuous target position into drive intensities for up to three
//! real actuators using the energy model
//!
//! ```text
//! A_i = sqrt((1/d_i) / sum_j(1/d_j)) * A_v
//! ```
//!
//! where `d_i` is the (floored) distance from actuator `i` to the target and
//! `A_v` the desired virtual intensity.

use super::triangulation::TriangulationIndex;
use crate::types::{ActuatorId, ActuatorLayout, Position};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhantomError {
    #[error("Layout has {actuators} actuator(s) and no usable triangle; phantom synthesis needs at least 3 non-collinear actuators")]
    DegenerateLayout { actuators: usize },

    #[error("Target position {0} is not finite")]
    NonFiniteTarget(Position),

    #[error("Desired intensity must be a finite number, got {0}")]
    NonFiniteIntensity(f64),
}

/// Drive level for one real actuator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contribution {
    pub actuator: ActuatorId,
    /// Always within [0, 1].
    pub intensity: f64,
}

/// One contribution for an exact hit, three otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhantomResult {
    contributions: Vec<Contribution>,
}

impl PhantomResult {
    /// Direct single-actuator activation.
    pub fn single(actuator: ActuatorId, intensity: f64) -> Self {
        Self {
            contributions: vec![Contribution {
                actuator,
                intensity: intensity.clamp(0.0, 1.0),
            }],
        }
    }

    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    pub fn is_exact_hit(&self) -> bool {
        self.contributions.len() == 1
    }

    pub fn len(&self) -> usize {
        self.contributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contribution> {
        self.contributions.iter()
    }
}

/// Borrowing view over a layout and its triangulation index.
#[derive(Debug, Clone, Copy)]
pub struct PhantomSynthesizer<'a> {
    layout: &'a ActuatorLayout,
    index: &'a TriangulationIndex,
    min_distance: f64,
}

impl<'a> PhantomSynthesizer<'a> {
    pub fn new(layout: &'a ActuatorLayout, index: &'a TriangulationIndex, min_distance: f64) -> Self {
        Self {
            layout,
            index,
            min_distance,
        }
    }

    pub fn layout(&self) -> &'a ActuatorLayout {
        self.layout
    }

    /// Render a phantom at `target` with the desired intensity.
    ///
    /// Intensities in the result are clamped to [0, 1] whatever the input magnitude.
    pub fn synthesize(&self, target: Position, intensity: f64) -> Result<PhantomResult, PhantomError> {
        if !target.is_finite() {
            return Err(PhantomError::NonFiniteTarget(target));
        }
        if !intensity.is_finite() {
            return Err(PhantomError::NonFiniteIntensity(intensity));
        }

        if let Some(actuator) = self.layout.actuator_at(target) {
            return Ok(PhantomResult::single(actuator, intensity));
        }

        let triangle = self
            .index
            .lookup(target)
            .ok_or(PhantomError::DegenerateLayout {
                actuators: self.layout.len(),
            })?;

        let distances = triangle
            .vertices
            .map(|vertex| vertex.distance_to(target).max(self.min_distance));
        let inverse_sum: f64 = distances.iter().map(|d| d.recip()).sum();

        let contributions = triangle
            .actuators
            .iter()
            .zip(distances)
            .map(|(&actuator, d)| Contribution {
                actuator,
                intensity: ((d.recip() / inverse_sum).sqrt() * intensity).clamp(0.0, 1.0),
            })
            .collect();

        Ok(PhantomResult { contributions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> (ActuatorLayout, TriangulationIndex) {
        let layout = ActuatorLayout::serpentine_grid(4, 4, 60.0).unwrap();
        let index = TriangulationIndex::build(&layout, 25.0);
        (layout, index)
    }

    #[test]
    fn test_exact_hit_returns_single_actuator() {
        let (layout, index) = grid();
        let synth = PhantomSynthesizer::new(&layout, &index, 0.1);
        for (id, position) in layout.iter() {
            let result = synth.synthesize(position, 0.6).unwrap();
            assert!(result.is_exact_hit());
            assert_eq!(result.contributions()[0], Contribution { actuator: id, intensity: 0.6 });
        }
    }

    #[test]
    fn test_phantom_uses_three_actuators() {
        let (layout, index) = grid();
        let synth = PhantomSynthesizer::new(&layout, &index, 0.1);
        let result = synth.synthesize(Position::new(75.0, 40.0), 0.8).unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|c| (0.0..=1.0).contains(&c.intensity)));
    }

    #[test]
    fn test_intensity_ratio_follows_energy_model() {
        let (layout, index) = grid();
        let synth = PhantomSynthesizer::new(&layout, &index, 0.1);
        let target = Position::new(75.0, 40.0);
        let result = synth.synthesize(target, 0.9).unwrap();
        let c = result.contributions();
        let d: Vec<f64> = c
            .iter()
            .map(|c| layout.position(c.actuator).unwrap().distance_to(target))
            .collect();
        let observed = c[0].intensity / c[1].intensity;
        let expected = (d[1] / d[0]).sqrt();
        assert!((observed - expected).abs() < 1e-9);
    }

    #[test]
    fn test_energy_is_preserved() {
        let (layout, index) = grid();
        let synth = PhantomSynthesizer::new(&layout, &index, 0.1);
        let result = synth.synthesize(Position::new(100.0, 100.0), 0.7).unwrap();
        let energy: f64 = result.iter().map(|c| c.intensity * c.intensity).sum();
        assert!((energy - 0.49).abs() < 1e-9);
    }

    #[test]
    fn test_oversized_intensity_is_clamped() {
        let (layout, index) = grid();
        let synth = PhantomSynthesizer::new(&layout, &index, 0.1);
        let result = synth.synthesize(Position::new(61.0, 1.0), 25.0).unwrap();
        assert!(result.iter().all(|c| (0.0..=1.0).contains(&c.intensity)));
        let hit = synth.synthesize(Position::new(0.0, 0.0), 3.0).unwrap();
        assert_eq!(hit.contributions()[0].intensity, 1.0);
    }

    #[test]
    fn test_degenerate_layout_fails() {
        let layout = ActuatorLayout::new([
            (0, Position::new(0.0, 0.0)),
            (1, Position::new(30.0, 0.0)),
            (2, Position::new(60.0, 0.0)),
        ])
        .unwrap();
        let index = TriangulationIndex::build(&layout, 25.0);
        let synth = PhantomSynthesizer::new(&layout, &index, 0.1);
        assert_eq!(
            synth.synthesize(Position::new(15.0, 5.0), 0.5),
            Err(PhantomError::DegenerateLayout { actuators: 3 })
        );
        // Exact hits still work without triangles.
        assert!(synth.synthesize(Position::new(30.0, 0.0), 0.5).is_ok());
    }

    #[test]
    fn test_nan_inputs_rejected() {
        let (layout, index) = grid();
        let synth = PhantomSynthesizer::new(&layout, &index, 0.1);
        assert!(matches!(
            synth.synthesize(Position::new(f64::NAN, 0.0), 0.5),
            Err(PhantomError::NonFiniteTarget(_))
        ));
        assert!(matches!(
            synth.synthesize(Position::new(10.0, 10.0), f64::NAN),
            Err(PhantomError::NonFiniteIntensity(_))
        ));
    }
}
