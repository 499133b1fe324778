//! Triangulation Index
//!
//! Enumerates every unordered actuator triple once, keeps the triangles whose
//! shoelace area reaches the configured minimum and sorts them by descending
//! area. Lookup prefers the first (largest) containing triangle and falls back
//! to the triangle with the closest centroid.

use crate::types::{edge_cross, ActuatorId, ActuatorLayout, Position};
use tracing::debug;

/// A candidate actuator triangle. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub actuators: [ActuatorId; 3],
    pub vertices: [Position; 3],
    pub area: f64,
    pub centroid: Position,
}

impl Triangle {
    fn new(actuators: [ActuatorId; 3], vertices: [Position; 3]) -> Self {
        let [a, b, c] = vertices;
        Self {
            actuators,
            vertices,
            area: shoelace_area(a, b, c),
            centroid: Position::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0),
        }
    }

    /// Same-sign cross product test. Points on an edge or vertex count as inside.
    pub fn contains(&self, point: Position) -> bool {
        let [a, b, c] = self.vertices;
        let d1 = edge_cross(point, a, b);
        let d2 = edge_cross(point, b, c);
        let d3 = edge_cross(point, c, a);

        let has_negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
        let has_positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
        !(has_negative && has_positive)
    }
}

/// Unsigned triangle area via the shoelace formula.
pub fn shoelace_area(a: Position, b: Position, c: Position) -> f64 {
    ((a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y)) / 2.0).abs()
}

/// Precomputed, read-only set of usable actuator triangles.
///
/// Safe to share across threads by reference; nothing mutates it after `build`.
#[derive(Debug, Clone)]
pub struct TriangulationIndex {
    triangles: Vec<Triangle>,
    min_area: f64,
}

impl TriangulationIndex {
    /// Build the index from a layout.
    ///
    /// Cost is O(n^3) in the actuator count; a 16-actuator sleeve has 560
    /// triples, a fully populated 128-address bus about 341k.
    pub fn build(layout: &ActuatorLayout, min_area: f64) -> Self {
        let actuators: Vec<(ActuatorId, Position)> = layout.iter().collect();
        let n = actuators.len();
        let mut triangles = Vec::new();
        let mut rejected = 0usize;

        for i in 0..n {
            for j in (i + 1)..n {
                for k in (j + 1)..n {
                    let (ia, pa) = actuators[i];
                    let (ib, pb) = actuators[j];
                    let (ic, pc) = actuators[k];
                    let triangle = Triangle::new([ia, ib, ic], [pa, pb, pc]);
                    if triangle.area >= min_area {
                        triangles.push(triangle);
                    } else {
                        rejected += 1;
                    }
                }
            }
        }

        // Stable: equal areas keep enumeration (ascending id) order.
        triangles.sort_by(|a, b| b.area.total_cmp(&a.area));

        debug!(
            actuators = n,
            triangles = triangles.len(),
            rejected = rejected,
            min_area = min_area,
            "Triangulation index built"
        );

        Self { triangles, min_area }
    }

    /// Triangle used to render a phantom at `point`.
    ///
    /// Returns `None` only when the index is empty.
    pub fn lookup(&self, point: Position) -> Option<&Triangle> {
        self.triangles
            .iter()
            .find(|t| t.contains(point))
            .or_else(|| {
                self.triangles.iter().min_by(|a, b| {
                    a.centroid
                        .distance_to(point)
                        .total_cmp(&b.centroid.distance_to(point))
                })
            })
    }

    /// Triangles in lookup order (descending area).
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn min_area(&self) -> f64 {
        self.min_area
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}
