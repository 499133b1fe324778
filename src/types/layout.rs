//! Actuator Layout Model
//!
//! Static map of actuator id to planar position. Built once at configuration
//! time and never mutated afterwards.

use super::geometry::Position;
use std::collections::BTreeMap;
use thiserror::Error;

/// Actuator address as wired on the controller bus.
pub type ActuatorId = u8;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("Actuator {id} appears more than once in the layout")]
    DuplicateActuator { id: ActuatorId },

    #[error("Actuator {id} has a non-finite position {position}")]
    NonFinitePosition { id: ActuatorId, position: Position },

    #[error("Grid {rows}x{cols} does not fit actuator ids 0-255")]
    GridTooLarge { rows: usize, cols: usize },

    #[error("Grid spacing must be finite and > 0, got {0}")]
    InvalidSpacing(f64),
}

/// Immutable id -> position mapping, iterated in ascending id order.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorLayout {
    positions: BTreeMap<ActuatorId, Position>,
}

impl ActuatorLayout {
    /// Build a layout, rejecting duplicate ids and non-finite coordinates.
    pub fn new<I>(entries: I) -> Result<Self, LayoutError>
    where
        I: IntoIterator<Item = (ActuatorId, Position)>,
    {
        let mut positions = BTreeMap::new();
        for (id, position) in entries {
            if !position.is_finite() {
                return Err(LayoutError::NonFinitePosition { id, position });
            }
            if positions.insert(id, position).is_some() {
                return Err(LayoutError::DuplicateActuator { id });
            }
        }
        Ok(Self { positions })
    }

    /// Boustrophedon grid: even rows run left to right, odd rows right to left,
    /// matching how the actuator chain is daisy-chained across the sleeve.
    ///
    /// `serpentine_grid(4, 4, 60.0)` yields rows `0 1 2 3 / 7 6 5 4 / 8 9 10 11 / 15 14 13 12`.
    pub fn serpentine_grid(rows: usize, cols: usize, spacing: f64) -> Result<Self, LayoutError> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(LayoutError::InvalidSpacing(spacing));
        }
        if rows.saturating_mul(cols) > usize::from(ActuatorId::MAX) + 1 {
            return Err(LayoutError::GridTooLarge { rows, cols });
        }

        let mut entries = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let chain_col = if row % 2 == 0 { col } else { cols - 1 - col };
                let id = ActuatorId::try_from(row * cols + chain_col)
                    .map_err(|_| LayoutError::GridTooLarge { rows, cols })?;
                entries.push((id, Position::new(col as f64 * spacing, row as f64 * spacing)));
            }
        }
        Self::new(entries)
    }

    pub fn position(&self, id: ActuatorId) -> Option<Position> {
        self.positions.get(&id).copied()
    }

    /// Actuator whose stored position equals `target` exactly.
    pub fn actuator_at(&self, target: Position) -> Option<ActuatorId> {
        self.positions
            .iter()
            .find(|(_, &p)| p == target)
            .map(|(&id, _)| id)
    }

    pub fn contains(&self, id: ActuatorId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ActuatorId> + '_ {
        self.positions.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActuatorId, Position)> + '_ {
        self.positions.iter().map(|(&id, &p)| (id, p))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
