//! Occupancy grid construction from trajectory samples.
//!
//! Trajectory points are locations the robot has visited, so they are free
//! space. Everything else starts out as "probably occupied". The builder
//! searches for the finest cell scale at which the free cells form a map the
//! 4-connected path finder can actually traverse.

use crate::error::{OccumapError, Result};
use crate::grid::{OccupancyGrid, DEFAULT_OCCUPANCY_THRESHOLD, DIAGONAL, FREE_VALUE, ORTHOGONAL};
use crate::models::{CellState, GridIndex, GridOffset, WorldPoint};
use serde::{Deserialize, Serialize};

/// Default unvisited cell value; above the default threshold, so occupied.
pub const DEFAULT_UNVISITED_VALUE: f64 = 0.6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridBuilderConfig {
    /// Scale of the first attempt, and the increment between attempts
    pub scale_step: f64,
    /// Number of scales tried before giving up
    pub max_iterations: usize,
    pub occupancy_threshold: f64,
    /// Value given to every cell no trajectory point falls in
    pub unvisited_value: f64,
    /// Candidate scales needing more cells than this are skipped
    pub max_cells: usize,
}

impl Default for GridBuilderConfig {
    fn default() -> Self {
        Self {
            scale_step: 0.1,
            max_iterations: 1000,
            occupancy_threshold: DEFAULT_OCCUPANCY_THRESHOLD,
            unvisited_value: DEFAULT_UNVISITED_VALUE,
            max_cells: 16 * 1024 * 1024,
        }
    }
}

impl GridBuilderConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.scale_step.is_finite() && self.scale_step > 0.0) {
            return Err(OccumapError::InvalidConfig(format!(
                "scale step {} must be a positive finite number",
                self.scale_step
            )));
        }
        if self.max_iterations == 0 {
            return Err(OccumapError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.occupancy_threshold) {
            return Err(OccumapError::InvalidConfig(format!(
                "occupancy threshold {} is outside [0, 1]",
                self.occupancy_threshold
            )));
        }
        if OccupancyGrid::classify_value(self.unvisited_value, self.occupancy_threshold)
            != CellState::Occupied
        {
            return Err(OccumapError::InvalidConfig(format!(
                "unvisited value {} must lie in [threshold {}, 1]",
                self.unvisited_value, self.occupancy_threshold
            )));
        }
        if self.max_cells == 0 {
            return Err(OccumapError::InvalidConfig(
                "max_cells must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builds an [`OccupancyGrid`] from an unordered set of trajectory points.
#[derive(Debug, Clone)]
pub struct GridBuilder {
    config: GridBuilderConfig,
}

impl GridBuilder {
    pub fn new(config: GridBuilderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: GridBuilderConfig::default(),
        }
    }

    pub fn config(&self) -> &GridBuilderConfig {
        &self.config
    }

    /// Scale tried on the given 1-based attempt.
    pub fn scale_for_attempt(&self, attempt: usize) -> f64 {
        self.config.scale_step * attempt as f64
    }

    /// Try successively coarser scales until the rasterized grid validates.
    ///
    /// Fails with [`OccumapError::GridConstructionFailed`] once
    /// `max_iterations` scales have been rejected.
    pub fn build(&self, points: &[WorldPoint]) -> Result<OccupancyGrid> {
        check_points(points)?;

        let mut last_scale = self.config.scale_step;
        for attempt in 1..=self.config.max_iterations {
            let scale = self.scale_for_attempt(attempt);
            last_scale = scale;

            let Some(grid) = self.rasterize(points, scale)? else {
                tracing::debug!(
                    "Scale {:.3} skipped: grid would exceed {} cells",
                    scale,
                    self.config.max_cells
                );
                continue;
            };

            match find_invalid_cell(&grid) {
                None => {
                    tracing::info!(
                        "Built {}x{} grid at scale {:.3} after {} attempt(s)",
                        grid.width(),
                        grid.height(),
                        scale,
                        attempt
                    );
                    return Ok(grid);
                }
                Some(cell) => {
                    tracing::debug!(
                        "Scale {:.3} rejected: free cell ({}, {}) is not 4-connected",
                        scale,
                        cell.col,
                        cell.row
                    );
                }
            }
        }

        tracing::warn!(
            "Grid construction gave up after {} attempts (last scale {:.3})",
            self.config.max_iterations,
            last_scale
        );
        Err(OccumapError::GridConstructionFailed {
            attempts: self.config.max_iterations,
            last_scale,
        })
    }

    /// Rasterize `points` at a single `scale` without validating the result.
    ///
    /// Returns `Ok(None)` when the grid would exceed `max_cells`.
    pub fn rasterize(&self, points: &[WorldPoint], scale: f64) -> Result<Option<OccupancyGrid>> {
        check_points(points)?;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(OccumapError::InvalidConfig(format!(
                "scale {} must be a positive finite number",
                scale
            )));
        }

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            let (x, y) = (p.x / scale, p.y / scale);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        // Only negative minimums are shifted; the shift is a whole number of cells.
        let shift_x = if min_x < 0.0 { (-min_x).ceil() } else { 0.0 };
        let shift_y = if min_y < 0.0 { (-min_y).ceil() } else { 0.0 };

        let span_x = (max_x + shift_x).floor() + 1.0;
        let span_y = (max_y + shift_y).floor() + 1.0;
        if !(span_x.is_finite() && span_y.is_finite())
            || span_x * span_y > self.config.max_cells as f64
        {
            return Ok(None);
        }
        let (width, height) = (span_x as usize, span_y as usize);

        let mut grid = OccupancyGrid::new(
            width,
            height,
            self.config.unvisited_value,
            self.config.occupancy_threshold,
            scale,
            GridOffset::new(-(shift_x as i64), -(shift_y as i64)),
        )?;

        for p in points {
            let cell = GridIndex::new(
                (p.x / scale + shift_x).floor() as i64,
                (p.y / scale + shift_y).floor() as i64,
            );
            grid.set(cell, FREE_VALUE)?;
        }

        Ok(Some(grid))
    }
}

impl Default for GridBuilder {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn check_points(points: &[WorldPoint]) -> Result<()> {
    if points.is_empty() {
        return Err(OccumapError::EmptyTrajectory);
    }
    if let Some((index, p)) = points.iter().enumerate().find(|(_, p)| !p.is_finite()) {
        return Err(OccumapError::InvalidPoint {
            index,
            x: p.x,
            y: p.y,
        });
    }
    Ok(())
}

/// True when every free cell is reachable by 4-connected moves from a
/// neighbour and no two free cells touch only at a corner.
pub fn is_map_valid(grid: &OccupancyGrid) -> bool {
    find_invalid_cell(grid).is_none()
}

/// First free cell breaking the connectivity rules, in row-major order.
///
/// A free cell needs at least one free orthogonal neighbour. For each free
/// diagonal neighbour, one of the two cells shared by both must be free too.
/// Neighbours outside the grid are skipped.
pub fn find_invalid_cell(grid: &OccupancyGrid) -> Option<GridIndex> {
    grid.iter()
        .map(|(index, _)| index)
        .filter(|index| grid.is_free(*index))
        .find(|index| !cell_is_connected(grid, *index))
}

fn cell_is_connected(grid: &OccupancyGrid, cell: GridIndex) -> bool {
    let has_orthogonal = ORTHOGONAL
        .iter()
        .any(|(dc, dr)| grid.is_free(cell.offset(*dc, *dr)));
    if !has_orthogonal {
        return false;
    }

    DIAGONAL.iter().all(|(dc, dr)| {
        let diagonal = cell.offset(*dc, *dr);
        if !grid.is_free(diagonal) {
            return true;
        }
        grid.is_free(cell.offset(*dc, 0)) || grid.is_free(cell.offset(0, *dr))
    })
}
