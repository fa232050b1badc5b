//! Navigation planner: owns the current map and answers route requests.

use crate::config::Config;
use crate::maneuver::{maneuvers, Maneuver};
use crate::trajectory::read_trajectory_csv;
use anyhow::{Context, Result};
use occumap_core::{
    GridBuilder, GridIndex, OccupancyGrid, PathFinder, PathStep, SearchOutcome, WorldPoint,
};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// A route ready for the motor controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationPlan {
    pub steps: Vec<PathStep>,
    pub maneuvers: Vec<Maneuver>,
    /// Search hit its expansion cap; steps stop short of the goal.
    pub degraded: bool,
    pub nodes_expanded: usize,
}

impl NavigationPlan {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("serializing navigation plan")
    }
}

/// Holds one grid at a time; loading a new trajectory replaces it.
#[derive(Debug)]
pub struct NavigationPlanner {
    builder: GridBuilder,
    finder: PathFinder,
    grid: Option<OccupancyGrid>,
}

impl NavigationPlanner {
    pub fn new(config: Config) -> Result<Self> {
        config.validate().context("invalid navigation config")?;
        Ok(Self {
            builder: GridBuilder::new(config.builder)?,
            finder: PathFinder::new(config.pathfinder),
            grid: None,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env())
    }

    pub fn grid(&self) -> Option<&OccupancyGrid> {
        self.grid.as_ref()
    }

    /// Build a grid from trajectory points, replacing any previous grid.
    pub fn load_trajectory(&mut self, points: &[WorldPoint]) -> Result<&OccupancyGrid> {
        let grid = self
            .builder
            .build(points)
            .with_context(|| format!("building grid from {} trajectory points", points.len()))?;
        tracing::info!(
            "Loaded {}x{} grid (cell size {:.3})",
            grid.width(),
            grid.height(),
            grid.cell_size()
        );
        Ok(&*self.grid.insert(grid))
    }

    pub fn load_trajectory_csv<R: Read>(&mut self, reader: R) -> Result<&OccupancyGrid> {
        let points = read_trajectory_csv(reader)?;
        self.load_trajectory(&points)
    }

    /// Use an existing grid, e.g. one reloaded from a CSV dump.
    pub fn load_grid(&mut self, grid: OccupancyGrid) {
        self.grid = Some(grid);
    }

    fn current_grid(&self) -> Result<&OccupancyGrid> {
        self.grid
            .as_ref()
            .context("no grid loaded; load a trajectory first")
    }

    /// Plan between two cells. `Ok(None)` means the end is unreachable.
    pub fn plan(&self, start: GridIndex, end: GridIndex) -> Result<Option<NavigationPlan>> {
        let grid = self.current_grid()?;
        let outcome = self
            .finder
            .find_path(grid, start, end)
            .with_context(|| {
                format!(
                    "planning ({}, {}) -> ({}, {})",
                    start.col, start.row, end.col, end.row
                )
            })?;

        let degraded = outcome.is_degraded();
        let plan = match outcome {
            SearchOutcome::Found(path) | SearchOutcome::Degraded(path) => NavigationPlan {
                maneuvers: maneuvers(&path.steps),
                steps: path.steps,
                degraded,
                nodes_expanded: path.nodes_expanded,
            },
            SearchOutcome::NotFound { nodes_expanded } => {
                tracing::info!(
                    "No route from ({}, {}) to ({}, {}) after {} expansions",
                    start.col,
                    start.row,
                    end.col,
                    end.row,
                    nodes_expanded
                );
                return Ok(None);
            }
        };
        Ok(Some(plan))
    }

    /// Plan between two world positions, snapped with `world_to_index`.
    pub fn plan_world(&self, start: WorldPoint, end: WorldPoint) -> Result<Option<NavigationPlan>> {
        let grid = self.current_grid()?;
        let start = grid
            .try_world_to_index(start)
            .context("snapping start position to the grid")?;
        let end = grid
            .try_world_to_index(end)
            .context("snapping end position to the grid")?;
        self.plan(start, end)
    }

    /// Dump the current grid as a CSV matrix.
    pub fn export_grid_csv<W: Write>(&self, writer: W) -> Result<()> {
        self.current_grid()?
            .write_csv(writer)
            .context("writing grid CSV")
    }
}
