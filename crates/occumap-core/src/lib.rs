//! Occupancy grid mapping and path search for trajectory-built maps.
//!
//! A [`GridBuilder`] turns visited trajectory points into an
//! [`OccupancyGrid`]; a [`PathFinder`] runs A* across that grid and returns a
//! heading-annotated path for downstream motor control.

pub mod builder;
pub mod error;
pub mod grid;
pub mod models;
pub mod pathfinding;

pub use builder::{find_invalid_cell, is_map_valid, GridBuilder, GridBuilderConfig};
pub use error::{Endpoint, OccumapError, Result};
pub use grid::OccupancyGrid;
pub use models::{CellState, GridIndex, GridOffset, Heading, PathStep, WorldPoint};
pub use pathfinding::{annotate_headings, find_path, Path, PathFinder, PathFinderConfig, SearchOutcome};
