//! Core value types shared across the grid, builder and path finder.

use serde::{Deserialize, Serialize};

/// Integer cell coordinate. `col` runs along +x, `row` along +y.
///
/// Signed so that world points left of or below the grid map to an index that
/// can be reported instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridIndex {
    pub col: i64,
    pub row: i64,
}

impl GridIndex {
    pub const fn new(col: i64, row: i64) -> Self {
        Self { col, row }
    }

    /// Manhattan distance to another cell.
    pub fn manhattan(&self, other: &GridIndex) -> u64 {
        self.col.abs_diff(other.col) + self.row.abs_diff(other.row)
    }

    pub fn offset(&self, dcol: i64, drow: i64) -> GridIndex {
        GridIndex {
            col: self.col + dcol,
            row: self.row + drow,
        }
    }
}

impl From<(i64, i64)> for GridIndex {
    fn from((col, row): (i64, i64)) -> Self {
        Self { col, row }
    }
}

/// Integer translation between world-scaled coordinates and grid indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridOffset {
    pub col: i64,
    pub row: i64,
}

impl GridOffset {
    pub const fn new(col: i64, row: i64) -> Self {
        Self { col, row }
    }
}

/// A point in world units (trajectory samples, robot positions).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for WorldPoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Classification of a single cell value against the occupancy threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    /// Value in `[threshold, 1]`
    Occupied,
    /// Value in `[0, threshold)`
    Unoccupied,
    /// Any value outside `[0, 1]`, canonically -1
    Unknown,
}

/// Cardinal travel direction attached to a path step.
///
/// Degrees are measured counter-clockwise from +x: 0 = +col, 90 = +row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    #[default]
    East,
    North,
    West,
    South,
}

impl Heading {
    pub fn degrees(&self) -> u16 {
        match self {
            Heading::East => 0,
            Heading::North => 90,
            Heading::West => 180,
            Heading::South => 270,
        }
    }

    pub fn from_degrees(degrees: u16) -> Option<Heading> {
        match degrees % 360 {
            0 => Some(Heading::East),
            90 => Some(Heading::North),
            180 => Some(Heading::West),
            270 => Some(Heading::South),
            _ => None,
        }
    }

    /// Heading of a unit step between orthogonal neighbours.
    ///
    /// Returns `None` when `from == to` or the cells are not axis-aligned.
    pub fn between(from: GridIndex, to: GridIndex) -> Option<Heading> {
        let dcol = to.col - from.col;
        let drow = to.row - from.row;
        match (dcol.signum(), drow.signum()) {
            (1, 0) => Some(Heading::East),
            (-1, 0) => Some(Heading::West),
            (0, 1) => Some(Heading::North),
            (0, -1) => Some(Heading::South),
            _ => None,
        }
    }
}

/// One cell of an annotated path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub col: i64,
    pub row: i64,
    pub heading: Heading,
}

impl PathStep {
    pub fn index(&self) -> GridIndex {
        GridIndex::new(self.col, self.row)
    }

    pub fn heading_deg(&self) -> u16 {
        self.heading.degrees()
    }
}
