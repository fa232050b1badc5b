//! Dense occupancy grid with coordinate transforms and cell classification.
//!
//! Cells hold a floating-point likelihood of obstruction, stored row-major.
//! Every access is bounds checked and reports [`OccumapError::OutOfBounds`]
//! rather than clamping.

use crate::error::{OccumapError, Result};
use crate::models::{CellState, GridIndex, GridOffset, WorldPoint};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Read, Write};

/// Default occupancy threshold.
pub const DEFAULT_OCCUPANCY_THRESHOLD: f64 = 0.5;

/// Canonical value for a cell that was never observed.
pub const UNKNOWN_VALUE: f64 = -1.0;

/// Value written for a cell known to be free.
pub const FREE_VALUE: f64 = 0.0;

/// The four orthogonal neighbour offsets: up, down, left, right.
pub(crate) const ORTHOGONAL: [(i64, i64); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// The four diagonal neighbour offsets.
pub(crate) const DIAGONAL: [(i64, i64); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridRepr", into = "GridRepr")]
pub struct OccupancyGrid {
    width: usize,
    height: usize,
    cells: Vec<f64>,
    occupancy_threshold: f64,
    cell_size: f64,
    origin_offset: GridOffset,
}

/// Wire form of a grid; validated on the way back in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GridRepr {
    width: usize,
    height: usize,
    cells: Vec<f64>,
    occupancy_threshold: f64,
    cell_size: f64,
    origin_offset: GridOffset,
}

impl From<OccupancyGrid> for GridRepr {
    fn from(grid: OccupancyGrid) -> Self {
        Self {
            width: grid.width,
            height: grid.height,
            cells: grid.cells,
            occupancy_threshold: grid.occupancy_threshold,
            cell_size: grid.cell_size,
            origin_offset: grid.origin_offset,
        }
    }
}

impl TryFrom<GridRepr> for OccupancyGrid {
    type Error = OccumapError;

    fn try_from(repr: GridRepr) -> Result<Self> {
        validate_parameters(repr.occupancy_threshold, repr.cell_size)?;
        if repr.width == 0 || repr.height == 0 {
            return Err(OccumapError::InvalidConfig(
                "grid dimensions must be non-zero".to_string(),
            ));
        }
        let expected = repr.width.checked_mul(repr.height).ok_or_else(|| {
            OccumapError::InvalidConfig("grid dimensions overflow".to_string())
        })?;
        if repr.cells.len() != expected {
            return Err(OccumapError::InvalidConfig(format!(
                "expected {} cells for a {}x{} grid, got {}",
                expected,
                repr.width,
                repr.height,
                repr.cells.len()
            )));
        }
        Ok(Self {
            width: repr.width,
            height: repr.height,
            cells: repr.cells,
            occupancy_threshold: repr.occupancy_threshold,
            cell_size: repr.cell_size,
            origin_offset: repr.origin_offset,
        })
    }
}

fn validate_parameters(threshold: f64, cell_size: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(OccumapError::InvalidConfig(format!(
            "occupancy threshold {} is outside [0, 1]",
            threshold
        )));
    }
    if !(cell_size.is_finite() && cell_size > 0.0) {
        return Err(OccumapError::InvalidConfig(format!(
            "cell size {} must be a positive finite number",
            cell_size
        )));
    }
    Ok(())
}

impl OccupancyGrid {
    /// Create a `width` x `height` grid with every cell set to `fill`.
    pub fn new(
        width: usize,
        height: usize,
        fill: f64,
        occupancy_threshold: f64,
        cell_size: f64,
        origin_offset: GridOffset,
    ) -> Result<Self> {
        let cell_count = width.checked_mul(height).ok_or_else(|| {
            OccumapError::InvalidConfig("grid dimensions overflow".to_string())
        })?;
        GridRepr {
            width,
            height,
            cells: vec![fill; cell_count],
            occupancy_threshold,
            cell_size,
            origin_offset,
        }
        .try_into()
    }

    /// Build a grid from rows of cell values, row 0 first.
    pub fn from_rows(
        rows: Vec<Vec<f64>>,
        occupancy_threshold: f64,
        cell_size: f64,
        origin_offset: GridOffset,
    ) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(row) = rows.iter().position(|r| r.len() != width) {
            return Err(OccumapError::MalformedMatrix {
                line: row + 1,
                reason: format!("expected {} columns, got {}", width, rows[row].len()),
            });
        }
        GridRepr {
            width,
            height,
            cells: rows.into_iter().flatten().collect(),
            occupancy_threshold,
            cell_size,
            origin_offset,
        }
        .try_into()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn occupancy_threshold(&self) -> f64 {
        self.occupancy_threshold
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn origin_offset(&self) -> GridOffset {
        self.origin_offset
    }

    /// Bounds check only; occupancy is not consulted.
    pub fn is_valid(&self, index: GridIndex) -> bool {
        index.col >= 0
            && index.row >= 0
            && (index.col as u64) < self.width as u64
            && (index.row as u64) < self.height as u64
    }

    fn linear(&self, index: GridIndex) -> Result<usize> {
        if !self.is_valid(index) {
            return Err(OccumapError::OutOfBounds {
                col: index.col,
                row: index.row,
                width: self.width,
                height: self.height,
            });
        }
        Ok(index.row as usize * self.width + index.col as usize)
    }

    pub fn get(&self, index: GridIndex) -> Result<f64> {
        let i = self.linear(index)?;
        Ok(self.cells[i])
    }

    pub fn set(&mut self, index: GridIndex, value: f64) -> Result<()> {
        let i = self.linear(index)?;
        self.cells[i] = value;
        Ok(())
    }

    /// Classify a raw value against `threshold`.
    pub fn classify_value(value: f64, threshold: f64) -> CellState {
        if (threshold..=1.0).contains(&value) {
            CellState::Occupied
        } else if (0.0..threshold).contains(&value) {
            CellState::Unoccupied
        } else {
            CellState::Unknown
        }
    }

    pub fn classify(&self, index: GridIndex) -> Result<CellState> {
        let value = self.get(index)?;
        Ok(Self::classify_value(value, self.occupancy_threshold))
    }

    pub fn is_occupied(&self, index: GridIndex) -> Result<bool> {
        Ok(self.classify(index)? == CellState::Occupied)
    }

    pub fn is_unoccupied(&self, index: GridIndex) -> Result<bool> {
        Ok(self.classify(index)? == CellState::Unoccupied)
    }

    /// In-bounds and unoccupied. Out-of-range cells are simply not free.
    pub(crate) fn is_free(&self, index: GridIndex) -> bool {
        matches!(self.classify(index), Ok(CellState::Unoccupied))
    }

    /// `round(point / cell_size) - origin_offset`, per axis.
    ///
    /// The result may lie outside the grid; check with [`is_valid`](Self::is_valid).
    /// Points too far away to represent saturate to an out-of-range index.
    /// Non-finite points have no meaningful index; use
    /// [`try_world_to_index`](Self::try_world_to_index) to reject them.
    pub fn world_to_index(&self, point: WorldPoint) -> GridIndex {
        GridIndex {
            col: ((point.x / self.cell_size).round() as i64).saturating_sub(self.origin_offset.col),
            row: ((point.y / self.cell_size).round() as i64).saturating_sub(self.origin_offset.row),
        }
    }

    /// [`world_to_index`](Self::world_to_index) for finite points only.
    pub fn try_world_to_index(&self, point: WorldPoint) -> Result<GridIndex> {
        if !point.is_finite() {
            return Err(OccumapError::NonFiniteCoordinate {
                x: point.x,
                y: point.y,
            });
        }
        Ok(self.world_to_index(point))
    }

    /// `(index + origin_offset) * cell_size`, per axis.
    pub fn index_to_world(&self, index: GridIndex) -> WorldPoint {
        WorldPoint {
            x: index.col.saturating_add(self.origin_offset.col) as f64 * self.cell_size,
            y: index.row.saturating_add(self.origin_offset.row) as f64 * self.cell_size,
        }
    }

    pub fn get_world(&self, point: WorldPoint) -> Result<f64> {
        self.get(self.try_world_to_index(point)?)
    }

    pub fn set_world(&mut self, point: WorldPoint, value: f64) -> Result<()> {
        let index = self.try_world_to_index(point)?;
        self.set(index, value)
    }

    pub fn classify_world(&self, point: WorldPoint) -> Result<CellState> {
        self.classify(self.try_world_to_index(point)?)
    }

    /// Iterate over every cell in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridIndex, f64)> + '_ {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(i, value)| {
            let index = GridIndex::new((i % width) as i64, (i / width) as i64);
            (index, *value)
        })
    }

    /// Cell values of one row, or `None` past the last row.
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.height {
            return None;
        }
        let start = row * self.width;
        Some(&self.cells[start..start + self.width])
    }

    pub fn count_state(&self, state: CellState) -> usize {
        self.cells
            .iter()
            .filter(|value| Self::classify_value(**value, self.occupancy_threshold) == state)
            .count()
    }

    /// Write the cell matrix as CSV, one grid row per line, row 0 first.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> Result<()> {
        for row in self.cells.chunks(self.width) {
            let line = row
                .iter()
                .map(|value| value.to_string())
                .collect::<Vec<_>>()
                .join(",");
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Parse a CSV matrix written by [`write_csv`](Self::write_csv).
    ///
    /// Blank lines are ignored. Rows must all have the same length.
    pub fn read_csv<R: Read>(
        reader: R,
        occupancy_threshold: f64,
        cell_size: f64,
        origin_offset: GridOffset,
    ) -> Result<Self> {
        let mut rows: Vec<Vec<f64>> = Vec::new();
        for (line_no, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let row = trimmed
                .split(',')
                .map(|field| {
                    field
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| OccumapError::MalformedMatrix {
                            line: line_no + 1,
                            reason: format!("'{}' is not a number", field.trim()),
                        })
                })
                .collect::<Result<Vec<f64>>>()?;
            if let Some(first) = rows.first() {
                if first.len() != row.len() {
                    return Err(OccumapError::MalformedMatrix {
                        line: line_no + 1,
                        reason: format!("expected {} columns, got {}", first.len(), row.len()),
                    });
                }
            }
            rows.push(row);
        }
        if rows.is_empty() {
            return Err(OccumapError::MalformedMatrix {
                line: 0,
                reason: "matrix is empty".to_string(),
            });
        }
        Self::from_rows(rows, occupancy_threshold, cell_size, origin_offset)
    }
}
