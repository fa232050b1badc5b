//! Error taxonomy shared by the grid, builder and path finder.

use thiserror::Error;

/// Errors surfaced by grid access, grid construction and path search.
///
/// An exhausted search is not an error; see
/// [`SearchOutcome::NotFound`](crate::pathfinding::SearchOutcome::NotFound).
#[derive(Debug, Error)]
pub enum OccumapError {
    /// Index lies outside `[0, width) x [0, height)`.
    #[error("cell ({col}, {row}) is outside the {width}x{height} grid")]
    OutOfBounds {
        col: i64,
        row: i64,
        width: usize,
        height: usize,
    },

    /// A search endpoint lies outside the grid.
    #[error("{which} cell ({col}, {row}) is outside the grid")]
    InvalidEndpoint {
        which: Endpoint,
        col: i64,
        row: i64,
    },

    /// A search endpoint is not an unoccupied cell.
    #[error("{which} cell ({col}, {row}) is not traversable")]
    BlockedEndpoint {
        which: Endpoint,
        col: i64,
        row: i64,
    },

    /// No candidate scale produced a valid grid within the iteration cap.
    #[error("no valid grid after {attempts} scale attempts (last scale {last_scale})")]
    GridConstructionFailed { attempts: usize, last_scale: f64 },

    #[error("trajectory contains no points")]
    EmptyTrajectory,

    #[error("trajectory point {index} is not finite: ({x}, {y})")]
    InvalidPoint { index: usize, x: f64, y: f64 },

    /// A world-coordinate lookup was given a NaN or infinite point.
    #[error("world point ({x}, {y}) is not finite")]
    NonFiniteCoordinate { x: f64, y: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// CSV matrix could not be parsed into a rectangular grid.
    #[error("malformed matrix at line {line}: {reason}")]
    MalformedMatrix { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Which end of a search request an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    End,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Start => write!(f, "start"),
            Endpoint::End => write!(f, "end"),
        }
    }
}

pub type Result<T> = std::result::Result<T, OccumapError>;
