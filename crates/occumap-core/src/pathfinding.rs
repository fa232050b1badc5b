//! A* search over an occupancy grid.
//!
//! Moves are restricted to the four orthogonal neighbours and every step costs
//! one cell, so the Manhattan heuristic is admissible and found paths are
//! shortest. Search nodes live in an arena owned by a single call; each node
//! refers to its parent by arena id.

use crate::error::{Endpoint, OccumapError, Result};
use crate::grid::{OccupancyGrid, ORTHOGONAL};
use crate::models::{GridIndex, Heading, PathStep};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathFinderConfig {
    /// Accept start/end cells that are occupied or unknown.
    pub allow_blocked_endpoints: bool,
    /// Expansion cap; `None` uses `width * height`.
    pub max_expansions: Option<usize>,
}

/// A turn-annotated path from start to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub steps: Vec<PathStep>,
    /// Distinct cells expanded while searching
    pub nodes_expanded: usize,
}

impl Path {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = GridIndex> + '_ {
        self.steps.iter().map(PathStep::index)
    }

    /// Number of places where the heading differs from the previous step.
    pub fn heading_changes(&self) -> usize {
        self.steps
            .windows(2)
            .filter(|pair| pair[0].heading != pair[1].heading)
            .count()
    }
}

/// Result of a search that passed its preconditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// The end cell was reached.
    Found(Path),
    /// The expansion cap was hit; path leads to the last expanded cell.
    Degraded(Path),
    /// The reachable region was exhausted without meeting the end cell.
    NotFound { nodes_expanded: usize },
}

impl SearchOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            SearchOutcome::Found(path) | SearchOutcome::Degraded(path) => Some(path),
            SearchOutcome::NotFound { .. } => None,
        }
    }

    pub fn into_path(self) -> Option<Path> {
        match self {
            SearchOutcome::Found(path) | SearchOutcome::Degraded(path) => Some(path),
            SearchOutcome::NotFound { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SearchOutcome::Degraded(_))
    }

    pub fn nodes_expanded(&self) -> usize {
        match self {
            SearchOutcome::Found(path) | SearchOutcome::Degraded(path) => path.nodes_expanded,
            SearchOutcome::NotFound { nodes_expanded } => *nodes_expanded,
        }
    }
}

#[derive(Debug, Clone)]
struct SearchNode {
    index: GridIndex,
    parent: Option<usize>,
    g: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f: u64,
    h: u64,
    node: usize,
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    // Lowest f first, then closest to the goal, then oldest entry.
    fn cmp(&self, other: &Self) -> Ordering {
        self.f
            .cmp(&other.f)
            .then_with(|| self.h.cmp(&other.h))
            .then_with(|| self.node.cmp(&other.node))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathFinder {
    config: PathFinderConfig,
}

impl PathFinder {
    pub fn new(config: PathFinderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PathFinderConfig {
        &self.config
    }

    /// Search for a shortest 4-connected path from `start` to `end`.
    ///
    /// Endpoint violations are errors; an unreachable end is
    /// [`SearchOutcome::NotFound`].
    pub fn find_path(
        &self,
        grid: &OccupancyGrid,
        start: GridIndex,
        end: GridIndex,
    ) -> Result<SearchOutcome> {
        self.check_endpoint(grid, start, Endpoint::Start)?;
        self.check_endpoint(grid, end, Endpoint::End)?;

        let cap = self.config.max_expansions.unwrap_or(grid.cell_count());
        tracing::debug!(
            "A* search ({}, {}) -> ({}, {}), expansion cap {}",
            start.col,
            start.row,
            end.col,
            end.row,
            cap
        );

        let mut arena = vec![SearchNode {
            index: start,
            parent: None,
            g: 0,
        }];
        let start_h = start.manhattan(&end);
        let mut open_set: BinaryHeap<Reverse<OpenEntry>> = BinaryHeap::new();
        open_set.push(Reverse(OpenEntry {
            f: start_h,
            h: start_h,
            node: 0,
        }));
        let mut best_g: HashMap<GridIndex, u64> = HashMap::from([(start, 0)]);
        let mut closed_set: HashSet<GridIndex> = HashSet::new();

        let mut last_expanded = 0usize;
        let mut nodes_expanded = 0usize;

        while let Some(Reverse(entry)) = open_set.pop() {
            let current = arena[entry.node].clone();
            if closed_set.contains(&current.index) {
                continue;
            }

            if nodes_expanded >= cap {
                let path = reconstruct(&arena, last_expanded, nodes_expanded);
                tracing::warn!(
                    "A* hit expansion cap {}; returning partial path of {} cells",
                    cap,
                    path.len()
                );
                return Ok(SearchOutcome::Degraded(path));
            }

            closed_set.insert(current.index);
            last_expanded = entry.node;
            nodes_expanded += 1;

            if current.index == end {
                let path = reconstruct(&arena, entry.node, nodes_expanded);
                tracing::debug!(
                    "A* found {} cell path after {} expansions",
                    path.len(),
                    nodes_expanded
                );
                return Ok(SearchOutcome::Found(path));
            }

            for (dcol, drow) in ORTHOGONAL {
                let next = current.index.offset(dcol, drow);
                if !self.is_traversable(grid, next, end) || closed_set.contains(&next) {
                    continue;
                }

                let tentative_g = current.g + 1;
                match best_g.get(&next) {
                    Some(&known) if known < tentative_g => continue,
                    Some(&known) if known == tentative_g => {}
                    _ => {
                        best_g.insert(next, tentative_g);
                    }
                }

                let h = next.manhattan(&end);
                arena.push(SearchNode {
                    index: next,
                    parent: Some(entry.node),
                    g: tentative_g,
                });
                open_set.push(Reverse(OpenEntry {
                    f: tentative_g + h,
                    h,
                    node: arena.len() - 1,
                }));
            }
        }

        tracing::debug!("A* exhausted open set after {} expansions", nodes_expanded);
        Ok(SearchOutcome::NotFound { nodes_expanded })
    }

    fn check_endpoint(&self, grid: &OccupancyGrid, index: GridIndex, which: Endpoint) -> Result<()> {
        if !grid.is_valid(index) {
            return Err(OccumapError::InvalidEndpoint {
                which,
                col: index.col,
                row: index.row,
            });
        }
        if !self.config.allow_blocked_endpoints && !grid.is_unoccupied(index)? {
            return Err(OccumapError::BlockedEndpoint {
                which,
                col: index.col,
                row: index.row,
            });
        }
        Ok(())
    }

    fn is_traversable(&self, grid: &OccupancyGrid, index: GridIndex, end: GridIndex) -> bool {
        grid.is_free(index)
            || (self.config.allow_blocked_endpoints && index == end && grid.is_valid(index))
    }
}

/// Search with the default configuration.
pub fn find_path(grid: &OccupancyGrid, start: GridIndex, end: GridIndex) -> Result<SearchOutcome> {
    PathFinder::default().find_path(grid, start, end)
}

fn reconstruct(arena: &[SearchNode], leaf: usize, nodes_expanded: usize) -> Path {
    let mut cells = Vec::new();
    let mut current = Some(leaf);
    while let Some(id) = current {
        cells.push(arena[id].index);
        current = arena[id].parent;
    }
    cells.reverse();

    Path {
        steps: annotate_headings(&cells),
        nodes_expanded,
    }
}

/// Attach to each cell the heading towards the next one.
///
/// The final cell repeats the previous heading; a lone cell faces east. A
/// repeated cell keeps the heading before it.
pub fn annotate_headings(cells: &[GridIndex]) -> Vec<PathStep> {
    let mut steps = Vec::with_capacity(cells.len());
    let mut heading = Heading::default();
    for (i, cell) in cells.iter().enumerate() {
        if let Some(next) = cells.get(i + 1) {
            if let Some(h) = Heading::between(*cell, *next) {
                heading = h;
            }
        }
        steps.push(PathStep {
            col: cell.col,
            row: cell.row,
            heading,
        });
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GridOffset;

    fn open_grid(width: usize, height: usize) -> OccupancyGrid {
        OccupancyGrid::new(width, height, 0.0, 0.5, 1.0, GridOffset::default()).unwrap()
    }

    fn assert_four_connected(path: &Path) {
        for pair in path.steps.windows(2) {
            assert_eq!(pair[0].index().manhattan(&pair[1].index()), 1, "{:?}", pair);
        }
    }

    #[test]
    fn open_grid_path_is_manhattan_optimal() {
        let grid = open_grid(5, 5);
        let outcome = find_path(&grid, GridIndex::new(0, 0), GridIndex::new(4, 4)).unwrap();
        let path = outcome.path().unwrap();
        assert!(outcome.is_found());
        assert_eq!(path.len(), 9);
        assert_eq!(path.steps[0].index(), GridIndex::new(0, 0));
        assert_eq!(path.steps[8].index(), GridIndex::new(4, 4));
        assert_four_connected(path);
        assert!(path.nodes_expanded <= 25);
    }

    #[test]
    fn start_equals_end_yields_single_step() {
        let grid = open_grid(3, 3);
        let outcome = find_path(&grid, GridIndex::new(1, 1), GridIndex::new(1, 1)).unwrap();
        let path = outcome.into_path().unwrap();
        assert_eq!(
            path.steps,
            vec![PathStep {
                col: 1,
                row: 1,
                heading: Heading::East
            }]
        );
    }

    #[test]
    fn enclosed_end_is_not_found() {
        let mut grid = open_grid(5, 5);
        for index in [
            GridIndex::new(2, 1),
            GridIndex::new(1, 2),
            GridIndex::new(3, 2),
            GridIndex::new(2, 3),
        ] {
            grid.set(index, 1.0).unwrap();
        }
        let outcome = find_path(&grid, GridIndex::new(0, 0), GridIndex::new(2, 2)).unwrap();
        // Every free cell outside the ring gets expanded once.
        assert_eq!(outcome, SearchOutcome::NotFound { nodes_expanded: 20 });
    }

    #[test]
    fn routes_around_a_wall() {
        // Wall at col 2 with a gap at the top row.
        let mut grid = open_grid(5, 4);
        for row in 0..3 {
            grid.set(GridIndex::new(2, row), 0.9).unwrap();
        }
        let outcome = find_path(&grid, GridIndex::new(0, 0), GridIndex::new(4, 0)).unwrap();
        let path = outcome.path().unwrap();
        assert_four_connected(path);
        assert!(path.cells().any(|c| c == GridIndex::new(2, 3)));
        // 4 across, 3 up and 3 back down.
        assert_eq!(path.len(), 11);
        assert!(path.cells().all(|c| grid.is_unoccupied(c).unwrap()));
    }

    #[test]
    fn unknown_cells_are_not_traversed() {
        let mut grid = open_grid(3, 1);
        grid.set(GridIndex::new(1, 0), -1.0).unwrap();
        let outcome = find_path(&grid, GridIndex::new(0, 0), GridIndex::new(2, 0)).unwrap();
        assert!(outcome.path().is_none());
    }

    #[test]
    fn endpoint_preconditions() {
        let mut grid = open_grid(3, 3);
        grid.set(GridIndex::new(2, 2), 0.7).unwrap();

        let err = find_path(&grid, GridIndex::new(-1, 0), GridIndex::new(1, 1)).unwrap_err();
        assert!(matches!(
            err,
            OccumapError::InvalidEndpoint {
                which: Endpoint::Start,
                ..
            }
        ));
        let err = find_path(&grid, GridIndex::new(0, 0), GridIndex::new(3, 0)).unwrap_err();
        assert!(matches!(
            err,
            OccumapError::InvalidEndpoint {
                which: Endpoint::End,
                ..
            }
        ));
        let err = find_path(&grid, GridIndex::new(0, 0), GridIndex::new(2, 2)).unwrap_err();
        assert!(matches!(
            err,
            OccumapError::BlockedEndpoint {
                which: Endpoint::End,
                col: 2,
                row: 2
            }
        ));
    }

    #[test]
    fn blocked_endpoints_allowed_when_configured() {
        let mut grid = open_grid(3, 3);
        grid.set(GridIndex::new(0, 0), 0.7).unwrap();
        grid.set(GridIndex::new(2, 2), 0.7).unwrap();
        let finder = PathFinder::new(PathFinderConfig {
            allow_blocked_endpoints: true,
            ..Default::default()
        });
        let outcome = finder
            .find_path(&grid, GridIndex::new(0, 0), GridIndex::new(2, 2))
            .unwrap();
        assert_eq!(outcome.path().map(Path::len), Some(5));
    }

    #[test]
    fn expansion_cap_returns_degraded_partial_path() {
        let grid = open_grid(10, 1);
        let finder = PathFinder::new(PathFinderConfig {
            max_expansions: Some(4),
            ..Default::default()
        });
        let outcome = finder
            .find_path(&grid, GridIndex::new(0, 0), GridIndex::new(9, 0))
            .unwrap();
        assert!(outcome.is_degraded());
        let path = outcome.path().unwrap();
        assert_eq!(path.nodes_expanded, 4);
        assert_eq!(
            path.cells().collect::<Vec<_>>(),
            (0..4).map(|c| GridIndex::new(c, 0)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn headings_follow_the_next_cell() {
        let cells = [
            GridIndex::new(0, 0),
            GridIndex::new(1, 0),
            GridIndex::new(1, 1),
            GridIndex::new(0, 1),
            GridIndex::new(0, 0),
        ];
        let degrees: Vec<u16> = annotate_headings(&cells)
            .iter()
            .map(PathStep::heading_deg)
            .collect();
        assert_eq!(degrees, vec![0, 90, 180, 270, 270]);
    }

    #[test]
    fn repeated_cell_keeps_heading() {
        let cells = [
            GridIndex::new(0, 0),
            GridIndex::new(0, 0),
            GridIndex::new(0, 1),
        ];
        let headings: Vec<Heading> = annotate_headings(&cells).iter().map(|s| s.heading).collect();
        assert_eq!(headings, vec![Heading::East, Heading::North, Heading::North]);
    }

    #[test]
    fn open_entries_pop_lowest_f_then_lowest_h() {
        let mut heap = BinaryHeap::new();
        heap.push(Reverse(OpenEntry { f: 5, h: 3, node: 0 }));
        heap.push(Reverse(OpenEntry { f: 4, h: 4, node: 1 }));
        heap.push(Reverse(OpenEntry { f: 5, h: 1, node: 2 }));
        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|Reverse(e)| e.node)).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }
}
