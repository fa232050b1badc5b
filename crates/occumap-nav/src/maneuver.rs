//! Translate an annotated path into drive commands.
//!
//! The robot drives cell to cell along the heading of the cell it is leaving
//! and turns on the spot once it arrives, so a turn always follows the move
//! into the cell where the heading changes.

use occumap_core::{Heading, PathStep};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Maneuver {
    /// Drive straight ahead this many cells.
    Forward { cells: usize },
    /// Rotate 90 degrees counter-clockwise.
    TurnLeft,
    /// Rotate 90 degrees clockwise.
    TurnRight,
    TurnAround,
}

/// Rotation needed to go from one heading to another, if any.
pub fn turn_between(from: Heading, to: Heading) -> Option<Maneuver> {
    let delta = (360 + to.degrees() - from.degrees()) % 360;
    match delta {
        90 => Some(Maneuver::TurnLeft),
        180 => Some(Maneuver::TurnAround),
        270 => Some(Maneuver::TurnRight),
        _ => None,
    }
}

/// Commands for a robot already facing the first step's heading.
pub fn maneuvers(steps: &[PathStep]) -> Vec<Maneuver> {
    match steps.first() {
        Some(first) => maneuvers_from(first.heading, steps),
        None => Vec::new(),
    }
}

/// Commands for a robot starting at the first step facing `initial`.
pub fn maneuvers_from(initial: Heading, steps: &[PathStep]) -> Vec<Maneuver> {
    let mut out = Vec::new();
    let Some(first) = steps.first() else {
        return out;
    };
    if let Some(turn) = turn_between(initial, first.heading) {
        out.push(turn);
    }

    for pair in steps.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        if from.index() != to.index() {
            push_forward(&mut out);
        }
        if let Some(turn) = turn_between(from.heading, to.heading) {
            out.push(turn);
        }
    }
    out
}

fn push_forward(out: &mut Vec<Maneuver>) {
    if let Some(Maneuver::Forward { cells }) = out.last_mut() {
        *cells += 1;
    } else {
        out.push(Maneuver::Forward { cells: 1 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use occumap_core::{annotate_headings, GridIndex};

    fn steps(cells: &[(i64, i64)]) -> Vec<PathStep> {
        let cells: Vec<GridIndex> = cells.iter().copied().map(GridIndex::from).collect();
        annotate_headings(&cells)
    }

    #[test]
    fn turn_direction_wraps_around_east() {
        assert_eq!(turn_between(Heading::South, Heading::East), Some(Maneuver::TurnLeft));
        assert_eq!(turn_between(Heading::East, Heading::South), Some(Maneuver::TurnRight));
        assert_eq!(turn_between(Heading::East, Heading::North), Some(Maneuver::TurnLeft));
        assert_eq!(turn_between(Heading::North, Heading::South), Some(Maneuver::TurnAround));
        assert_eq!(turn_between(Heading::West, Heading::West), None);
    }

    #[test]
    fn straight_run_merges_forwards() {
        let path = steps(&[(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert_eq!(maneuvers(&path), vec![Maneuver::Forward { cells: 3 }]);
    }

    #[test]
    fn l_shape_turns_after_arriving() {
        let path = steps(&[(0, 0), (1, 0), (2, 0), (2, 1), (2, 2)]);
        assert_eq!(
            maneuvers(&path),
            vec![
                Maneuver::Forward { cells: 2 },
                Maneuver::TurnLeft,
                Maneuver::Forward { cells: 2 },
            ]
        );
    }

    #[test]
    fn left_turn_then_right_turn() {
        let path = steps(&[(0, 2), (0, 1), (1, 1), (1, 0)]);
        assert_eq!(
            maneuvers(&path),
            vec![
                Maneuver::Forward { cells: 1 },
                Maneuver::TurnLeft,
                Maneuver::Forward { cells: 1 },
                Maneuver::TurnRight,
                Maneuver::Forward { cells: 1 },
            ]
        );
    }

    #[test]
    fn initial_alignment_is_prepended() {
        let path = steps(&[(0, 0), (0, 1)]);
        assert_eq!(
            maneuvers_from(Heading::East, &path),
            vec![Maneuver::TurnLeft, Maneuver::Forward { cells: 1 }]
        );
    }

    #[test]
    fn single_cell_path_needs_nothing() {
        assert!(maneuvers(&steps(&[(4, 4)])).is_empty());
        assert!(maneuvers(&[]).is_empty());
    }
}
