//! Grid construction and search over generated trajectories.

use occumap_core::{
    find_path, is_map_valid, CellState, GridBuilder, GridIndex, OccupancyGrid, SearchOutcome,
    WorldPoint,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Densely swept rectangle of visited points, spacing at most 0.05.
fn sweep(x0: f64, x1: f64, y0: f64, y1: f64) -> Vec<WorldPoint> {
    let nx = ((x1 - x0) / 0.05).ceil().max(1.0) as usize;
    let ny = ((y1 - y0) / 0.05).ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            points.push(WorldPoint::new(
                x0 + (x1 - x0) * i as f64 / nx as f64,
                y0 + (y1 - y0) * j as f64 / ny as f64,
            ));
        }
    }
    points
}

/// Rooms and corridors that all pass through a shared hub around the origin,
/// so the swept area is connected and never touches itself only at a corner.
fn random_floor_plan(seed: u64, rooms: usize) -> Vec<WorldPoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = Vec::new();
    for _ in 0..rooms {
        let x0 = rng.random_range(-3.0..0.0);
        let x1 = rng.random_range(0.3..3.0);
        let y0 = rng.random_range(-3.0..0.0);
        let y1 = rng.random_range(0.3..3.0);
        points.extend(sweep(x0, x1, y0, y1));
    }
    points
}

/// Cell the builder marks for a trajectory point.
fn marked_cell(grid: &OccupancyGrid, p: WorldPoint) -> GridIndex {
    let offset = grid.origin_offset();
    GridIndex::new(
        (p.x / grid.cell_size() - offset.col as f64).floor() as i64,
        (p.y / grid.cell_size() - offset.row as f64).floor() as i64,
    )
}

#[test]
fn built_grids_always_validate() {
    init_tracing();
    let builder = GridBuilder::with_defaults();
    for seed in 0..20 {
        let points = random_floor_plan(seed, 4);
        let grid = builder.build(&points).unwrap();
        assert!(is_map_valid(&grid), "seed {} produced an invalid grid", seed);
        assert!(grid.count_state(CellState::Unoccupied) >= 2);
        assert_eq!(grid.count_state(CellState::Unknown), 0);
    }
}

#[test]
fn trajectory_endpoints_are_connected() {
    init_tracing();
    let builder = GridBuilder::with_defaults();
    for seed in 100..110 {
        let points = random_floor_plan(seed, 3);
        let grid = builder.build(&points).unwrap();

        let start = marked_cell(&grid, points[0]);
        let end = marked_cell(&grid, points[points.len() - 1]);
        assert!(grid.is_unoccupied(start).unwrap());
        assert!(grid.is_unoccupied(end).unwrap());

        let outcome = find_path(&grid, start, end).unwrap();
        let path = match outcome {
            SearchOutcome::Found(path) => path,
            other => panic!("seed {}: expected a path, got {:?}", seed, other),
        };

        assert_eq!(path.steps.first().map(|s| s.index()), Some(start));
        assert_eq!(path.steps.last().map(|s| s.index()), Some(end));
        assert!(path.len() as u64 > start.manhattan(&end));
        assert!(path.nodes_expanded <= grid.cell_count());
        for pair in path.steps.windows(2) {
            assert_eq!(pair[0].index().manhattan(&pair[1].index()), 1);
        }
        assert!(path.cells().all(|c| grid.is_unoccupied(c).unwrap()));
    }
}

#[test]
fn world_round_trip_on_built_grid() {
    let grid = GridBuilder::with_defaults()
        .build(&random_floor_plan(7, 2))
        .unwrap();
    for (index, _) in grid.iter() {
        assert_eq!(grid.world_to_index(grid.index_to_world(index)), index);
    }
}

#[test]
fn csv_dump_reloads_identically() {
    let grid = GridBuilder::with_defaults()
        .build(&random_floor_plan(3, 2))
        .unwrap();
    let mut buf = Vec::new();
    grid.write_csv(&mut buf).unwrap();

    let reloaded = OccupancyGrid::read_csv(
        buf.as_slice(),
        grid.occupancy_threshold(),
        grid.cell_size(),
        grid.origin_offset(),
    )
    .unwrap();
    assert_eq!(reloaded, grid);
    assert!(is_map_valid(&reloaded));
}
