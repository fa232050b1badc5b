//! Occumap navigation - trajectory in, drive commands out.
//!
//! This crate wires the core grid builder and path finder into the pipeline a
//! robot host runs:
//! - config: `OCCUMAP_*` environment settings
//! - trajectory: keyframe CSV ingestion
//! - planner: map ownership and route requests
//! - maneuver: path to forward/turn commands

pub mod config;
pub mod maneuver;
pub mod planner;
pub mod trajectory;

pub use config::Config;
pub use maneuver::{maneuvers, maneuvers_from, turn_between, Maneuver};
pub use planner::{NavigationPlan, NavigationPlanner};
pub use trajectory::read_trajectory_csv;
