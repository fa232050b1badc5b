//! Navigation configuration from environment.

use anyhow::{ensure, Result};
use occumap_core::{GridBuilderConfig, PathFinderConfig};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub builder: GridBuilderConfig,
    pub pathfinder: PathFinderConfig,
}

impl Config {
    /// Read `OCCUMAP_*` variables, keeping defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GridBuilderConfig::default();

        Self {
            builder: GridBuilderConfig {
                scale_step: parsed(lookup("OCCUMAP_SCALE_STEP")).unwrap_or(defaults.scale_step),
                max_iterations: parsed(lookup("OCCUMAP_MAX_SCALE_ITERATIONS"))
                    .unwrap_or(defaults.max_iterations),
                occupancy_threshold: parsed(lookup("OCCUMAP_OCCUPANCY_THRESHOLD"))
                    .unwrap_or(defaults.occupancy_threshold),
                unvisited_value: parsed(lookup("OCCUMAP_UNVISITED_VALUE"))
                    .unwrap_or(defaults.unvisited_value),
                max_cells: defaults.max_cells,
            },
            pathfinder: PathFinderConfig {
                allow_blocked_endpoints: parsed(lookup("OCCUMAP_ALLOW_BLOCKED_ENDPOINTS"))
                    .unwrap_or(false),
                max_expansions: parsed(lookup("OCCUMAP_MAX_EXPANSIONS")),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.builder.validate()?;
        if let Some(cap) = self.pathfinder.max_expansions {
            ensure!(cap > 0, "max_expansions must be at least 1");
        }
        Ok(())
    }
}

fn parsed<T: FromStr>(raw: Option<String>) -> Option<T> {
    raw.and_then(|s| s.trim().parse().ok())
}
