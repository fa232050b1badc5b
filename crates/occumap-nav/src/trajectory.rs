//! Keyframe trajectory ingestion.
//!
//! Keyframe exports are CSV with `x,y` or `x,y,z` columns; height is dropped
//! since the map is planar.

use anyhow::{bail, Context, Result};
use occumap_core::WorldPoint;
use std::io::{BufRead, BufReader, Read};

/// Parse trajectory points from CSV.
///
/// Blank lines and `#` comments are skipped, as is a header on the first
/// non-blank line.
pub fn read_trajectory_csv<R: Read>(reader: R) -> Result<Vec<WorldPoint>> {
    let mut points = Vec::new();
    let mut seen_data_line = false;

    for (line_no, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.with_context(|| format!("reading trajectory line {}", line_no + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let first_line = !seen_data_line;
        seen_data_line = true;

        let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        let x = fields[0].parse::<f64>();
        if first_line && x.is_err() {
            tracing::debug!("Skipping trajectory header: {}", trimmed);
            continue;
        }
        if fields.len() < 2 {
            bail!(
                "trajectory line {}: expected at least 2 columns, got {}",
                line_no + 1,
                fields.len()
            );
        }

        let x = x.with_context(|| format!("trajectory line {}: bad x '{}'", line_no + 1, fields[0]))?;
        let y = fields[1]
            .parse::<f64>()
            .with_context(|| format!("trajectory line {}: bad y '{}'", line_no + 1, fields[1]))?;
        points.push(WorldPoint::new(x, y));
    }

    tracing::debug!("Read {} trajectory points", points.len());
    Ok(points)
}
