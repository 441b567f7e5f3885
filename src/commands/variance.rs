//! Variance command implementation

use super::common::{print_json, CommandContext};
use crate::{ProjectionId, Result};

/// Handle the variance command
pub fn handle_variance(
    ctx: &CommandContext,
    projection: ProjectionId,
    confidence: f64,
    as_json: bool,
) -> Result<()> {
    let engine = ctx.engine(None)?;
    let estimate = engine.get_variance_estimate(projection, confidence)?;

    if as_json {
        return print_json(&estimate);
    }

    let source = if estimate.used_position_default {
        "position default"
    } else {
        "player history"
    };
    println!(
        "Projection {} at {} ({} seasons, {}):",
        estimate.projection_id, estimate.confidence, estimate.seasons, source
    );
    for (field, bounds) in &estimate.bounds {
        println!(
            "  {:<16} {:>9.2} ± {:>7.2}  [{:>9.2}, {:>9.2}]",
            field.as_str(),
            bounds.projected,
            bounds.stddev,
            bounds.lower,
            bounds.upper
        );
    }
    Ok(())
}
