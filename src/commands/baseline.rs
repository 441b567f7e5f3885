//! Baseline command implementation

use super::common::{print_json, print_records, CommandContext};
use crate::{Result, Season, TeamId};

/// Handle the baseline command
pub fn handle_baseline(
    ctx: &mut CommandContext,
    team: &TeamId,
    season: Season,
    as_json: bool,
) -> Result<()> {
    let (engine, records) =
        ctx.update(Some(season), |engine| engine.compute_baseline(team, season))?;

    if as_json {
        return print_json(&records);
    }

    let scenario = engine.baseline_id(season)?;
    println!(
        "✓ Baseline for {} {} in scenario {}: {} records",
        team,
        season,
        scenario,
        records.len()
    );
    print_records(&records);
    Ok(())
}
