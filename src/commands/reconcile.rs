//! Reconcile and verify command implementations

use super::common::{format_record, print_json, CommandContext};
use crate::{Position, Result, ScenarioId, Season, TeamId};

/// Handle the reconcile command
pub fn handle_reconcile(
    ctx: &mut CommandContext,
    team: &TeamId,
    position: Position,
    season: Season,
    scenario: Option<ScenarioId>,
    as_json: bool,
) -> Result<()> {
    let (_, result) = ctx.update(Some(season), |engine| {
        engine.reconcile_group(team, position, season, scenario)
    })?;

    if as_json {
        return print_json(&result);
    }

    println!(
        "{} {} in scenario {}:",
        result.team, result.position, result.scenario_id
    );
    for residual in &result.residuals {
        println!(
            "  {:<16} envelope {:>9.2}  allocated {:>9.2}  residual {:>9.2}",
            residual.field.as_str(),
            residual.envelope,
            residual.allocated,
            residual.display_value()
        );
    }
    for inconsistency in &result.inconsistencies {
        println!("  ⚠ {}", inconsistency.to_error());
    }
    match &result.fill {
        Some(fill) => println!("{}", format_record(fill)),
        None => println!("  No fill player needed"),
    }
    Ok(())
}

/// Handle the verify command
pub fn handle_verify(
    ctx: &mut CommandContext,
    team: &TeamId,
    season: Season,
    scenario: Option<ScenarioId>,
    as_json: bool,
) -> Result<()> {
    let engine = ctx.engine(Some(season))?;
    let report = engine.verify_team(team, season, scenario)?;

    if as_json {
        return print_json(&report);
    }

    let epsilon = ctx.config.fill.epsilon;
    println!(
        "{} {} in scenario {}: {} records ({} fill)",
        report.team, report.season, report.scenario_id, report.records, report.fill_players
    );
    for check in &report.checks {
        let marker = if check.residual.abs() <= epsilon { "✓" } else { "✗" };
        println!(
            "  {} {:<16} team {:>9.2}  allocated {:>9.2}  residual {:>9.2}",
            marker,
            check.field.as_str(),
            check.team_total,
            check.allocated,
            check.residual
        );
    }
    if report.is_consistent(epsilon) {
        println!("✓ Team totals are consistent");
    } else {
        println!("✗ Team totals do not reconcile");
    }
    Ok(())
}
