//! Scenario command implementations: clone, list and delete

use super::common::{print_json, CommandContext};
use crate::{engine::models::Scenario, Result, ScenarioId, Season};

fn format_scenario(scenario: &Scenario) -> String {
    let origin = match (scenario.is_baseline, scenario.base_scenario_id) {
        (true, _) => "baseline".to_string(),
        (false, Some(base)) => format!("from {}", base),
        (false, None) => String::new(),
    };
    format!(
        "{:>4}  {:<28} {}  {}",
        scenario.id, scenario.name, scenario.season, origin
    )
}

/// Handle the clone-scenario command
pub fn handle_clone_scenario(
    ctx: &mut CommandContext,
    source: ScenarioId,
    name: &str,
    as_json: bool,
) -> Result<()> {
    let (_, scenario) = ctx.update(None, |engine| engine.clone_scenario(source, name))?;

    if as_json {
        return print_json(&scenario);
    }
    println!("✓ Cloned scenario {} into {}", source, scenario.id);
    println!("{}", format_scenario(&scenario));
    Ok(())
}

/// Handle the scenarios command
pub fn handle_list_scenarios(
    ctx: &CommandContext,
    season: Option<Season>,
    as_json: bool,
) -> Result<()> {
    let engine = ctx.engine(season)?;
    let scenarios = engine.list_scenarios(season);

    if as_json {
        return print_json(&scenarios);
    }
    if scenarios.is_empty() {
        println!("No scenarios found");
    }
    for scenario in &scenarios {
        println!("{}", format_scenario(scenario));
    }
    Ok(())
}

/// Handle the delete-scenario command
pub fn handle_delete_scenario(
    ctx: &mut CommandContext,
    id: ScenarioId,
    as_json: bool,
) -> Result<()> {
    let (_, removed) = ctx.update(None, |engine| engine.delete_scenario(id))?;

    if as_json {
        return print_json(&removed);
    }
    println!("✓ Deleted scenario {} ({})", removed.id, removed.name);
    Ok(())
}
