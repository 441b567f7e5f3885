//! Entry point: parse CLI and dispatch to command handlers.

use clap::Parser;
use gridiron_proj::{
    cli::{Commands, GridironProj},
    commands::{
        baseline::handle_baseline,
        overrides::{handle_clear_override, handle_override},
        reconcile::{handle_reconcile, handle_verify},
        scenarios::{handle_clone_scenario, handle_delete_scenario, handle_list_scenarios},
        variance::handle_variance,
        CommandContext,
    },
    Result,
};
use tracing_subscriber::EnvFilter;

/// Run the CLI.
fn main() -> Result<()> {
    let app = GridironProj::parse();

    // Logs go to stderr so --json output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut ctx = CommandContext::new(app.config.as_deref(), app.db.as_deref())?;

    match app.command {
        Commands::Baseline { team, season, json } => {
            handle_baseline(&mut ctx, &team, season, json)?
        }

        Commands::Override {
            projection,
            stat,
            value,
            notes,
            json,
        } => handle_override(&mut ctx, projection, &stat, value, notes, json)?,

        Commands::ClearOverride {
            projection,
            stat,
            json,
        } => handle_clear_override(&mut ctx, projection, &stat, json)?,

        Commands::Reconcile {
            team,
            position,
            season,
            scenario,
            json,
        } => handle_reconcile(&mut ctx, &team, position, season, scenario, json)?,

        Commands::CloneScenario { source, name, json } => {
            handle_clone_scenario(&mut ctx, source, &name, json)?
        }

        Commands::Scenarios { season, json } => handle_list_scenarios(&ctx, season, json)?,

        Commands::DeleteScenario { id, json } => handle_delete_scenario(&mut ctx, id, json)?,

        Commands::Variance {
            projection,
            confidence,
            json,
        } => handle_variance(&ctx, projection, confidence, json)?,

        Commands::Verify {
            team,
            season,
            scenario,
            json,
        } => handle_verify(&mut ctx, &team, season, scenario, json)?,
    }

    Ok(())
}
