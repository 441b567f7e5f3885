//! CLI argument definitions and parsing.

pub mod types;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use types::{Position, ProjectionId, ScenarioId, Season, TeamId};

#[derive(Debug, Parser)]
#[clap(
    name = "gridiron-proj",
    about = "Team-constrained fantasy football projections"
)]
pub struct GridironProj {
    /// Engine configuration file (or set `GRIDIRON_PROJ_CONFIG`).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file (or set `GRIDIRON_PROJ_DB`).
    #[clap(long, global = true)]
    pub db: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compute (or recompute) the baseline projections for a team.
    ///
    /// Existing overrides on the team's baseline records are replayed.
    Baseline {
        /// Team abbreviation (e.g. KC).
        #[clap(long, short)]
        team: TeamId,

        /// Season year (e.g. 2025).
        #[clap(long, short, default_value_t = Season::default())]
        season: Season,

        /// Output results as JSON instead of text lines.
        #[clap(long)]
        json: bool,
    },

    /// Override one stat on a projection and cascade to its dependents.
    Override {
        #[clap(long, short)]
        projection: ProjectionId,

        /// Stat name, e.g. `pass_attempts`, `ypc`, `target_share`.
        #[clap(long)]
        stat: String,

        #[clap(long, allow_hyphen_values = true)]
        value: f64,

        /// Free-form analyst note stored with the override.
        #[clap(long)]
        notes: Option<String>,

        /// Output results as JSON instead of text lines.
        #[clap(long)]
        json: bool,
    },

    /// Remove an override, restoring the calculated value.
    ClearOverride {
        #[clap(long, short)]
        projection: ProjectionId,

        #[clap(long)]
        stat: String,

        /// Output results as JSON instead of text lines.
        #[clap(long)]
        json: bool,
    },

    /// Reconcile one team/position group and show its fill player.
    Reconcile {
        #[clap(long, short)]
        team: TeamId,

        #[clap(long, value_enum)]
        position: Position,

        #[clap(long, short, default_value_t = Season::default())]
        season: Season,

        /// Scenario to reconcile (defaults to the season's baseline).
        #[clap(long)]
        scenario: Option<ScenarioId>,

        /// Output results as JSON instead of text lines.
        #[clap(long)]
        json: bool,
    },

    /// Deep-copy a scenario into a new named branch.
    CloneScenario {
        #[clap(long)]
        source: ScenarioId,

        #[clap(long)]
        name: String,

        /// Output results as JSON instead of text lines.
        #[clap(long)]
        json: bool,
    },

    /// List scenarios, optionally for one season.
    Scenarios {
        #[clap(long, short)]
        season: Option<Season>,

        /// Output results as JSON instead of text lines.
        #[clap(long)]
        json: bool,
    },

    /// Delete a non-baseline scenario with its records and overrides.
    DeleteScenario {
        #[clap(long)]
        id: ScenarioId,

        /// Output results as JSON instead of text lines.
        #[clap(long)]
        json: bool,
    },

    /// Confidence bounds for a projection.
    Variance {
        #[clap(long, short)]
        projection: ProjectionId,

        /// Confidence level: 0.5, 0.8, 0.9 or 0.95.
        #[clap(long, short, default_value_t = 0.8)]
        confidence: f64,

        /// Output results as JSON instead of text lines.
        #[clap(long)]
        json: bool,
    },

    /// Check that a team's projections sum to its team totals.
    Verify {
        #[clap(long, short)]
        team: TeamId,

        #[clap(long, short, default_value_t = Season::default())]
        season: Season,

        /// Scenario to verify (defaults to the season's baseline).
        #[clap(long)]
        scenario: Option<ScenarioId>,

        /// Output results as JSON instead of text lines.
        #[clap(long)]
        json: bool,
    },
}
