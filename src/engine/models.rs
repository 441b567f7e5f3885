//! Engine data model: ingestion inputs, projection records, overrides, scenarios.

use super::stats::{safe_div, StatField, StatLine};
use crate::cli::types::{OverrideId, PlayerId, Position, ProjectionId, ScenarioId, Season, TeamId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Team-level offensive tendencies for one season.
///
/// Rates are fractions: `pass_rate` of plays are pass attempts, `sack_rate` of
/// plays are sacks, the remainder are rush attempts. `fumble_rate` is lost
/// fumbles per carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSeasonProfile {
    pub team: TeamId,
    pub season: Season,
    pub games: f64,
    pub plays_per_game: f64,
    pub pass_rate: f64,
    pub sack_rate: f64,
    pub yards_per_sack: f64,
    pub yards_per_attempt: f64,
    pub completion_pct: f64,
    pub int_rate: f64,
    pub pass_td_rate: f64,
    /// Fraction of pass attempts that are charted as targets.
    pub target_rate: f64,
    pub yards_per_carry: f64,
    pub rush_td_rate: f64,
    pub fumble_rate: f64,
    /// A closed season rejects further profile updates.
    #[serde(default)]
    pub closed: bool,
}

/// One efficiency metric's history against its position baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricBaseline {
    pub raw: f64,
    pub mean: f64,
    pub stddev: f64,
    pub years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEfficiencyProfile {
    pub player_id: PlayerId,
    pub season: Season,
    pub position: Position,
    pub metrics: BTreeMap<StatField, MetricBaseline>,
}

impl PlayerEfficiencyProfile {
    /// Longest history across the player's metrics.
    pub fn years_of_history(&self) -> u32 {
        self.metrics.values().map(|m| m.years).max().unwrap_or(0)
    }
}

/// A player's fractions of team pass attempts, rush attempts and targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageShares {
    pub pass: f64,
    pub rush: f64,
    pub target: f64,
}

/// Share adjustments; each present value is applied per the configured mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareAdjustments {
    pub pass: Option<f64>,
    pub rush: Option<f64>,
    pub target: Option<f64>,
}

/// Who plays for a team and how much of its volume they get.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerUsageProfile {
    pub player_id: PlayerId,
    pub name: String,
    pub team: TeamId,
    pub season: Season,
    pub position: Position,
    pub games: f64,
    pub shares: UsageShares,
    #[serde(default)]
    pub adjustments: Option<ShareAdjustments>,
}

/// Game-to-game variability history for a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalVariance {
    pub player_id: PlayerId,
    pub season: Season,
    pub seasons: u32,
    /// Per-game coefficient of variation by stat.
    pub coefficients: BTreeMap<StatField, f64>,
}

/// Team volume a record's shares were multiplied against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamVolume {
    pub pass_attempts: f64,
    pub rush_attempts: f64,
    pub targets: f64,
    /// Team yards lost to sacks; charged to passers pro rata by attempts.
    #[serde(default)]
    pub sack_yards: f64,
}

impl TeamVolume {
    pub fn sack_yards_per_attempt(&self) -> f64 {
        safe_div(self.sack_yards, self.pass_attempts, 0.0)
    }
}

/// One player's (or fill player's) projection within a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRecord {
    pub id: ProjectionId,
    pub scenario_id: ScenarioId,
    /// `None` for fill players.
    pub player_id: Option<PlayerId>,
    pub name: String,
    pub team: TeamId,
    pub position: Position,
    pub season: Season,
    pub volume: TeamVolume,
    pub games_in_season: f64,
    pub stats: StatLine,
    /// Frozen fields mapped to the value the engine had calculated for them.
    #[serde(default)]
    pub frozen: BTreeMap<StatField, f64>,
    pub has_overrides: bool,
    pub is_fill_player: bool,
}

impl ProjectionRecord {
    pub fn is_frozen(&self, field: StatField) -> bool {
        self.frozen.contains_key(&field)
    }

    pub fn fantasy_points(&self) -> f64 {
        self.stats.fantasy_points
    }
}

/// Append-only log row: an analyst value displacing a calculated one.
///
/// A `cleared` row unfreezes the field; the latest row per field wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatOverride {
    pub id: OverrideId,
    pub projection_id: ProjectionId,
    pub field: StatField,
    pub calculated_value: f64,
    pub manual_value: f64,
    pub notes: Option<String>,
    pub created_at: u64,
    #[serde(default)]
    pub cleared: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub name: String,
    pub season: Season,
    pub is_baseline: bool,
    pub base_scenario_id: Option<ScenarioId>,
    pub created_at: u64,
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
