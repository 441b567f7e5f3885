//! Fill players: the residual between a team envelope and its real players.
//!
//! Each position group owns a fraction of every team total (see
//! [`crate::config::PositionAllocation`]). Whatever the real players in the
//! group do not account for is held by one synthetic record per group, so
//! that the team total always equals the sum over every record.

use super::{
    models::{ProjectionRecord, TeamVolume},
    stats::{safe_div, StatField, StatLine},
    team::TeamTotals,
};
use crate::{
    cli::types::{Position, ProjectionId, ScenarioId, Season, TeamId},
    config::FillConfig,
    error::ProjectionError,
};
use serde::Serialize;
use std::collections::BTreeMap;


/// One counting stat's envelope against what the real players hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Residual {
    pub field: StatField,
    pub envelope: f64,
    pub allocated: f64,
    pub residual: f64,
}

impl Residual {
    /// Residual clamped at zero, for display only.
    pub fn display_value(&self) -> f64 {
        self.residual.max(0.0)
    }
}

/// A group whose real players exceed their envelope beyond tolerance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inconsistency {
    pub team: TeamId,
    pub position: Position,
    pub field: StatField,
    pub excess: f64,
}

impl Inconsistency {
    pub fn to_error(&self) -> ProjectionError {
        ProjectionError::ReconciliationInconsistency {
            team: self.team.to_string(),
            position: self.position.to_string(),
            field: self.field.to_string(),
            excess: self.excess,
        }
    }
}

/// The team/position group being reconciled within a scenario.
#[derive(Debug, Clone, Copy)]
pub struct FillGroup<'a> {
    pub scenario_id: ScenarioId,
    pub team: &'a TeamId,
    pub position: Position,
    pub season: Season,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub team: TeamId,
    pub position: Position,
    pub scenario_id: ScenarioId,
    pub residuals: Vec<Residual>,
    pub inconsistencies: Vec<Inconsistency>,
    /// `None` when every residual is within epsilon of zero.
    pub fill: Option<ProjectionRecord>,
}

/// Team total against the sum of every record (fill players included).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryCheck {
    pub field: StatField,
    pub team_total: f64,
    pub allocated: f64,
    pub residual: f64,
}

pub fn fill_name(team: &TeamId, position: Position) -> String {
    format!("{team} {position} (fill)")
}

pub struct FillReconciler<'a> {
    config: &'a FillConfig,
    games_in_season: f64,
}

impl<'a> FillReconciler<'a> {
    pub fn new(config: &'a FillConfig, games_in_season: f64) -> Self {
        Self {
            config,
            games_in_season,
        }
    }

    /// The part of the team total for `field` owned by `position`.
    pub fn envelope(&self, totals: &TeamTotals, position: Position, field: StatField) -> f64 {
        let total = totals.for_field(field).unwrap_or(0.0);
        match field.volume_kind() {
            Some(kind) => total * self.config.position_allocation.weight(kind, position),
            None => 0.0,
        }
    }

    pub fn residuals(
        &self,
        totals: &TeamTotals,
        position: Position,
        players: &[&ProjectionRecord],
    ) -> Vec<Residual> {
        StatField::COUNTS
            .iter()
            .map(|&field| {
                let envelope = self.envelope(totals, position, field);
                let allocated: f64 = players
                    .iter()
                    .filter(|r| !r.is_fill_player)
                    .map(|r| r.stats.get(field))
                    .sum();
                Residual {
                    field,
                    envelope,
                    allocated,
                    residual: envelope - allocated,
                }
            })
            .collect()
    }

    /// Compute the fill record for one group.
    ///
    /// `fill_id` is used when the group has no fill record yet; an existing
    /// fill keeps its identity.
    pub fn reconcile(
        &self,
        totals: &TeamTotals,
        group: FillGroup<'_>,
        players: &[&ProjectionRecord],
        existing_fill: Option<&ProjectionRecord>,
        fill_id: ProjectionId,
    ) -> Reconciliation {
        let residuals = self.residuals(totals, group.position, players);

        let inconsistencies = residuals
            .iter()
            .filter(|r| r.residual < -self.config.negative_tolerance)
            .map(|r| Inconsistency {
                team: group.team.clone(),
                position: group.position,
                field: r.field,
                excess: -r.residual,
            })
            .collect();

        let balanced = residuals
            .iter()
            .all(|r| r.residual.abs() <= self.config.epsilon);
        let fill = if balanced {
            None
        } else {
            let id = existing_fill.map(|f| f.id).unwrap_or(fill_id);
            Some(self.fill_record(id, totals, group, &residuals))
        };

        Reconciliation {
            team: group.team.clone(),
            position: group.position,
            scenario_id: group.scenario_id,
            residuals,
            inconsistencies,
            fill,
        }
    }

    fn fill_record(
        &self,
        id: ProjectionId,
        totals: &TeamTotals,
        group: FillGroup<'_>,
        residuals: &[Residual],
    ) -> ProjectionRecord {
        let volume = totals.volume();
        let mut stats = StatLine {
            games: self.games_in_season,
            ..Default::default()
        };
        for r in residuals {
            stats.set(r.field, r.residual);
        }
        derive_fill_rates(&mut stats, &volume);
        stats.fantasy_points = stats.fantasy_points_formula();

        ProjectionRecord {
            id,
            scenario_id: group.scenario_id,
            player_id: None,
            name: fill_name(group.team, group.position),
            team: group.team.clone(),
            position: group.position,
            season: group.season,
            volume,
            games_in_season: self.games_in_season,
            stats,
            frozen: BTreeMap::new(),
            has_overrides: false,
            is_fill_player: true,
        }
    }
}

/// Shares and rates implied by a fill record's residual counts.
fn derive_fill_rates(stats: &mut StatLine, volume: &TeamVolume) {
    stats.pass_share = safe_div(stats.pass_attempts, volume.pass_attempts, 0.0);
    stats.rush_share = safe_div(stats.rush_attempts, volume.rush_attempts, 0.0);
    stats.target_share = safe_div(stats.targets, volume.targets, 0.0);
    stats.completion_pct = safe_div(stats.completions, stats.pass_attempts, 0.0);
    stats.yards_per_attempt = safe_div(stats.gross_pass_yards, stats.pass_attempts, 0.0);
    stats.pass_td_rate = safe_div(stats.pass_tds, stats.pass_attempts, 0.0);
    stats.int_rate = safe_div(stats.interceptions, stats.pass_attempts, 0.0);
    stats.yards_per_carry = safe_div(stats.gross_rush_yards, stats.rush_attempts, 0.0);
    stats.rush_td_rate = safe_div(stats.rush_tds, stats.rush_attempts, 0.0);
    stats.fumble_rate = safe_div(stats.fumbles_lost, stats.rush_attempts, 0.0);
    stats.catch_rate = safe_div(stats.receptions, stats.targets, 0.0);
    stats.yards_per_reception = safe_div(stats.rec_yards, stats.receptions, 0.0);
    stats.rec_td_rate = safe_div(stats.rec_tds, stats.targets, 0.0);
}

/// Compare every team total with the sum over all of the team's records.
pub fn verify_totals(totals: &TeamTotals, records: &[&ProjectionRecord]) -> Vec<CategoryCheck> {
    StatField::COUNTS
        .iter()
        .map(|&field| {
            let team_total = totals.for_field(field).unwrap_or(0.0);
            let allocated: f64 = records.iter().map(|r| r.stats.get(field)).sum();
            CategoryCheck {
                field,
                team_total,
                allocated,
                residual: team_total - allocated,
            }
        })
        .collect()
}
