//! Player projections from team volume, usage shares and regressed efficiency.
//!
//! [`derive_field`] is the one formula table in the crate; baseline
//! projection, override cascades and fill players all go through it.

use super::{
    models::{
        PlayerEfficiencyProfile, PlayerUsageProfile, ProjectionRecord, ShareAdjustments,
        TeamVolume, UsageShares,
    },
    regression::EfficiencyRegressor,
    stats::{StatField, StatLine},
    team::TeamTotals,
};
use crate::{
    cli::types::{ProjectionId, ScenarioId, TeamId},
    config::{EngineConfig, ShareAdjustmentMode},
    error::{ProjectionError, Result},
};
use std::collections::BTreeMap;


const SHARE_TOLERANCE: f64 = 1e-9;

/// Formula for a derived field from the values currently on `line`.
///
/// Returns `None` for inputs (games, shares, rates), which have no formula.
pub fn derive_field(
    field: StatField,
    line: &StatLine,
    volume: &TeamVolume,
    games_in_season: f64,
) -> Option<f64> {
    use StatField::*;
    let games_fraction = if games_in_season > 0.0 {
        line.games / games_in_season
    } else {
        0.0
    };
    let value = match field {
        PassAttempts => volume.pass_attempts * line.pass_share * games_fraction,
        RushAttempts => volume.rush_attempts * line.rush_share * games_fraction,
        Targets => volume.targets * line.target_share * games_fraction,
        Completions => line.pass_attempts * line.completion_pct,
        GrossPassYards => line.pass_attempts * line.yards_per_attempt,
        PassYards => line.gross_pass_yards - line.pass_attempts * volume.sack_yards_per_attempt(),
        PassTds => line.pass_attempts * line.pass_td_rate,
        Interceptions => line.pass_attempts * line.int_rate,
        GrossRushYards => line.rush_attempts * line.yards_per_carry,
        RushYards => line.gross_rush_yards * (1.0 - line.fumble_rate),
        RushTds => line.rush_attempts * line.rush_td_rate,
        FumblesLost => line.rush_attempts * line.fumble_rate,
        Receptions => line.targets * line.catch_rate,
        RecYards => line.receptions * line.yards_per_reception,
        RecTds => line.targets * line.rec_td_rate,
        FantasyPoints => line.fantasy_points_formula(),
        _ => return None,
    };
    Some(value)
}

/// Recompute one field in place, refusing to store a non-finite result.
pub fn recompute_field(
    field: StatField,
    line: &mut StatLine,
    volume: &TeamVolume,
    games_in_season: f64,
) -> Result<bool> {
    let Some(value) = derive_field(field, line, volume, games_in_season) else {
        return Ok(false);
    };
    if !value.is_finite() {
        return Err(ProjectionError::NonFinite {
            field: field.to_string(),
        });
    }
    line.set(field, value);
    Ok(true)
}

/// Recompute every derived field in rank order, leaving frozen fields untouched.
pub fn recompute_all(
    line: &mut StatLine,
    volume: &TeamVolume,
    games_in_season: f64,
    frozen: &BTreeMap<StatField, f64>,
) -> Result<()> {
    for field in StatField::ALL {
        if field.is_derived() && !frozen.contains_key(&field) {
            recompute_field(field, line, volume, games_in_season)?;
        }
    }
    Ok(())
}

/// Apply share adjustments as absolute replacements or multiplicative factors.
pub fn apply_adjustments(
    shares: UsageShares,
    adjustments: Option<&ShareAdjustments>,
    mode: ShareAdjustmentMode,
) -> UsageShares {
    let Some(adj) = adjustments else {
        return shares;
    };
    let apply = |base: f64, adjustment: Option<f64>| match (adjustment, mode) {
        (None, _) => base,
        (Some(value), ShareAdjustmentMode::Absolute) => value.clamp(0.0, 1.0),
        (Some(factor), ShareAdjustmentMode::Multiplicative) => (base * factor).clamp(0.0, 1.0),
    };
    UsageShares {
        pass: apply(shares.pass, adj.pass),
        rush: apply(shares.rush, adj.rush),
        target: apply(shares.target, adj.target),
    }
}

pub struct ProjectionCalculator<'a> {
    config: &'a EngineConfig,
}

impl<'a> ProjectionCalculator<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    pub fn effective_shares(&self, usage: &PlayerUsageProfile) -> UsageShares {
        apply_adjustments(
            usage.shares,
            usage.adjustments.as_ref(),
            self.config.shares.adjustment_mode,
        )
    }

    /// Each share in [0, 1], and per category the team's shares plus the fill
    /// reserve must not exceed the whole volume.
    pub fn validate_shares(&self, team: &TeamId, usages: &[PlayerUsageProfile]) -> Result<()> {
        let reserve = self.config.shares.fill_reserve;
        let mut totals = [("pass", 0.0), ("rush", 0.0), ("target", 0.0)];

        for usage in usages {
            let shares = self.effective_shares(usage);
            for (slot, value) in totals.iter_mut().zip([shares.pass, shares.rush, shares.target]) {
                if !(0.0..=1.0).contains(&value) {
                    return Err(ProjectionError::InvalidShareAllocation {
                        team: team.to_string(),
                        category: format!("{} share of {}", slot.0, usage.name),
                        total: value,
                    });
                }
                slot.1 += value;
            }
        }

        for (category, total) in totals {
            if total + reserve > 1.0 + SHARE_TOLERANCE {
                return Err(ProjectionError::InvalidShareAllocation {
                    team: team.to_string(),
                    category: category.to_string(),
                    total: total + reserve,
                });
            }
        }
        Ok(())
    }

    /// Regressed player rate, or the team-implied rate when the player has no history.
    pub fn resolve_rate(
        &self,
        metric: StatField,
        usage: &PlayerUsageProfile,
        efficiency: Option<&PlayerEfficiencyProfile>,
        totals: &TeamTotals,
    ) -> f64 {
        match efficiency.and_then(|e| e.metrics.get(&metric)) {
            Some(baseline) => {
                EfficiencyRegressor::new(&self.config.regression)
                    .regress_metric(usage.position, metric, baseline)
                    .regressed
            }
            None => totals.implied_rate(metric),
        }
    }

    /// Build the complete statistical line for one player.
    pub fn project_line(
        &self,
        totals: &TeamTotals,
        usage: &PlayerUsageProfile,
        efficiency: Option<&PlayerEfficiencyProfile>,
    ) -> Result<StatLine> {
        let shares = self.effective_shares(usage);
        let mut line = StatLine {
            games: usage.games.clamp(0.0, self.config.games_in_season),
            pass_share: shares.pass,
            rush_share: shares.rush,
            target_share: shares.target,
            ..Default::default()
        };
        for metric in StatField::RATES {
            line.set(metric, self.resolve_rate(metric, usage, efficiency, totals));
        }
        recompute_all(
            &mut line,
            &totals.volume(),
            self.config.games_in_season,
            &BTreeMap::new(),
        )?;
        Ok(line)
    }

    pub fn project(
        &self,
        id: ProjectionId,
        scenario_id: ScenarioId,
        totals: &TeamTotals,
        usage: &PlayerUsageProfile,
        efficiency: Option<&PlayerEfficiencyProfile>,
    ) -> Result<ProjectionRecord> {
        let stats = self.project_line(totals, usage, efficiency)?;
        Ok(ProjectionRecord {
            id,
            scenario_id,
            player_id: Some(usage.player_id),
            name: usage.name.clone(),
            team: usage.team.clone(),
            position: usage.position,
            season: usage.season,
            volume: totals.volume(),
            games_in_season: self.config.games_in_season,
            stats,
            frozen: BTreeMap::new(),
            has_overrides: false,
            is_fill_player: false,
        })
    }
}
