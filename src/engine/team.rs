//! Team allocation: per-game tendencies to full-season team totals.

use super::{
    models::{TeamSeasonProfile, TeamVolume},
    stats::{safe_div, StatField},
};
use crate::error::{ProjectionError, Result};
use serde::{Deserialize, Serialize};


/// Full-season team totals per stat category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamTotals {
    pub plays: f64,
    pub pass_attempts: f64,
    pub completions: f64,
    pub sacks: f64,
    pub sack_yards: f64,
    pub gross_pass_yards: f64,
    pub net_pass_yards: f64,
    pub pass_tds: f64,
    pub interceptions: f64,
    pub rush_attempts: f64,
    pub gross_rush_yards: f64,
    pub net_rush_yards: f64,
    pub rush_tds: f64,
    pub fumbles_lost: f64,
    pub targets: f64,
    pub receptions: f64,
    pub rec_yards: f64,
    pub rec_tds: f64,
}

impl TeamTotals {
    /// Team total matching a player counting stat.
    ///
    /// `PassYards` and `RushYards` reconcile against net yardage, their gross
    /// counterparts against gross yardage, and receiving yards against gross
    /// passing yards.
    pub fn for_field(&self, field: StatField) -> Option<f64> {
        use StatField::*;
        let value = match field {
            PassAttempts => self.pass_attempts,
            Completions => self.completions,
            GrossPassYards => self.gross_pass_yards,
            PassYards => self.net_pass_yards,
            PassTds => self.pass_tds,
            Interceptions => self.interceptions,
            RushAttempts => self.rush_attempts,
            GrossRushYards => self.gross_rush_yards,
            RushYards => self.net_rush_yards,
            RushTds => self.rush_tds,
            FumblesLost => self.fumbles_lost,
            Targets => self.targets,
            Receptions => self.receptions,
            RecYards => self.rec_yards,
            RecTds => self.rec_tds,
            _ => return None,
        };
        Some(value)
    }

    pub fn volume(&self) -> TeamVolume {
        TeamVolume {
            pass_attempts: self.pass_attempts,
            rush_attempts: self.rush_attempts,
            targets: self.targets,
            sack_yards: self.sack_yards,
        }
    }

    /// Team-implied efficiency rate, used when a player has no history for a metric.
    ///
    /// Yardage rates are gross, like the historical metrics they stand in for.
    pub fn implied_rate(&self, metric: StatField) -> f64 {
        use StatField::*;
        match metric {
            CompletionPct => safe_div(self.completions, self.pass_attempts, 0.0),
            YardsPerAttempt => safe_div(self.gross_pass_yards, self.pass_attempts, 0.0),
            PassTdRate => safe_div(self.pass_tds, self.pass_attempts, 0.0),
            IntRate => safe_div(self.interceptions, self.pass_attempts, 0.0),
            YardsPerCarry => safe_div(self.gross_rush_yards, self.rush_attempts, 0.0),
            RushTdRate => safe_div(self.rush_tds, self.rush_attempts, 0.0),
            FumbleRate => safe_div(self.fumbles_lost, self.rush_attempts, 0.0),
            CatchRate => safe_div(self.receptions, self.targets, 0.0),
            YardsPerReception => safe_div(self.rec_yards, self.receptions, 0.0),
            RecTdRate => safe_div(self.rec_tds, self.targets, 0.0),
            _ => 0.0,
        }
    }
}

fn check_fraction(profile: &TeamSeasonProfile, name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ProjectionError::invalid_team(
            profile.team.as_str(),
            format!("{name} {value} outside [0, 1]"),
        ));
    }
    Ok(())
}

fn check_non_negative(profile: &TeamSeasonProfile, name: &str, value: f64) -> Result<()> {
    if !(value >= 0.0) || !value.is_finite() {
        return Err(ProjectionError::invalid_team(
            profile.team.as_str(),
            format!("{name} must be a non-negative number, got {value}"),
        ));
    }
    Ok(())
}

/// Reject malformed profiles before anything is projected from them.
pub fn validate_profile(profile: &TeamSeasonProfile) -> Result<()> {
    check_non_negative(profile, "sack_rate", profile.sack_rate)?;
    check_fraction(profile, "fumble_rate", profile.fumble_rate)?;
    check_fraction(profile, "pass_rate", profile.pass_rate)?;
    check_fraction(profile, "completion_pct", profile.completion_pct)?;
    check_fraction(profile, "int_rate", profile.int_rate)?;
    check_fraction(profile, "pass_td_rate", profile.pass_td_rate)?;
    check_fraction(profile, "rush_td_rate", profile.rush_td_rate)?;
    check_fraction(profile, "target_rate", profile.target_rate)?;
    check_non_negative(profile, "games", profile.games)?;
    check_non_negative(profile, "yards_per_sack", profile.yards_per_sack)?;
    for (name, value) in [
        ("plays_per_game", profile.plays_per_game),
        ("yards_per_attempt", profile.yards_per_attempt),
        ("yards_per_carry", profile.yards_per_carry),
    ] {
        if !value.is_finite() {
            return Err(ProjectionError::invalid_team(
                profile.team.as_str(),
                format!("{name} is not a finite number"),
            ));
        }
    }
    if profile.pass_rate + profile.sack_rate > 1.0 {
        return Err(ProjectionError::invalid_team(
            profile.team.as_str(),
            "pass attempts plus sacks exceed total plays",
        ));
    }
    Ok(())
}

/// Resolve a season profile into full-season team totals.
///
/// Zero (or negative) plays is a bye/no-data state and yields all-zero totals.
pub fn resolve_team_totals(profile: &TeamSeasonProfile) -> Result<TeamTotals> {
    validate_profile(profile)?;

    let plays = profile.plays_per_game * profile.games;
    if plays <= 0.0 {
        return Ok(TeamTotals::default());
    }

    let pass_attempts = plays * profile.pass_rate;
    let sacks = plays * profile.sack_rate;
    let rush_attempts = plays - pass_attempts - sacks;

    let gross_pass_yards = pass_attempts * profile.yards_per_attempt;
    let sack_yards = sacks * profile.yards_per_sack;
    let net_pass_yards = gross_pass_yards - sack_yards;

    let gross_rush_yards = rush_attempts * profile.yards_per_carry;
    let net_rush_yards = gross_rush_yards * (1.0 - profile.fumble_rate);

    let completions = pass_attempts * profile.completion_pct;
    let pass_tds = pass_attempts * profile.pass_td_rate;

    Ok(TeamTotals {
        plays,
        pass_attempts,
        completions,
        sacks,
        sack_yards,
        gross_pass_yards,
        net_pass_yards,
        pass_tds,
        interceptions: pass_attempts * profile.int_rate,
        rush_attempts,
        gross_rush_yards,
        net_rush_yards,
        rush_tds: rush_attempts * profile.rush_td_rate,
        fumbles_lost: rush_attempts * profile.fumble_rate,
        targets: pass_attempts * profile.target_rate,
        receptions: completions,
        rec_yards: gross_pass_yards,
        rec_tds: pass_tds,
    })
}
