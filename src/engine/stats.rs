//! Statistic fields and the stored statistical line of a projection.
//!
//! Every value an analyst can see or override is a [`StatField`]. The enum is
//! declared in topological order: inputs (games, shares, rates) first, then
//! volumes, then the stats derived from them, and `FantasyPoints` last. The
//! dependency table in [`super::dependency`] relies on that ordering.

use crate::error::{ProjectionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;


/// Points per unit for half-PPR scoring.
pub const PASS_YARD_POINTS: f64 = 0.04;
pub const PASS_TD_POINTS: f64 = 4.0;
pub const INTERCEPTION_POINTS: f64 = -2.0;
pub const RUSH_YARD_POINTS: f64 = 0.1;
pub const RUSH_TD_POINTS: f64 = 6.0;
pub const FUMBLE_LOST_POINTS: f64 = -2.0;
pub const RECEPTION_POINTS: f64 = 0.5;
pub const REC_YARD_POINTS: f64 = 0.1;
pub const REC_TD_POINTS: f64 = 6.0;

/// A single published statistic on a [`super::models::ProjectionRecord`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    Games,
    PassShare,
    RushShare,
    TargetShare,
    CompletionPct,
    YardsPerAttempt,
    PassTdRate,
    IntRate,
    YardsPerCarry,
    RushTdRate,
    FumbleRate,
    CatchRate,
    YardsPerReception,
    RecTdRate,
    PassAttempts,
    RushAttempts,
    Targets,
    Completions,
    GrossPassYards,
    PassYards,
    PassTds,
    Interceptions,
    GrossRushYards,
    RushYards,
    RushTds,
    FumblesLost,
    Receptions,
    RecYards,
    RecTds,
    FantasyPoints,
}

/// How a field participates in a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    /// Games played; scales every volume stat.
    Games,
    /// Fraction of a team-level opportunity, in [0, 1].
    Share,
    /// Per-opportunity efficiency rate.
    Rate,
    /// Counting stat (attempts, yards, touchdowns...).
    Count,
    /// Derived fantasy total.
    Points,
}

/// Team-level opportunity family a counting stat belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeKind {
    Passing,
    Rushing,
    Receiving,
}

impl StatField {
    /// All fields in topological order.
    pub const ALL: [StatField; 30] = [
        StatField::Games,
        StatField::PassShare,
        StatField::RushShare,
        StatField::TargetShare,
        StatField::CompletionPct,
        StatField::YardsPerAttempt,
        StatField::PassTdRate,
        StatField::IntRate,
        StatField::YardsPerCarry,
        StatField::RushTdRate,
        StatField::FumbleRate,
        StatField::CatchRate,
        StatField::YardsPerReception,
        StatField::RecTdRate,
        StatField::PassAttempts,
        StatField::RushAttempts,
        StatField::Targets,
        StatField::Completions,
        StatField::GrossPassYards,
        StatField::PassYards,
        StatField::PassTds,
        StatField::Interceptions,
        StatField::GrossRushYards,
        StatField::RushYards,
        StatField::RushTds,
        StatField::FumblesLost,
        StatField::Receptions,
        StatField::RecYards,
        StatField::RecTds,
        StatField::FantasyPoints,
    ];

    /// Counting stats, in topological order.
    pub const COUNTS: [StatField; 15] = [
        StatField::PassAttempts,
        StatField::RushAttempts,
        StatField::Targets,
        StatField::Completions,
        StatField::GrossPassYards,
        StatField::PassYards,
        StatField::PassTds,
        StatField::Interceptions,
        StatField::GrossRushYards,
        StatField::RushYards,
        StatField::RushTds,
        StatField::FumblesLost,
        StatField::Receptions,
        StatField::RecYards,
        StatField::RecTds,
    ];

    /// Efficiency metrics that go through regression.
    pub const RATES: [StatField; 10] = [
        StatField::CompletionPct,
        StatField::YardsPerAttempt,
        StatField::PassTdRate,
        StatField::IntRate,
        StatField::YardsPerCarry,
        StatField::RushTdRate,
        StatField::FumbleRate,
        StatField::CatchRate,
        StatField::YardsPerReception,
        StatField::RecTdRate,
    ];

    /// Position of this field in the topological order.
    pub fn rank(&self) -> usize {
        *self as usize
    }

    pub fn kind(&self) -> StatKind {
        use StatField::*;
        match self {
            Games => StatKind::Games,
            PassShare | RushShare | TargetShare => StatKind::Share,
            CompletionPct | YardsPerAttempt | PassTdRate | IntRate | YardsPerCarry
            | RushTdRate | FumbleRate | CatchRate | YardsPerReception | RecTdRate => {
                StatKind::Rate
            }
            FantasyPoints => StatKind::Points,
            _ => StatKind::Count,
        }
    }

    /// Whether the engine derives this field from other fields.
    pub fn is_derived(&self) -> bool {
        matches!(self.kind(), StatKind::Count | StatKind::Points)
    }

    /// Rates that are probabilities and must stay within [0, 1].
    pub fn is_fraction(&self) -> bool {
        use StatField::*;
        matches!(
            self,
            PassShare
                | RushShare
                | TargetShare
                | CompletionPct
                | PassTdRate
                | IntRate
                | RushTdRate
                | FumbleRate
                | CatchRate
                | RecTdRate
        )
    }

    /// The opportunity family a field belongs to, if any.
    pub fn volume_kind(&self) -> Option<VolumeKind> {
        use StatField::*;
        match self {
            PassShare | CompletionPct | YardsPerAttempt | PassTdRate | IntRate
            | PassAttempts | Completions | GrossPassYards | PassYards | PassTds
            | Interceptions => {
                Some(VolumeKind::Passing)
            }
            RushShare | YardsPerCarry | RushTdRate | FumbleRate | RushAttempts
            | GrossRushYards | RushYards | RushTds | FumblesLost => Some(VolumeKind::Rushing),
            TargetShare | CatchRate | YardsPerReception | RecTdRate | Targets | Receptions
            | RecYards | RecTds => Some(VolumeKind::Receiving),
            Games | FantasyPoints => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        use StatField::*;
        match self {
            Games => "games",
            PassShare => "pass_share",
            RushShare => "rush_share",
            TargetShare => "target_share",
            CompletionPct => "completion_pct",
            YardsPerAttempt => "yards_per_attempt",
            PassTdRate => "pass_td_rate",
            IntRate => "int_rate",
            YardsPerCarry => "yards_per_carry",
            RushTdRate => "rush_td_rate",
            FumbleRate => "fumble_rate",
            CatchRate => "catch_rate",
            YardsPerReception => "yards_per_reception",
            RecTdRate => "rec_td_rate",
            PassAttempts => "pass_attempts",
            RushAttempts => "rush_attempts",
            Targets => "targets",
            Completions => "completions",
            GrossPassYards => "gross_pass_yards",
            PassYards => "pass_yards",
            PassTds => "pass_tds",
            Interceptions => "interceptions",
            GrossRushYards => "gross_rush_yards",
            RushYards => "rush_yards",
            RushTds => "rush_tds",
            FumblesLost => "fumbles_lost",
            Receptions => "receptions",
            RecYards => "rec_yards",
            RecTds => "rec_tds",
            FantasyPoints => "fantasy_points",
        }
    }
}

impl fmt::Display for StatField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StatField {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        if let Some(field) = StatField::ALL
            .iter()
            .find(|field| field.as_str() == normalized)
        {
            return Ok(*field);
        }
        // Common short names used by analysts
        let field = match normalized.as_str() {
            "att_pct" | "pass_att_pct" => StatField::PassShare,
            "car_pct" | "carry_share" => StatField::RushShare,
            "tar_pct" => StatField::TargetShare,
            "comp_pct" | "completion_rate" => StatField::CompletionPct,
            "ypa" => StatField::YardsPerAttempt,
            "ypc" => StatField::YardsPerCarry,
            "ypr" => StatField::YardsPerReception,
            "pass_att" => StatField::PassAttempts,
            "rush_att" | "carries" => StatField::RushAttempts,
            "ints" => StatField::Interceptions,
            "fp" | "points" => StatField::FantasyPoints,
            _ => {
                return Err(ProjectionError::UnknownStatField {
                    field: s.to_string(),
                })
            }
        };
        Ok(field)
    }
}

/// The full statistical line stored on a projection record.
///
/// `yards_per_attempt` and `yards_per_carry` are gross rates, so
/// `gross_pass_yards` and `gross_rush_yards` follow from them directly.
/// `pass_yards` and `rush_yards` are net of the player's part of team sack
/// yardage and of lost fumbles; they are what fantasy scoring consumes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatLine {
    pub games: f64,
    pub pass_share: f64,
    pub rush_share: f64,
    pub target_share: f64,
    pub completion_pct: f64,
    pub yards_per_attempt: f64,
    pub pass_td_rate: f64,
    pub int_rate: f64,
    pub yards_per_carry: f64,
    pub rush_td_rate: f64,
    pub fumble_rate: f64,
    pub catch_rate: f64,
    pub yards_per_reception: f64,
    pub rec_td_rate: f64,
    pub pass_attempts: f64,
    pub rush_attempts: f64,
    pub targets: f64,
    pub completions: f64,
    pub gross_pass_yards: f64,
    pub pass_yards: f64,
    pub pass_tds: f64,
    pub interceptions: f64,
    pub gross_rush_yards: f64,
    pub rush_yards: f64,
    pub rush_tds: f64,
    pub fumbles_lost: f64,
    pub receptions: f64,
    pub rec_yards: f64,
    pub rec_tds: f64,
    pub fantasy_points: f64,
}

impl StatLine {
    pub fn get(&self, field: StatField) -> f64 {
        use StatField::*;
        match field {
            Games => self.games,
            PassShare => self.pass_share,
            RushShare => self.rush_share,
            TargetShare => self.target_share,
            CompletionPct => self.completion_pct,
            YardsPerAttempt => self.yards_per_attempt,
            PassTdRate => self.pass_td_rate,
            IntRate => self.int_rate,
            YardsPerCarry => self.yards_per_carry,
            RushTdRate => self.rush_td_rate,
            FumbleRate => self.fumble_rate,
            CatchRate => self.catch_rate,
            YardsPerReception => self.yards_per_reception,
            RecTdRate => self.rec_td_rate,
            PassAttempts => self.pass_attempts,
            RushAttempts => self.rush_attempts,
            Targets => self.targets,
            Completions => self.completions,
            GrossPassYards => self.gross_pass_yards,
            PassYards => self.pass_yards,
            PassTds => self.pass_tds,
            Interceptions => self.interceptions,
            GrossRushYards => self.gross_rush_yards,
            RushYards => self.rush_yards,
            RushTds => self.rush_tds,
            FumblesLost => self.fumbles_lost,
            Receptions => self.receptions,
            RecYards => self.rec_yards,
            RecTds => self.rec_tds,
            FantasyPoints => self.fantasy_points,
        }
    }

    pub fn set(&mut self, field: StatField, value: f64) {
        use StatField::*;
        let slot = match field {
            Games => &mut self.games,
            PassShare => &mut self.pass_share,
            RushShare => &mut self.rush_share,
            TargetShare => &mut self.target_share,
            CompletionPct => &mut self.completion_pct,
            YardsPerAttempt => &mut self.yards_per_attempt,
            PassTdRate => &mut self.pass_td_rate,
            IntRate => &mut self.int_rate,
            YardsPerCarry => &mut self.yards_per_carry,
            RushTdRate => &mut self.rush_td_rate,
            FumbleRate => &mut self.fumble_rate,
            CatchRate => &mut self.catch_rate,
            YardsPerReception => &mut self.yards_per_reception,
            RecTdRate => &mut self.rec_td_rate,
            PassAttempts => &mut self.pass_attempts,
            RushAttempts => &mut self.rush_attempts,
            Targets => &mut self.targets,
            Completions => &mut self.completions,
            GrossPassYards => &mut self.gross_pass_yards,
            PassYards => &mut self.pass_yards,
            PassTds => &mut self.pass_tds,
            Interceptions => &mut self.interceptions,
            GrossRushYards => &mut self.gross_rush_yards,
            RushYards => &mut self.rush_yards,
            RushTds => &mut self.rush_tds,
            FumblesLost => &mut self.fumbles_lost,
            Receptions => &mut self.receptions,
            RecYards => &mut self.rec_yards,
            RecTds => &mut self.rec_tds,
            FantasyPoints => &mut self.fantasy_points,
        };
        *slot = value;
    }

    /// Half-PPR fantasy points from the stored counting stats.
    pub fn fantasy_points_formula(&self) -> f64 {
        PASS_YARD_POINTS * self.pass_yards
            + PASS_TD_POINTS * self.pass_tds
            + INTERCEPTION_POINTS * self.interceptions
            + RUSH_YARD_POINTS * self.rush_yards
            + RUSH_TD_POINTS * self.rush_tds
            + FUMBLE_LOST_POINTS * self.fumbles_lost
            + RECEPTION_POINTS * self.receptions
            + REC_YARD_POINTS * self.rec_yards
            + REC_TD_POINTS * self.rec_tds
    }
}

/// Ratio with a documented fallback for a zero (or non-finite) denominator.
pub fn safe_div(numerator: f64, denominator: f64, default: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        default
    } else {
        numerator / denominator
    }
}
