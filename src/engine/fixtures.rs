//! Shared fixtures for engine unit tests.

use super::{
    models::{
        HistoricalVariance, MetricBaseline, PlayerEfficiencyProfile, PlayerUsageProfile,
        TeamSeasonProfile, UsageShares,
    },
    stats::StatField,
    MemoryProfiles,
};
use crate::cli::types::{PlayerId, Position, Season, TeamId};
use std::collections::BTreeMap;

pub const SEASON: Season = Season(2025);

pub fn team_profile(team: &str) -> TeamSeasonProfile {
    TeamSeasonProfile {
        team: TeamId::new(team),
        season: SEASON,
        games: 17.0,
        plays_per_game: 64.0,
        pass_rate: 0.58,
        sack_rate: 0.04,
        yards_per_sack: 7.0,
        yards_per_attempt: 7.2,
        completion_pct: 0.66,
        int_rate: 0.022,
        pass_td_rate: 0.048,
        target_rate: 0.92,
        yards_per_carry: 4.4,
        rush_td_rate: 0.035,
        fumble_rate: 0.01,
        closed: false,
    }
}

pub fn usage(
    id: u64,
    name: &str,
    team: &str,
    position: Position,
    shares: (f64, f64, f64),
) -> PlayerUsageProfile {
    PlayerUsageProfile {
        player_id: PlayerId::new(id),
        name: name.to_string(),
        team: TeamId::new(team),
        season: SEASON,
        position,
        games: 17.0,
        shares: UsageShares {
            pass: shares.0,
            rush: shares.1,
            target: shares.2,
        },
        adjustments: None,
    }
}

pub fn roster(team: &str) -> Vec<PlayerUsageProfile> {
    vec![
        usage(1, "Starting QB", team, Position::QB, (0.95, 0.10, 0.0)),
        usage(2, "Lead RB", team, Position::RB, (0.0, 0.55, 0.12)),
        usage(3, "Change RB", team, Position::RB, (0.0, 0.20, 0.05)),
        usage(4, "WR One", team, Position::WR, (0.0, 0.02, 0.26)),
        usage(5, "WR Two", team, Position::WR, (0.0, 0.0, 0.18)),
        usage(6, "Starting TE", team, Position::TE, (0.0, 0.0, 0.17)),
    ]
}

pub fn qb_efficiency() -> PlayerEfficiencyProfile {
    let mut metrics = BTreeMap::new();
    metrics.insert(
        StatField::CompletionPct,
        MetricBaseline {
            raw: 0.69,
            mean: 0.64,
            stddev: 0.03,
            years: 4,
        },
    );
    metrics.insert(
        StatField::YardsPerAttempt,
        MetricBaseline {
            raw: 7.8,
            mean: 7.0,
            stddev: 0.6,
            years: 4,
        },
    );
    PlayerEfficiencyProfile {
        player_id: PlayerId::new(1),
        season: SEASON,
        position: Position::QB,
        metrics,
    }
}

pub fn rb_efficiency() -> PlayerEfficiencyProfile {
    let mut metrics = BTreeMap::new();
    metrics.insert(
        StatField::YardsPerCarry,
        MetricBaseline {
            raw: 5.2,
            mean: 4.3,
            stddev: 0.5,
            years: 3,
        },
    );
    PlayerEfficiencyProfile {
        player_id: PlayerId::new(2),
        season: SEASON,
        position: Position::RB,
        metrics,
    }
}

pub fn wr_variance() -> HistoricalVariance {
    let mut coefficients = BTreeMap::new();
    coefficients.insert(StatField::RecYards, 0.55);
    coefficients.insert(StatField::FantasyPoints, 0.50);
    HistoricalVariance {
        player_id: PlayerId::new(4),
        season: SEASON,
        seasons: 5,
        coefficients,
    }
}

/// One team (KC) with a full roster and some history.
pub fn profiles() -> MemoryProfiles {
    let mut profiles = MemoryProfiles::default();
    profiles.insert_team(team_profile("KC"));
    for u in roster("KC") {
        profiles.insert_usage(u);
    }
    profiles.insert_efficiency(qb_efficiency());
    profiles.insert_efficiency(rb_efficiency());
    profiles.insert_variance(wr_variance());
    profiles
}
