//! Integration tests for the projection engine's consistency properties

use gridiron_proj::{
    config::EngineConfig,
    engine::{
        models::{
            MetricBaseline, PlayerEfficiencyProfile, PlayerUsageProfile, TeamSeasonProfile,
            UsageShares,
        },
        regression::regress,
        stats::StatField,
        variance::ConfidenceLevel,
    },
    MemoryProfiles, PlayerId, Position, ProjectionEngine, ProjectionError, Season, TeamId,
};
use std::collections::BTreeMap;

const SEASON: Season = Season(2025);
const EPSILON: f64 = 1e-6;

fn team(abbr: &str, plays_per_game: f64, pass_rate: f64) -> TeamSeasonProfile {
    TeamSeasonProfile {
        team: TeamId::new(abbr),
        season: SEASON,
        games: 17.0,
        plays_per_game,
        pass_rate,
        sack_rate: 0.04,
        yards_per_sack: 7.0,
        yards_per_attempt: 7.0,
        completion_pct: 0.65,
        int_rate: 0.02,
        pass_td_rate: 0.045,
        target_rate: 0.9,
        yards_per_carry: 4.3,
        rush_td_rate: 0.03,
        fumble_rate: 0.01,
        closed: false,
    }
}

fn player(
    id: u64,
    team: &str,
    position: Position,
    pass: f64,
    rush: f64,
    target: f64,
) -> PlayerUsageProfile {
    PlayerUsageProfile {
        player_id: PlayerId::new(id),
        name: format!("{team} {position} {id}"),
        team: TeamId::new(team),
        season: SEASON,
        position,
        games: 17.0,
        shares: UsageShares { pass, rush, target },
        adjustments: None,
    }
}

fn league() -> MemoryProfiles {
    let mut profiles = MemoryProfiles::new();
    for (abbr, plays, pass_rate, base) in [("BUF", 65.0, 0.57, 100), ("DET", 62.0, 0.52, 200)] {
        profiles.insert_team(team(abbr, plays, pass_rate));
        profiles.insert_usage(player(base + 1, abbr, Position::QB, 0.97, 0.09, 0.0));
        profiles.insert_usage(player(base + 2, abbr, Position::RB, 0.0, 0.50, 0.10));
        profiles.insert_usage(player(base + 3, abbr, Position::RB, 0.0, 0.25, 0.06));
        profiles.insert_usage(player(base + 4, abbr, Position::WR, 0.0, 0.03, 0.24));
        profiles.insert_usage(player(base + 5, abbr, Position::WR, 0.0, 0.0, 0.20));
        profiles.insert_usage(player(base + 6, abbr, Position::TE, 0.0, 0.0, 0.15));
    }

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
    profiles.insert_efficiency(PlayerEfficiencyProfile {
        player_id: PlayerId::new(202),
        season: SEASON,
        position: Position::RB,
        metrics,
    });
    profiles
}

fn engine() -> ProjectionEngine<MemoryProfiles> {
    ProjectionEngine::new(league(), EngineConfig::default())
}

#[test]
fn test_fantasy_points_follow_formula_without_overrides() {
    let engine = engine();
    for abbr in ["BUF", "DET"] {
        let records = engine.compute_baseline(&TeamId::new(abbr), SEASON).unwrap();
        for record in records.iter().filter(|r| !r.has_overrides) {
            assert!(
                (record.fantasy_points() - record.stats.fantasy_points_formula()).abs() < EPSILON,
                "{} drifted from the scoring formula",
                record.name
            );
        }
    }
}

#[test]
fn test_every_team_sums_to_team_totals() {
    let engine = engine();
    for abbr in ["BUF", "DET"] {
        let team = TeamId::new(abbr);
        engine.compute_baseline(&team, SEASON).unwrap();
        let report = engine.verify_team(&team, SEASON, None).unwrap();
        assert!(report.is_consistent(EPSILON), "{abbr}: {:?}", report.checks);
        assert!(report.fill_players > 0);
    }
}

#[test]
fn test_regressed_efficiency_flows_into_projection() {
    let regression = regress(5.2, 4.3, 0.5);
    assert!((regression.z_score - 1.8).abs() < 1e-9);
    assert!((regression.factor - 0.35).abs() < 1e-9);

    let engine = engine();
    let records = engine.compute_baseline(&TeamId::new("DET"), SEASON).unwrap();
    let rb = records
        .iter()
        .find(|r| r.player_id == Some(PlayerId::new(202)))
        .unwrap();
    assert!((rb.stats.yards_per_carry - regression.regressed).abs() < 1e-9);
}

#[test]
fn test_pass_attempt_override_cascade() {
    let engine = engine();
    let team = TeamId::new("BUF");
    let records = engine.compute_baseline(&team, SEASON).unwrap();
    let qb = records
        .iter()
        .find(|r| r.player_id == Some(PlayerId::new(101)))
        .unwrap();

    let updated = engine
        .apply_override(qb.id, "pass_attempts", 500.0, None)
        .unwrap();
    assert!((updated.stats.completions - 500.0 * qb.stats.completion_pct).abs() < 1e-9);
    assert_eq!(updated.stats.rush_attempts, qb.stats.rush_attempts);
    assert_eq!(updated.stats.rush_yards, qb.stats.rush_yards);
    assert!((updated.fantasy_points() - updated.stats.fantasy_points_formula()).abs() < EPSILON);

    // The QB fill absorbs the freed attempts
    let report = engine.verify_team(&team, SEASON, None).unwrap();
    assert!(report.is_consistent(EPSILON));
}

#[test]
fn test_branch_isolation() {
    let engine = engine();
    let team = TeamId::new("DET");
    engine.compute_baseline(&team, SEASON).unwrap();
    let baseline = engine.baseline_id(SEASON).unwrap();
    let before = engine.scenario_records(baseline).unwrap();

    let branch = engine.clone_scenario(baseline, "Lead back injured").unwrap();
    let rb = engine
        .scenario_records(branch.id)
        .unwrap()
        .into_iter()
        .find(|r| r.player_id == Some(PlayerId::new(202)))
        .unwrap();
    engine.apply_override(rb.id, "rush_share", 0.0, None).unwrap();

    assert_eq!(engine.scenario_records(baseline).unwrap(), before);
    let report = engine.verify_team(&team, SEASON, Some(branch.id)).unwrap();
    assert!(report.is_consistent(EPSILON));
}

#[test]
fn test_wider_confidence_means_wider_bounds() {
    let engine = engine();
    let records = engine.compute_baseline(&TeamId::new("BUF"), SEASON).unwrap();
    let wr = records
        .iter()
        .find(|r| r.player_id == Some(PlayerId::new(104)))
        .unwrap();

    let mut previous = 0.0;
    for level in ConfidenceLevel::ALL {
        let estimate = engine.get_variance_estimate(wr.id, level.as_f64()).unwrap();
        let width = estimate.get(StatField::FantasyPoints).unwrap().width();
        assert!(width >= previous);
        previous = width;
    }

    assert!(matches!(
        engine.get_variance_estimate(wr.id, 0.99),
        Err(ProjectionError::InvalidConfidenceLevel { .. })
    ));
}

#[test]
fn test_repeated_reconciliation_does_not_drift() {
    let engine = engine();
    let team = TeamId::new("BUF");
    engine.compute_baseline(&team, SEASON).unwrap();

    for position in Position::ALL {
        let first = engine
            .reconcile_fill_players(&team, position, SEASON, None)
            .unwrap();
        let second = engine
            .reconcile_fill_players(&team, position, SEASON, None)
            .unwrap();
        assert_eq!(first, second, "{position} fill drifted");
    }
}

#[test]
fn test_over_allocated_shares_rejected() {
    let mut profiles = league();
    profiles.insert_usage(player(107, "BUF", Position::WR, 0.0, 0.0, 0.40));
    let engine = ProjectionEngine::new(profiles, EngineConfig::default());

    assert!(matches!(
        engine.compute_baseline(&TeamId::new("BUF"), SEASON),
        Err(ProjectionError::InvalidShareAllocation { .. })
    ));
}
