//! Unit tests for the override engine

use super::*;
use crate::cli::types::{PlayerId, Position, ProjectionId, ScenarioId, Season, TeamId};
use crate::engine::{
    models::TeamVolume,
    stats::{StatLine, PASS_TD_POINTS, PASS_YARD_POINTS, INTERCEPTION_POINTS},
};
use std::collections::BTreeMap;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// QB with 550 pass attempts at a 65% completion rate.
fn qb_record() -> ProjectionRecord {
    let mut stats = StatLine {
        games: 17.0,
        pass_share: 1.0,
        rush_share: 0.1,
        completion_pct: 0.65,
        yards_per_attempt: 7.0,
        pass_td_rate: 0.05,
        int_rate: 0.02,
        yards_per_carry: 4.0,
        rush_td_rate: 0.03,
        fumble_rate: 0.01,
        ..Default::default()
    };
    let volume = TeamVolume {
        pass_attempts: 550.0,
        rush_attempts: 400.0,
        targets: 500.0,
        sack_yards: 275.0,
    };
    recompute_all(&mut stats, &volume, 17.0, &BTreeMap::new()).unwrap();
    ProjectionRecord {
        id: ProjectionId::new(1),
        scenario_id: ScenarioId::new(1),
        player_id: Some(PlayerId::new(1)),
        name: "Starting QB".to_string(),
        team: TeamId::new("KC"),
        position: Position::QB,
        season: Season::new(2025),
        volume,
        games_in_season: 17.0,
        stats,
        frozen: BTreeMap::new(),
        has_overrides: false,
        is_fill_player: false,
    }
}

#[test]
fn test_pass_attempts_override_cascades() {
    let record = qb_record();
    assert!(close(record.stats.pass_attempts, 550.0));

    let outcome = apply_override(
        &record,
        StatField::PassAttempts,
        500.0,
        Some("Rookie WR room".to_string()),
        OverrideId::new(1),
        100,
    )
    .unwrap();
    let next = &outcome.record;

    assert!(close(next.stats.completions, 325.0));
    assert!(next.has_overrides);
    assert_eq!(next.frozen.get(&StatField::PassAttempts), Some(&550.0));

    let delta_gross = next.stats.gross_pass_yards - record.stats.gross_pass_yards;
    let delta_yards = next.stats.pass_yards - record.stats.pass_yards;
    let delta_tds = next.stats.pass_tds - record.stats.pass_tds;
    let delta_ints = next.stats.interceptions - record.stats.interceptions;
    assert!(close(delta_gross, -350.0));
    // 50 fewer attempts also carry 25 fewer sack yards
    assert!(close(delta_yards, -325.0));
    let expected_points = PASS_YARD_POINTS * delta_yards
        + PASS_TD_POINTS * delta_tds
        + INTERCEPTION_POINTS * delta_ints;
    assert!(close(
        next.stats.fantasy_points - record.stats.fantasy_points,
        expected_points
    ));
    assert!(close(expected_points, -21.0));

    // Unrelated fields untouched
    assert_eq!(next.stats.rush_yards, record.stats.rush_yards);
    assert_eq!(next.stats.rush_attempts, record.stats.rush_attempts);
    assert_eq!(next.stats.targets, record.stats.targets);

    assert_eq!(
        outcome.recomputed,
        vec![
            StatField::Completions,
            StatField::GrossPassYards,
            StatField::PassYards,
            StatField::PassTds,
            StatField::Interceptions,
            StatField::FantasyPoints,
        ]
    );
    assert!(outcome.skipped.is_empty());
}

#[test]
fn test_override_log_entry() {
    let record = qb_record();
    let outcome = apply_override(
        &record,
        StatField::CompletionPct,
        0.70,
        None,
        OverrideId::new(5),
        42,
    )
    .unwrap();

    let entry = &outcome.entry;
    assert_eq!(entry.id, OverrideId::new(5));
    assert_eq!(entry.projection_id, record.id);
    assert_eq!(entry.field, StatField::CompletionPct);
    assert_eq!(entry.calculated_value, 0.65);
    assert_eq!(entry.manual_value, 0.70);
    assert_eq!(entry.created_at, 42);
    assert!(!entry.cleared);
    assert!(close(outcome.record.stats.completions, 550.0 * 0.70));
}

#[test]
fn test_frozen_dependent_is_skipped() {
    let record = qb_record();
    let first = apply_override(
        &record,
        StatField::PassYards,
        4200.0,
        None,
        OverrideId::new(1),
        1,
    )
    .unwrap();
    let second = apply_override(
        &first.record,
        StatField::PassAttempts,
        600.0,
        None,
        OverrideId::new(2),
        2,
    )
    .unwrap();

    assert_eq!(second.record.stats.pass_yards, 4200.0);
    assert!(second.skipped.contains(&StatField::PassYards));
    assert!(close(second.record.stats.completions, 390.0));
    assert!(close(
        second.record.stats.fantasy_points,
        second.record.stats.fantasy_points_formula()
    ));
}

#[test]
fn test_overriding_points_freezes_them() {
    let record = qb_record();
    let pts = apply_override(
        &record,
        StatField::FantasyPoints,
        300.0,
        None,
        OverrideId::new(1),
        1,
    )
    .unwrap();
    assert!(pts.recomputed.is_empty());

    let after = apply_override(
        &pts.record,
        StatField::PassAttempts,
        450.0,
        None,
        OverrideId::new(2),
        2,
    )
    .unwrap();
    assert_eq!(after.record.stats.fantasy_points, 300.0);
    assert_eq!(after.skipped, vec![StatField::FantasyPoints]);
}

#[test]
fn test_re_override_keeps_original_calculated_value() {
    let record = qb_record();
    let first = apply_override(&record, StatField::PassShare, 0.8, None, OverrideId::new(1), 1)
        .unwrap();
    let second =
        apply_override(&first.record, StatField::PassShare, 0.9, None, OverrideId::new(2), 2)
            .unwrap();
    assert_eq!(second.entry.calculated_value, 1.0);
    assert_eq!(second.record.frozen.get(&StatField::PassShare), Some(&1.0));
    assert!(close(second.record.stats.pass_attempts, 495.0));
}

#[test]
fn test_invalid_values_rejected_without_mutation() {
    let record = qb_record();
    let before = record.clone();
    for (field, value) in [
        (StatField::CompletionPct, 1.2),
        (StatField::PassShare, -0.1),
        (StatField::Games, 20.0),
        (StatField::RushYards, -5.0),
        (StatField::PassAttempts, f64::NAN),
    ] {
        let result = apply_override(&record, field, value, None, OverrideId::new(1), 1);
        assert!(
            matches!(result, Err(ProjectionError::InvalidOverrideValue { .. })),
            "{field} = {value}"
        );
    }
    assert_eq!(record, before);
}

#[test]
fn test_non_finite_cascade_fails() {
    let mut record = qb_record();
    record.stats.yards_per_attempt = f64::INFINITY;
    let result = apply_override(
        &record,
        StatField::PassAttempts,
        500.0,
        None,
        OverrideId::new(1),
        1,
    );
    assert!(matches!(result, Err(ProjectionError::NonFinite { .. })));
}

#[test]
fn test_fill_player_cannot_be_overridden() {
    let mut record = qb_record();
    record.is_fill_player = true;
    assert!(matches!(
        apply_override(&record, StatField::PassAttempts, 1.0, None, OverrideId::new(1), 1),
        Err(ProjectionError::FillPlayerOverride { id: 1 })
    ));
}

#[test]
fn test_clear_override_restores_calculation() {
    let record = qb_record();
    let applied = apply_override(
        &record,
        StatField::PassAttempts,
        500.0,
        None,
        OverrideId::new(1),
        1,
    )
    .unwrap();
    let cleared = clear_override(&applied.record, StatField::PassAttempts, OverrideId::new(2), 2)
        .unwrap()
        .unwrap();

    assert!(cleared.entry.cleared);
    assert_eq!(cleared.entry.manual_value, 500.0);
    assert!(close(cleared.record.stats.pass_attempts, 550.0));
    assert!(close(cleared.record.stats.completions, record.stats.completions));
    assert!(close(
        cleared.record.stats.fantasy_points,
        record.stats.fantasy_points
    ));
    assert!(!cleared.record.has_overrides);
    assert!(cleared.record.frozen.is_empty());
}

#[test]
fn test_clear_input_override_uses_stored_calculation() {
    let record = qb_record();
    let applied =
        apply_override(&record, StatField::CompletionPct, 0.5, None, OverrideId::new(1), 1)
            .unwrap();
    let cleared = clear_override(&applied.record, StatField::CompletionPct, OverrideId::new(2), 2)
        .unwrap()
        .unwrap();
    assert_eq!(cleared.record.stats.completion_pct, 0.65);
}

#[test]
fn test_clear_without_override_is_none() {
    let record = qb_record();
    assert!(clear_override(&record, StatField::PassYards, OverrideId::new(1), 1)
        .unwrap()
        .is_none());
}

#[test]
fn test_reapply_frozen_onto_fresh_record() {
    let record = qb_record();
    let applied = apply_override(
        &record,
        StatField::CompletionPct,
        0.70,
        None,
        OverrideId::new(1),
        1,
    )
    .unwrap()
    .record;

    // Team volume grows; the analyst's completion rate must survive
    let mut fresh = qb_record();
    fresh.volume.pass_attempts = 600.0;
    recompute_all(&mut fresh.stats, &fresh.volume, 17.0, &BTreeMap::new()).unwrap();

    reapply_frozen(&mut fresh, &applied).unwrap();
    assert_eq!(fresh.stats.completion_pct, 0.70);
    assert!(close(fresh.stats.completions, 420.0));
    assert_eq!(fresh.frozen.get(&StatField::CompletionPct), Some(&0.65));
    assert!(fresh.has_overrides);
}
