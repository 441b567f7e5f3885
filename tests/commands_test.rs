//! Integration tests for command handlers

use gridiron_proj::{
    commands::{
        baseline::handle_baseline,
        overrides::handle_override,
        reconcile::handle_verify,
        scenarios::{handle_clone_scenario, handle_list_scenarios},
        CommandContext,
    },
    config::EngineConfig,
    engine::models::{PlayerUsageProfile, TeamSeasonProfile, UsageShares},
    storage::ProjectionDatabase,
    PlayerId, Position, ProjectionError, Season, TeamId,
};
use std::fs;
use std::thread;
use tempfile::TempDir;

const SEASON: Season = Season(2025);

fn seed(path: &std::path::Path) {
    let mut db = ProjectionDatabase::open(path).unwrap();
    db.upsert_team_profile(&TeamSeasonProfile {
        team: TeamId::new("PHI"),
        season: SEASON,
        games: 17.0,
        plays_per_game: 66.0,
        pass_rate: 0.5,
        sack_rate: 0.05,
        yards_per_sack: 7.0,
        yards_per_attempt: 7.4,
        completion_pct: 0.66,
        int_rate: 0.02,
        pass_td_rate: 0.05,
        target_rate: 0.9,
        yards_per_carry: 4.8,
        rush_td_rate: 0.05,
        fumble_rate: 0.01,
        closed: false,
    })
    .unwrap();
    for (id, position, pass, rush, target) in [
        (1, Position::QB, 1.0, 0.15, 0.0),
        (2, Position::RB, 0.0, 0.62, 0.12),
        (3, Position::WR, 0.0, 0.01, 0.28),
        (4, Position::WR, 0.0, 0.0, 0.25),
    ] {
        db.upsert_usage(&PlayerUsageProfile {
            player_id: PlayerId::new(id),
            name: format!("PHI {position} {id}"),
            team: TeamId::new("PHI"),
            season: SEASON,
            position,
            games: 17.0,
            shares: UsageShares { pass, rush, target },
            adjustments: None,
        })
        .unwrap();
    }
}

#[test]
fn test_commands_share_one_database() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("projections.db");
    let config_path = dir.path().join("config.json");
    seed(&db_path);
    EngineConfig::default().save(&config_path).unwrap();

    let mut ctx = CommandContext::new(Some(config_path.as_path()), Some(db_path.as_path())).unwrap();
    let team = TeamId::new("PHI");
    handle_baseline(&mut ctx, &team, SEASON, true).unwrap();

    // A fresh context sees what the first one saved
    let mut ctx = CommandContext::new(Some(config_path.as_path()), Some(db_path.as_path())).unwrap();
    let engine = ctx.engine(Some(SEASON)).unwrap();
    let baseline = engine.baseline_id(SEASON).unwrap();
    let wr = engine
        .scenario_records(baseline)
        .unwrap()
        .into_iter()
        .find(|r| r.player_id == Some(PlayerId::new(3)))
        .unwrap();

    handle_clone_scenario(&mut ctx, baseline, "Trade deadline", false).unwrap();
    handle_override(&mut ctx, wr.id, "target_share", 0.33, None, false).unwrap();
    handle_verify(&mut ctx, &team, SEASON, None, true).unwrap();
    handle_list_scenarios(&ctx, None, true).unwrap();

    let engine = ctx.engine(None).unwrap();
    assert_eq!(engine.list_scenarios(Some(SEASON)).len(), 2);
    assert!((engine.record(wr.id).unwrap().stats.target_share - 0.33).abs() < 1e-12);
    assert!(engine
        .verify_team(&team, SEASON, None)
        .unwrap()
        .is_consistent(1e-6));
}

#[test]
fn test_concurrent_writers_keep_each_others_updates() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("projections.db");
    seed(&db_path);

    let mut ctx = CommandContext::from_parts(
        ProjectionDatabase::open(&db_path).unwrap(),
        EngineConfig::default(),
    );
    handle_baseline(&mut ctx, &TeamId::new("PHI"), SEASON, true).unwrap();
    let baseline = ctx.engine(None).unwrap().baseline_id(SEASON).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|i| {
            let db_path = db_path.clone();
            thread::spawn(move || {
                let mut ctx = CommandContext::from_parts(
                    ProjectionDatabase::open(&db_path).unwrap(),
                    EngineConfig::default(),
                );
                handle_clone_scenario(&mut ctx, baseline, &format!("Branch {i}"), true).unwrap();
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let scenarios = ctx.engine(None).unwrap().list_scenarios(Some(SEASON));
    assert_eq!(scenarios.len(), 5);
    for i in 0..4 {
        let name = format!("Branch {i}");
        assert!(scenarios.iter().any(|s| s.name == name), "{name} was lost");
    }
}

#[test]
fn test_update_reads_book_written_after_context_opened() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("projections.db");
    seed(&db_path);

    let open = || {
        CommandContext::from_parts(ProjectionDatabase::open(&db_path).unwrap(), EngineConfig::default())
    };
    let mut first = open();
    let mut second = open();
    handle_baseline(&mut first, &TeamId::new("PHI"), SEASON, true).unwrap();

    // The second context never saw the baseline, yet its write keeps it
    let baseline = second.engine(None).unwrap().baseline_id(SEASON).unwrap();
    handle_clone_scenario(&mut second, baseline, "Late branch", true).unwrap();

    let engine = first.engine(None).unwrap();
    assert_eq!(engine.list_scenarios(Some(SEASON)).len(), 2);
    assert!(!engine.scenario_records(baseline).unwrap().is_empty());
}

#[test]
fn test_context_rejects_malformed_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, "[1, 2").unwrap();

    let result = CommandContext::new(Some(config_path.as_path()), Some(dir.path().join("p.db").as_path()));
    assert!(matches!(result, Err(ProjectionError::Config { .. })));
}

#[test]
fn test_missing_config_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.json");

    let ctx = CommandContext::new(Some(missing.as_path()), Some(dir.path().join("p.db").as_path())).unwrap();
    assert_eq!(ctx.config, EngineConfig::default());
}
