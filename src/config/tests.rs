//! Unit tests for configuration loading

use super::*;
use crate::engine::regression::ShrinkageTier;
use tempfile::TempDir;

#[test]
fn test_default_config_is_valid() {
    let config = EngineConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.games_in_season, 17.0);
    assert_eq!(config.shares.adjustment_mode, ShareAdjustmentMode::Absolute);
}

#[test]
fn test_default_allocation_sums_to_one() {
    let allocation = PositionAllocation::default();
    for kind in [VolumeKind::Passing, VolumeKind::Rushing, VolumeKind::Receiving] {
        let total: f64 = Position::ALL
            .iter()
            .map(|p| allocation.weight(kind, *p))
            .sum();
        assert!((total - 1.0).abs() < 1e-9, "{kind:?} sums to {total}");
    }
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::load(Some(dir.path().join("nope.json").as_path())).unwrap();
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn test_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut config = EngineConfig::default();
    config.fill.epsilon = 0.5;
    config.shares.adjustment_mode = ShareAdjustmentMode::Multiplicative;
    config.save(&path).unwrap();

    let loaded = EngineConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "fill": { "epsilon": 0.25 } }"#).unwrap();

    let config = EngineConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(config.fill.epsilon, 0.25);
    assert_eq!(config.fill.negative_tolerance, 0.5);
    assert_eq!(config.games_in_season, 17.0);
}

#[test]
fn test_malformed_file_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    match EngineConfig::load(Some(path.as_path())) {
        Err(ProjectionError::Config { message }) => assert!(message.contains("malformed")),
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_allocation_must_sum_to_one() {
    let mut config = EngineConfig::default();
    config.fill.position_allocation.rushing.rb = 0.5;
    match config.validate() {
        Err(ProjectionError::Config { message }) => assert!(message.contains("rushing")),
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_non_monotonic_tiers_rejected() {
    let mut config = EngineConfig::default();
    config.regression.default_tiers = vec![
        ShrinkageTier {
            max_abs_z: Some(1.0),
            factor: 0.30,
        },
        ShrinkageTier {
            max_abs_z: None,
            factor: 0.10,
        },
    ];
    assert!(config.validate().is_err());
}

#[test]
fn test_bad_reserve_rejected() {
    let mut config = EngineConfig::default();
    config.shares.fill_reserve = 1.0;
    assert!(config.validate().is_err());
}
