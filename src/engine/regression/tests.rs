//! Unit tests for efficiency regression

use super::*;

#[test]
fn test_documented_example() {
    // mean 4.3, sd 0.5, raw 5.2 => z 1.8 => factor 0.35
    let r = regress(5.2, 4.3, 0.5);
    assert!((r.z_score - 1.8).abs() < 1e-9);
    assert_eq!(r.factor, 0.35);
    assert!((r.regressed - 4.885).abs() < 1e-9);
    assert!((r.regressed - 4.89).abs() <= 0.0051);
}

#[test]
fn test_zero_stddev_means_no_outlier() {
    let r = regress(7.0, 4.3, 0.0);
    assert_eq!(r.z_score, 0.0);
    assert_eq!(r.factor, 0.10);
    assert!((r.regressed - (4.3 + 2.7 * 0.9)).abs() < 1e-9);
}

#[test]
fn test_tier_boundaries() {
    let tiers = default_tiers();
    assert_eq!(shrinkage_factor(&tiers, 0.0), 0.10);
    assert_eq!(shrinkage_factor(&tiers, 1.0), 0.10);
    assert_eq!(shrinkage_factor(&tiers, 1.0001), 0.20);
    assert_eq!(shrinkage_factor(&tiers, 1.5), 0.20);
    assert_eq!(shrinkage_factor(&tiers, 1.7), 0.35);
    assert_eq!(shrinkage_factor(&tiers, 2.0), 0.35);
    assert_eq!(shrinkage_factor(&tiers, 2.0001), 0.50);
    assert_eq!(shrinkage_factor(&tiers, 9.0), 0.50);
}

#[test]
fn test_factor_monotonic_in_abs_z() {
    let tiers = default_tiers();
    let mut prev = 0.0;
    for step in 0..=400 {
        let z = step as f64 * 0.01;
        let f = shrinkage_factor(&tiers, z);
        assert!(f >= prev, "factor dropped at |z|={z}");
        prev = f;
    }
}

#[test]
fn test_regression_is_symmetric_and_bounded() {
    let above = regress(5.4, 4.3, 0.5);
    let below = regress(3.2, 4.3, 0.5);
    assert!((above.regressed - 4.3 - (4.3 - below.regressed)).abs() < 1e-9);

    // Never overshoots the mean and never moves away from it
    for raw in [2.0, 3.9, 4.3, 4.6, 6.5] {
        let r = regress(raw, 4.3, 0.5);
        assert!((r.regressed - 4.3).abs() <= (raw - 4.3).abs() + 1e-12);
        assert!((r.regressed - 4.3) * (raw - 4.3) >= 0.0);
    }
}

#[test]
fn test_tier_override_lookup() {
    let wide = vec![ShrinkageTier {
        max_abs_z: None,
        factor: 0.6,
    }];
    let metric_only = vec![ShrinkageTier {
        max_abs_z: None,
        factor: 0.4,
    }];
    let config = RegressionConfig {
        default_tiers: default_tiers(),
        overrides: vec![
            TierOverride {
                position: Some(Position::RB),
                metric: Some(StatField::YardsPerCarry),
                tiers: wide.clone(),
            },
            TierOverride {
                position: None,
                metric: Some(StatField::YardsPerCarry),
                tiers: metric_only.clone(),
            },
        ],
    };
    assert!(config.validate().is_ok());
    assert_eq!(config.tiers_for(Position::RB, StatField::YardsPerCarry), &wide[..]);
    assert_eq!(
        config.tiers_for(Position::QB, StatField::YardsPerCarry),
        &metric_only[..]
    );
    assert_eq!(
        config.tiers_for(Position::WR, StatField::CatchRate),
        &default_tiers()[..]
    );
}

#[test]
fn test_override_metric_must_be_rate() {
    let config = RegressionConfig {
        default_tiers: default_tiers(),
        overrides: vec![TierOverride {
            position: None,
            metric: Some(StatField::RushYards),
            tiers: default_tiers(),
        }],
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_fraction_metrics_clamped() {
    let config = RegressionConfig::default();
    let regressor = EfficiencyRegressor::new(&config);
    let baseline = MetricBaseline {
        raw: 1.4,
        mean: 0.95,
        stddev: 0.05,
        years: 3,
    };
    let r = regressor.regress_metric(Position::WR, StatField::CatchRate, &baseline);
    assert_eq!(r.factor, 0.50);
    assert_eq!(r.regressed, 1.0);
}
