//! Regression of efficiency metrics toward a position baseline.
//!
//! The shrinkage factor is picked by the metric's |z| against the position
//! mean/standard deviation. Larger outliers are pulled harder toward the mean:
//!
//! | \|z\|          | factor |
//! |----------------|--------|
//! | > 2.0          | 0.50   |
//! | (1.5, 2.0]     | 0.35   |
//! | (1.0, 1.5]     | 0.20   |
//! | ≤ 1.0          | 0.10   |
//!
//! `regressed = mean + (raw - mean) * (1 - factor)`

use super::{models::MetricBaseline, stats::StatField};
use crate::{
    cli::types::Position,
    error::{ProjectionError, Result},
};
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// One row of the tier table: applies when `|z| <= max_abs_z`.
///
/// `max_abs_z = None` is the unbounded top tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShrinkageTier {
    pub max_abs_z: Option<f64>,
    pub factor: f64,
}

/// Tier table for one position and/or metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierOverride {
    pub position: Option<Position>,
    pub metric: Option<StatField>,
    pub tiers: Vec<ShrinkageTier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    pub default_tiers: Vec<ShrinkageTier>,
    pub overrides: Vec<TierOverride>,
}

pub fn default_tiers() -> Vec<ShrinkageTier> {
    vec![
        ShrinkageTier {
            max_abs_z: Some(1.0),
            factor: 0.10,
        },
        ShrinkageTier {
            max_abs_z: Some(1.5),
            factor: 0.20,
        },
        ShrinkageTier {
            max_abs_z: Some(2.0),
            factor: 0.35,
        },
        ShrinkageTier {
            max_abs_z: None,
            factor: 0.50,
        },
    ]
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            default_tiers: default_tiers(),
            overrides: Vec::new(),
        }
    }
}

impl RegressionConfig {
    pub fn validate(&self) -> Result<()> {
        validate_tiers(&self.default_tiers)?;
        for o in &self.overrides {
            if o.position.is_none() && o.metric.is_none() {
                return Err(ProjectionError::config(
                    "tier override needs a position or a metric",
                ));
            }
            if let Some(metric) = o.metric {
                if !StatField::RATES.contains(&metric) {
                    return Err(ProjectionError::config(format!(
                        "{metric} is not a regressed efficiency metric"
                    )));
                }
            }
            validate_tiers(&o.tiers)?;
        }
        Ok(())
    }

    /// Most specific table for (position, metric): both, then metric, then position.
    pub fn tiers_for(&self, position: Position, metric: StatField) -> &[ShrinkageTier] {
        let exact = self
            .overrides
            .iter()
            .find(|o| o.position == Some(position) && o.metric == Some(metric));
        let by_metric = || {
            self.overrides
                .iter()
                .find(|o| o.position.is_none() && o.metric == Some(metric))
        };
        let by_position = || {
            self.overrides
                .iter()
                .find(|o| o.position == Some(position) && o.metric.is_none())
        };
        exact
            .or_else(by_metric)
            .or_else(by_position)
            .map(|o| o.tiers.as_slice())
            .unwrap_or(&self.default_tiers)
    }
}

/// Tiers must have ascending bounds, end unbounded, and never shrink less as |z| grows.
fn validate_tiers(tiers: &[ShrinkageTier]) -> Result<()> {
    let Some(last) = tiers.last() else {
        return Err(ProjectionError::config("tier table is empty"));
    };
    if last.max_abs_z.is_some() {
        return Err(ProjectionError::config(
            "last shrinkage tier must be unbounded",
        ));
    }
    let mut prev_bound = f64::NEG_INFINITY;
    let mut prev_factor = f64::NEG_INFINITY;
    for (i, tier) in tiers.iter().enumerate() {
        if !(0.0..=1.0).contains(&tier.factor) {
            return Err(ProjectionError::config(format!(
                "shrinkage factor {} outside [0, 1]",
                tier.factor
            )));
        }
        if tier.factor < prev_factor {
            return Err(ProjectionError::config(
                "shrinkage factors must be non-decreasing in |z|",
            ));
        }
        match tier.max_abs_z {
            Some(bound) if bound <= prev_bound || bound < 0.0 => {
                return Err(ProjectionError::config(
                    "shrinkage tier bounds must be ascending and non-negative",
                ))
            }
            Some(bound) => prev_bound = bound,
            None if i + 1 != tiers.len() => {
                return Err(ProjectionError::config(
                    "only the last shrinkage tier may be unbounded",
                ))
            }
            None => {}
        }
        prev_factor = tier.factor;
    }
    Ok(())
}

/// Outcome of regressing one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    pub z_score: f64,
    pub factor: f64,
    pub regressed: f64,
}

/// z-score with a zero standard deviation resolving to 0.
pub fn z_score(raw: f64, mean: f64, stddev: f64) -> f64 {
    if stddev <= 0.0 || !stddev.is_finite() {
        return 0.0;
    }
    (raw - mean) / stddev
}

pub fn shrinkage_factor(tiers: &[ShrinkageTier], abs_z: f64) -> f64 {
    tiers
        .iter()
        .find(|t| t.max_abs_z.map_or(true, |bound| abs_z <= bound))
        .or(tiers.last())
        .map(|t| t.factor)
        .unwrap_or(0.0)
}

/// Regress against an explicit tier table.
pub fn regress_with(tiers: &[ShrinkageTier], raw: f64, mean: f64, stddev: f64) -> Regression {
    let z = z_score(raw, mean, stddev);
    let factor = shrinkage_factor(tiers, z.abs());
    Regression {
        z_score: z,
        factor,
        regressed: mean + (raw - mean) * (1.0 - factor),
    }
}

/// Regress against the default tier table.
pub fn regress(raw: f64, mean: f64, stddev: f64) -> Regression {
    regress_with(&default_tiers(), raw, mean, stddev)
}

/// Applies position/metric tier tables from configuration.
pub struct EfficiencyRegressor<'a> {
    config: &'a RegressionConfig,
}

impl<'a> EfficiencyRegressor<'a> {
    pub fn new(config: &'a RegressionConfig) -> Self {
        Self { config }
    }

    pub fn regress_metric(
        &self,
        position: Position,
        metric: StatField,
        baseline: &MetricBaseline,
    ) -> Regression {
        let tiers = self.config.tiers_for(position, metric);
        let mut result = regress_with(tiers, baseline.raw, baseline.mean, baseline.stddev);
        if metric.is_fraction() {
            result.regressed = result.regressed.clamp(0.0, 1.0);
        }
        result
    }
}
