//! Confidence intervals from historical game-to-game variability.
//!
//! Estimates are computed on demand from the committed record and are never
//! stored, so they always reflect the latest override.

use super::{
    models::{HistoricalVariance, ProjectionRecord},
    stats::StatField,
};
use crate::{
    cli::types::ProjectionId,
    config::VarianceConfig,
    error::{ProjectionError, Result},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;


const LEVEL_TOLERANCE: f64 = 1e-9;

/// Supported two-sided confidence levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ConfidenceLevel {
    P50,
    P80,
    P90,
    P95,
}

impl ConfidenceLevel {
    pub const ALL: [ConfidenceLevel; 4] = [
        ConfidenceLevel::P50,
        ConfidenceLevel::P80,
        ConfidenceLevel::P90,
        ConfidenceLevel::P95,
    ];

    pub fn as_f64(&self) -> f64 {
        match self {
            ConfidenceLevel::P50 => 0.50,
            ConfidenceLevel::P80 => 0.80,
            ConfidenceLevel::P90 => 0.90,
            ConfidenceLevel::P95 => 0.95,
        }
    }

    /// Standard normal quantile for the two-sided interval.
    pub fn z(&self) -> f64 {
        match self {
            ConfidenceLevel::P50 => 0.6745,
            ConfidenceLevel::P80 => 1.2816,
            ConfidenceLevel::P90 => 1.6449,
            ConfidenceLevel::P95 => 1.96,
        }
    }
}

impl TryFrom<f64> for ConfidenceLevel {
    type Error = ProjectionError;

    fn try_from(level: f64) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|l| (l.as_f64() - level).abs() < LEVEL_TOLERANCE)
            .ok_or(ProjectionError::InvalidConfidenceLevel { level })
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.as_f64() * 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub projected: f64,
    pub stddev: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarianceEstimate {
    pub projection_id: ProjectionId,
    pub confidence: ConfidenceLevel,
    /// Seasons of history behind the estimate.
    pub seasons: u32,
    /// True when the position default coefficient was used for any stat.
    pub used_position_default: bool,
    pub bounds: BTreeMap<StatField, Bounds>,
}

impl VarianceEstimate {
    pub fn get(&self, field: StatField) -> Option<&Bounds> {
        self.bounds.get(&field)
    }
}

pub struct VarianceEstimator<'a> {
    config: &'a VarianceConfig,
}

impl<'a> VarianceEstimator<'a> {
    pub fn new(config: &'a VarianceConfig) -> Self {
        Self { config }
    }

    /// Interval multiplier for thin history; decreases as seasons grow.
    pub fn history_multiplier(&self, seasons: u32) -> f64 {
        1.0 + self.config.history_shrink / (1.0 + seasons as f64)
    }

    /// Bounds for every counting stat and fantasy points.
    ///
    /// `history` supplies player coefficients; `fallback_seasons` is used
    /// when it is absent (typically the efficiency profile's years).
    pub fn estimate(
        &self,
        record: &ProjectionRecord,
        history: Option<&HistoricalVariance>,
        fallback_seasons: u32,
        level: ConfidenceLevel,
    ) -> VarianceEstimate {
        let seasons = history.map(|h| h.seasons).unwrap_or(fallback_seasons);
        let trusted = seasons >= self.config.min_seasons;
        let default_cv = self.config.default_cv.get(record.position);
        let multiplier = self.history_multiplier(seasons);
        let games = record.stats.games.max(1.0);
        let z = level.z();

        let mut used_position_default = false;
        let mut bounds = BTreeMap::new();
        for field in StatField::COUNTS.into_iter().chain([StatField::FantasyPoints]) {
            let cv = match history.and_then(|h| h.coefficients.get(&field)) {
                Some(cv) if trusted => *cv,
                _ => {
                    used_position_default = true;
                    default_cv
                }
            };
            let projected = record.stats.get(field);
            let stddev = cv * projected.abs() / games.sqrt() * multiplier;
            let mut lower = projected - z * stddev;
            if field != StatField::FantasyPoints && projected >= 0.0 {
                lower = lower.max(0.0);
            }
            bounds.insert(
                field,
                Bounds {
                    projected,
                    stddev,
                    lower,
                    upper: projected + z * stddev,
                },
            );
        }

        VarianceEstimate {
            projection_id: record.id,
            confidence: level,
            seasons,
            used_position_default,
            bounds,
        }
    }
}
