//! Engine configuration.
//!
//! Loaded from JSON. Lookup order: an explicit path, then the
//! `GRIDIRON_PROJ_CONFIG` environment variable, then
//! `~/.config/gridiron-proj/config.json`. A missing file means defaults; a file
//! that exists but does not parse or validate is an error.

use crate::{
    cli::types::Position,
    engine::{regression::RegressionConfig, stats::VolumeKind},
    error::{ProjectionError, Result},
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[cfg(test)]
mod tests;

pub const CONFIG_ENV_VAR: &str = "GRIDIRON_PROJ_CONFIG";
pub const DATABASE_ENV_VAR: &str = "GRIDIRON_PROJ_DB";

const APP_DIR: &str = "gridiron-proj";
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Per-position weights, used for envelope allocation and variance defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionWeights {
    pub qb: f64,
    pub rb: f64,
    pub wr: f64,
    pub te: f64,
}

impl PositionWeights {
    pub fn get(&self, position: Position) -> f64 {
        match position {
            Position::QB => self.qb,
            Position::RB => self.rb,
            Position::WR => self.wr,
            Position::TE => self.te,
        }
    }

    pub fn sum(&self) -> f64 {
        self.qb + self.rb + self.wr + self.te
    }
}

/// Fraction of each team envelope owned by each position group.
///
/// Every kind sums to 1.0 so that reconciling all four groups makes the team
/// totals equal the sum over every player, fill players included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionAllocation {
    pub passing: PositionWeights,
    pub rushing: PositionWeights,
    pub receiving: PositionWeights,
}

impl PositionAllocation {
    pub fn weight(&self, kind: VolumeKind, position: Position) -> f64 {
        match kind {
            VolumeKind::Passing => self.passing.get(position),
            VolumeKind::Rushing => self.rushing.get(position),
            VolumeKind::Receiving => self.receiving.get(position),
        }
    }
}

impl Default for PositionAllocation {
    fn default() -> Self {
        Self {
            passing: PositionWeights {
                qb: 1.0,
                rb: 0.0,
                wr: 0.0,
                te: 0.0,
            },
            rushing: PositionWeights {
                qb: 0.12,
                rb: 0.83,
                wr: 0.04,
                te: 0.01,
            },
            receiving: PositionWeights {
                qb: 0.0,
                rb: 0.18,
                wr: 0.60,
                te: 0.22,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    /// Residuals within this distance of zero need no fill player.
    pub epsilon: f64,
    /// Negative residuals beyond this are reported as inconsistencies.
    pub negative_tolerance: f64,
    pub position_allocation: PositionAllocation,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            negative_tolerance: 0.5,
            position_allocation: PositionAllocation::default(),
        }
    }
}

/// How `PlayerUsageProfile::adjustments` are applied to base shares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareAdjustmentMode {
    /// The adjustment replaces the share outright.
    #[default]
    Absolute,
    /// The adjustment multiplies the share.
    Multiplicative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Portion of every team volume held back for the fill player.
    pub fill_reserve: f64,
    pub adjustment_mode: ShareAdjustmentMode,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            fill_reserve: 0.0,
            adjustment_mode: ShareAdjustmentMode::Absolute,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VarianceConfig {
    /// Seasons of history required before player coefficients are trusted.
    pub min_seasons: u32,
    /// Extra interval width at zero seasons of history; decays as 1/(1+seasons).
    pub history_shrink: f64,
    /// Per-game coefficient of variation used when history is thin.
    pub default_cv: PositionWeights,
}

impl Default for VarianceConfig {
    fn default() -> Self {
        Self {
            min_seasons: 2,
            history_shrink: 0.5,
            default_cv: PositionWeights {
                qb: 0.25,
                rb: 0.40,
                wr: 0.45,
                te: 0.50,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub games_in_season: f64,
    pub regression: RegressionConfig,
    pub fill: FillConfig,
    pub shares: ShareConfig,
    pub variance: VarianceConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            games_in_season: 17.0,
            regression: RegressionConfig::default(),
            fill: FillConfig::default(),
            shares: ShareConfig::default(),
            variance: VarianceConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration, falling back to defaults when no file exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match std::env::var(CONFIG_ENV_VAR) {
                Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
                _ => default_config_path(),
            },
        };

        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)?;
        let config: EngineConfig = serde_json::from_str(&contents).map_err(|e| {
            ProjectionError::config(format!("malformed config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        tracing::debug!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Write the configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.games_in_season > 0.0) {
            return Err(ProjectionError::config("games_in_season must be positive"));
        }
        self.regression.validate()?;

        let fill = &self.fill;
        if !(fill.epsilon >= 0.0) || !(fill.negative_tolerance >= 0.0) {
            return Err(ProjectionError::config(
                "fill epsilon and negative_tolerance must be non-negative",
            ));
        }
        let allocation = &fill.position_allocation;
        for (name, weights) in [
            ("passing", allocation.passing),
            ("rushing", allocation.rushing),
            ("receiving", allocation.receiving),
        ] {
            if [weights.qb, weights.rb, weights.wr, weights.te]
                .iter()
                .any(|w| !(*w >= 0.0))
            {
                return Err(ProjectionError::config(format!(
                    "{name} allocation weights must be non-negative"
                )));
            }
            if (weights.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
                return Err(ProjectionError::config(format!(
                    "{name} allocation weights sum to {:.4}, expected 1.0",
                    weights.sum()
                )));
            }
        }

        if !(0.0..1.0).contains(&self.shares.fill_reserve) {
            return Err(ProjectionError::config("fill_reserve must be in [0, 1)"));
        }
        if !(self.variance.history_shrink >= 0.0) {
            return Err(ProjectionError::config("history_shrink must be non-negative"));
        }
        Ok(())
    }
}

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    let base = base.unwrap_or_else(|| {
        let mut home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.push(".config");
        home
    });
    base.join(APP_DIR)
}

/// Path: ~/.config/gridiron-proj/config.json
pub fn default_config_path() -> PathBuf {
    app_dir(dirs::config_dir()).join("config.json")
}

/// Path: `GRIDIRON_PROJ_DB`, else ~/.cache/gridiron-proj/projections.db
pub fn database_path() -> PathBuf {
    match std::env::var(DATABASE_ENV_VAR) {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => app_dir(dirs::cache_dir()).join("projections.db"),
    }
}
