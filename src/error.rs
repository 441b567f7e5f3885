//! Error types for the projection engine

use thiserror::Error;


pub type Result<T> = std::result::Result<T, ProjectionError>;

#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("Invalid team profile for {team}: {reason}")]
    InvalidTeamProfile { team: String, reason: String },

    #[error("Unknown stat field: {field}")]
    UnknownStatField { field: String },

    #[error("Projection not found: {id}")]
    ProjectionNotFound { id: u64 },

    #[error("Scenario not found: {id}")]
    ScenarioNotFound { id: u64 },

    #[error("No team profile for {team} in season {season}")]
    TeamProfileNotFound { team: String, season: u16 },

    #[error("Share allocation for {team} {category} exceeds available volume: {total:.3}")]
    InvalidShareAllocation {
        team: String,
        category: String,
        total: f64,
    },

    #[error("{team} {position} {field} over-allocated by {excess:.2}")]
    ReconciliationInconsistency {
        team: String,
        position: String,
        field: String,
        excess: f64,
    },

    #[error("Invalid override for {field} ({value}): {reason}")]
    InvalidOverrideValue {
        field: String,
        value: f64,
        reason: String,
    },

    #[error("Projection {id} is a fill player and only changes through reconciliation")]
    FillPlayerOverride { id: u64 },

    #[error("Unsupported confidence level: {level}")]
    InvalidConfidenceLevel { level: f64 },

    #[error("Invalid position: {position}")]
    InvalidPosition { position: String },

    #[error("Cannot delete baseline scenario {id}")]
    BaselineScenario { id: u64 },

    #[error("No baseline computed for season {season}")]
    NoBaseline { season: u16 },

    #[error("Season {season} is closed for {team}; profile is immutable")]
    SeasonClosed { team: String, season: u16 },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Recalculation of {field} produced a non-finite value")]
    NonFinite { field: String },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse id: {0}")]
    InvalidId(#[from] std::num::ParseIntError),

    #[error("Failed to parse number: {0}")]
    InvalidNumber(#[from] std::num::ParseFloatError),
}

impl ProjectionError {
    pub fn invalid_team(team: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTeamProfile {
            team: team.into(),
            reason: reason.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
