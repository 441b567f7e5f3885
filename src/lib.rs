//! Gridiron Projection Library
//!
//! A team-constrained fantasy football projection engine: player projections
//! are derived from team volume, usage shares and regressed efficiency, so
//! every team's players always add up to the team.
//!
//! ## Features
//!
//! - **Team Allocation**: Team plays split into pass attempts, rush attempts and sacks
//! - **Efficiency Regression**: Player rates shrunk toward position means in tiers by |z|-score
//! - **Overrides**: Manual values freeze a stat and cascade to its dependents
//! - **Fill Players**: Per-position residuals keep team totals whole
//! - **Scenarios**: Branch the baseline to explore what-ifs
//! - **Variance**: Confidence bounds from historical variability
//! - **Database Storage**: Profiles, scenarios and override logs in SQLite
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridiron_proj::{config::EngineConfig, storage::ProjectionDatabase};
//! use gridiron_proj::{ProjectionEngine, Season, TeamId};
//!
//! # fn example() -> gridiron_proj::Result<()> {
//! let mut db = ProjectionDatabase::new()?;
//! let season = Season::new(2025);
//! let engine = ProjectionEngine::new(db.load_profiles(Some(season))?, EngineConfig::load(None)?);
//!
//! let records = engine.compute_baseline(&TeamId::new("KC"), season)?;
//! let qb = &records[0];
//! engine.apply_override(qb.id, "pass_attempts", 500.0, Some("new OC".into()))?;
//!
//! db.save_book(&engine.snapshot())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Configuration
//!
//! ```bash
//! export GRIDIRON_PROJ_CONFIG=~/projections/config.json
//! export GRIDIRON_PROJ_DB=~/projections/projections.db
//! export RUST_LOG=gridiron_proj=debug
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod storage;

// Re-export commonly used types
pub use cli::types::{OverrideId, PlayerId, Position, ProjectionId, ScenarioId, Season, TeamId};
pub use engine::{MemoryProfiles, ProfileSource, ProjectionEngine};
pub use error::{ProjectionError, Result};
