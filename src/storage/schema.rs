//! Database schema and connection management

use crate::config::database_path;
use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

const BUSY_TIMEOUT_SECS: u64 = 10;

/// SQLite store for profiles, scenarios, projection records and override logs
pub struct ProjectionDatabase {
    pub(crate) conn: Connection,
}

impl ProjectionDatabase {
    /// Open the database at the configured path and ensure tables exist
    pub fn new() -> Result<Self> {
        Self::open(&database_path())
    }

    pub fn open(path: &Path) -> Result<Self> {
        // Ensure the cache directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        // Writers from other processes wait on the lock instead of failing
        conn.busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS))?;
        let mut db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize the database schema
    pub(crate) fn initialize_schema(&mut self) -> Result<()> {
        // Ingestion inputs
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS team_profiles (
                team TEXT NOT NULL,
                season INTEGER NOT NULL,
                games REAL NOT NULL,
                plays_per_game REAL NOT NULL,
                pass_rate REAL NOT NULL,
                sack_rate REAL NOT NULL,
                yards_per_sack REAL NOT NULL,
                yards_per_attempt REAL NOT NULL,
                completion_pct REAL NOT NULL,
                int_rate REAL NOT NULL,
                pass_td_rate REAL NOT NULL,
                target_rate REAL NOT NULL,
                yards_per_carry REAL NOT NULL,
                rush_td_rate REAL NOT NULL,
                fumble_rate REAL NOT NULL,
                closed INTEGER NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (team, season)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS usage_profiles (
                player_id INTEGER NOT NULL,
                season INTEGER NOT NULL,
                name TEXT NOT NULL,
                team TEXT NOT NULL,
                position TEXT NOT NULL,
                games REAL NOT NULL,
                pass_share REAL NOT NULL,
                rush_share REAL NOT NULL,
                target_share REAL NOT NULL,
                pass_adjustment REAL,
                rush_adjustment REAL,
                target_adjustment REAL,
                PRIMARY KEY (player_id, season)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS efficiency_metrics (
                player_id INTEGER NOT NULL,
                season INTEGER NOT NULL,
                position TEXT NOT NULL,
                metric TEXT NOT NULL,
                raw REAL NOT NULL,
                mean REAL NOT NULL,
                stddev REAL NOT NULL,
                years INTEGER NOT NULL,
                PRIMARY KEY (player_id, season, metric)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS variance_history (
                player_id INTEGER NOT NULL,
                season INTEGER NOT NULL,
                seasons INTEGER NOT NULL,
                PRIMARY KEY (player_id, season)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS variance_coefficients (
                player_id INTEGER NOT NULL,
                season INTEGER NOT NULL,
                metric TEXT NOT NULL,
                coefficient REAL NOT NULL,
                PRIMARY KEY (player_id, season, metric),
                FOREIGN KEY (player_id, season)
                    REFERENCES variance_history(player_id, season) ON DELETE CASCADE
            )",
            [],
        )?;

        // Engine state
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS scenarios (
                scenario_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                season INTEGER NOT NULL,
                is_baseline INTEGER NOT NULL,
                base_scenario_id INTEGER,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        // `stats` and `frozen` hold the serialized stat line and frozen map
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS projections (
                projection_id INTEGER PRIMARY KEY,
                scenario_id INTEGER NOT NULL,
                player_id INTEGER,
                name TEXT NOT NULL,
                team TEXT NOT NULL,
                position TEXT NOT NULL,
                season INTEGER NOT NULL,
                games_in_season REAL NOT NULL,
                team_pass_attempts REAL NOT NULL,
                team_rush_attempts REAL NOT NULL,
                team_targets REAL NOT NULL,
                team_sack_yards REAL NOT NULL DEFAULT 0,
                stats TEXT NOT NULL,
                frozen TEXT NOT NULL,
                has_overrides INTEGER NOT NULL,
                is_fill_player INTEGER NOT NULL,
                fantasy_points REAL NOT NULL,
                FOREIGN KEY (scenario_id) REFERENCES scenarios(scenario_id) ON DELETE CASCADE
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS stat_overrides (
                override_id INTEGER PRIMARY KEY,
                projection_id INTEGER NOT NULL,
                field TEXT NOT NULL,
                calculated_value REAL NOT NULL,
                manual_value REAL NOT NULL,
                notes TEXT,
                created_at INTEGER NOT NULL,
                cleared INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (projection_id) REFERENCES projections(projection_id) ON DELETE CASCADE
            )",
            [],
        )?;

        // Create indexes for performance
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_usage_team_season
             ON usage_profiles(team, season)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_projection_group
             ON projections(scenario_id, team, position)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_override_projection
             ON stat_overrides(projection_id)",
            [],
        )?;

        Ok(())
    }
}
