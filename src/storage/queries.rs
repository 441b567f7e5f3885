//! Profile queries: the ingestion side of the store

use super::schema::ProjectionDatabase;
use crate::engine::{
    models::{
        now_secs, HistoricalVariance, MetricBaseline, PlayerEfficiencyProfile,
        PlayerUsageProfile, ShareAdjustments, TeamSeasonProfile, UsageShares,
    },
    stats::StatField,
    MemoryProfiles,
};
use crate::error::ProjectionError;
use crate::{PlayerId, Position, Season, TeamId};
use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};
use std::collections::BTreeMap;

const TEAM_COLUMNS: &str = "team, season, games, plays_per_game, pass_rate, sack_rate,
    yards_per_sack, yards_per_attempt, completion_pct, int_rate, pass_td_rate, target_rate,
    yards_per_carry, rush_td_rate, fumble_rate, closed";

const USAGE_COLUMNS: &str = "player_id, season, name, team, position, games, pass_share,
    rush_share, target_share, pass_adjustment, rush_adjustment, target_adjustment";

/// Raw usage row before position parsing
type UsageRow = (
    u64,
    u16,
    String,
    String,
    String,
    f64,
    [f64; 3],
    [Option<f64>; 3],
);

impl ProjectionDatabase {
    /// Insert or update a team's season profile.
    ///
    /// Fails with [`ProjectionError::SeasonClosed`] once the season is closed.
    pub fn upsert_team_profile(&mut self, profile: &TeamSeasonProfile) -> Result<()> {
        if let Some(existing) = self.get_team_profile(&profile.team, profile.season)? {
            if existing.closed {
                return Err(ProjectionError::SeasonClosed {
                    team: profile.team.to_string(),
                    season: profile.season.as_u16(),
                }
                .into());
            }
        }

        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO team_profiles ({TEAM_COLUMNS}, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            params![
                profile.team.as_str(),
                profile.season.as_u16(),
                profile.games,
                profile.plays_per_game,
                profile.pass_rate,
                profile.sack_rate,
                profile.yards_per_sack,
                profile.yards_per_attempt,
                profile.completion_pct,
                profile.int_rate,
                profile.pass_td_rate,
                profile.target_rate,
                profile.yards_per_carry,
                profile.rush_td_rate,
                profile.fumble_rate,
                profile.closed,
                now_secs(),
            ],
        )?;
        Ok(())
    }

    /// Mark a team's season as closed. Returns false if no profile exists.
    pub fn close_season(&mut self, team: &TeamId, season: Season) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE team_profiles SET closed = 1, updated_at = ? WHERE team = ? AND season = ?",
            params![now_secs(), team.as_str(), season.as_u16()],
        )?;
        Ok(rows > 0)
    }

    fn row_to_team_profile(row: &Row) -> rusqlite::Result<TeamSeasonProfile> {
        let team: String = row.get(0)?;
        Ok(TeamSeasonProfile {
            team: TeamId::new(team),
            season: Season::new(row.get(1)?),
            games: row.get(2)?,
            plays_per_game: row.get(3)?,
            pass_rate: row.get(4)?,
            sack_rate: row.get(5)?,
            yards_per_sack: row.get(6)?,
            yards_per_attempt: row.get(7)?,
            completion_pct: row.get(8)?,
            int_rate: row.get(9)?,
            pass_td_rate: row.get(10)?,
            target_rate: row.get(11)?,
            yards_per_carry: row.get(12)?,
            rush_td_rate: row.get(13)?,
            fumble_rate: row.get(14)?,
            closed: row.get(15)?,
        })
    }

    pub fn get_team_profile(
        &self,
        team: &TeamId,
        season: Season,
    ) -> Result<Option<TeamSeasonProfile>> {
        let profile = self
            .conn
            .query_row(
                &format!(
                    "SELECT {TEAM_COLUMNS} FROM team_profiles WHERE team = ? AND season = ?"
                ),
                params![team.as_str(), season.as_u16()],
                Self::row_to_team_profile,
            )
            .optional()?;
        Ok(profile)
    }

    /// All team profiles, optionally restricted to one season
    pub fn list_team_profiles(&self, season: Option<Season>) -> Result<Vec<TeamSeasonProfile>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TEAM_COLUMNS} FROM team_profiles
             WHERE (?1 IS NULL OR season = ?1)
             ORDER BY season, team"
        ))?;
        let rows = stmt.query_map(params![season.map(|s| s.as_u16())], Self::row_to_team_profile)?;

        let mut profiles = Vec::new();
        for row in rows {
            profiles.push(row?);
        }
        Ok(profiles)
    }

    /// Insert or update a player's usage for a season
    pub fn upsert_usage(&mut self, usage: &PlayerUsageProfile) -> Result<()> {
        let adj = usage.adjustments.unwrap_or_default();
        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO usage_profiles ({USAGE_COLUMNS})
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            params![
                usage.player_id.as_u64(),
                usage.season.as_u16(),
                usage.name,
                usage.team.as_str(),
                usage.position.as_str(),
                usage.games,
                usage.shares.pass,
                usage.shares.rush,
                usage.shares.target,
                adj.pass,
                adj.rush,
                adj.target,
            ],
        )?;
        Ok(())
    }

    fn row_to_usage(row: &Row) -> rusqlite::Result<UsageRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            [row.get(6)?, row.get(7)?, row.get(8)?],
            [row.get(9)?, row.get(10)?, row.get(11)?],
        ))
    }

    fn usage_from_row(row: UsageRow) -> Result<PlayerUsageProfile> {
        let (player_id, season, name, team, position, games, shares, adj) = row;
        let adjustments = if adj.iter().any(Option::is_some) {
            Some(ShareAdjustments {
                pass: adj[0],
                rush: adj[1],
                target: adj[2],
            })
        } else {
            None
        };
        Ok(PlayerUsageProfile {
            player_id: PlayerId::new(player_id),
            name,
            team: TeamId::new(team),
            season: Season::new(season),
            position: position.parse::<Position>()?,
            games,
            shares: UsageShares {
                pass: shares[0],
                rush: shares[1],
                target: shares[2],
            },
            adjustments,
        })
    }

    /// Usage profiles, optionally restricted to one season
    pub fn list_usage(&self, season: Option<Season>) -> Result<Vec<PlayerUsageProfile>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {USAGE_COLUMNS} FROM usage_profiles
             WHERE (?1 IS NULL OR season = ?1)
             ORDER BY season, team, player_id"
        ))?;
        let rows = stmt.query_map(params![season.map(|s| s.as_u16())], Self::row_to_usage)?;

        let mut usages = Vec::new();
        for row in rows {
            usages.push(Self::usage_from_row(row?)?);
        }
        Ok(usages)
    }

    /// Replace a player's efficiency metrics for a season
    pub fn upsert_efficiency(&mut self, profile: &PlayerEfficiencyProfile) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM efficiency_metrics WHERE player_id = ? AND season = ?",
            params![profile.player_id.as_u64(), profile.season.as_u16()],
        )?;
        for (metric, baseline) in &profile.metrics {
            tx.execute(
                "INSERT INTO efficiency_metrics
                 (player_id, season, position, metric, raw, mean, stddev, years)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    profile.player_id.as_u64(),
                    profile.season.as_u16(),
                    profile.position.as_str(),
                    metric.as_str(),
                    baseline.raw,
                    baseline.mean,
                    baseline.stddev,
                    baseline.years,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Efficiency profiles grouped from their metric rows
    pub fn list_efficiency(&self, season: Option<Season>) -> Result<Vec<PlayerEfficiencyProfile>> {
        let mut stmt = self.conn.prepare(
            "SELECT player_id, season, position, metric, raw, mean, stddev, years
             FROM efficiency_metrics
             WHERE (?1 IS NULL OR season = ?1)
             ORDER BY player_id, season",
        )?;
        let rows = stmt.query_map(params![season.map(|s| s.as_u16())], |row| {
            Ok((
                row.get::<_, u64>(0)?,
                row.get::<_, u16>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                MetricBaseline {
                    raw: row.get(4)?,
                    mean: row.get(5)?,
                    stddev: row.get(6)?,
                    years: row.get(7)?,
                },
            ))
        })?;

        let mut profiles: BTreeMap<(u64, u16), PlayerEfficiencyProfile> = BTreeMap::new();
        for row in rows {
            let (player_id, season, position, metric, baseline) = row?;
            let position: Position = position.parse()?;
            let metric: StatField = metric.parse()?;
            profiles
                .entry((player_id, season))
                .or_insert_with(|| PlayerEfficiencyProfile {
                    player_id: PlayerId::new(player_id),
                    season: Season::new(season),
                    position,
                    metrics: BTreeMap::new(),
                })
                .metrics
                .insert(metric, baseline);
        }
        Ok(profiles.into_values().collect())
    }

    /// Replace a player's variance history for a season
    pub fn upsert_variance(&mut self, history: &HistoricalVariance) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM variance_history WHERE player_id = ? AND season = ?",
            params![history.player_id.as_u64(), history.season.as_u16()],
        )?;
        tx.execute(
            "INSERT INTO variance_history (player_id, season, seasons) VALUES (?, ?, ?)",
            params![
                history.player_id.as_u64(),
                history.season.as_u16(),
                history.seasons
            ],
        )?;
        for (metric, coefficient) in &history.coefficients {
            tx.execute(
                "INSERT INTO variance_coefficients (player_id, season, metric, coefficient)
                 VALUES (?, ?, ?, ?)",
                params![
                    history.player_id.as_u64(),
                    history.season.as_u16(),
                    metric.as_str(),
                    coefficient
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn list_variance(&self, season: Option<Season>) -> Result<Vec<HistoricalVariance>> {
        let mut stmt = self.conn.prepare(
            "SELECT h.player_id, h.season, h.seasons, c.metric, c.coefficient
             FROM variance_history h
             LEFT JOIN variance_coefficients c
               ON c.player_id = h.player_id AND c.season = h.season
             WHERE (?1 IS NULL OR h.season = ?1)
             ORDER BY h.player_id, h.season",
        )?;
        let rows = stmt.query_map(params![season.map(|s| s.as_u16())], |row| {
            Ok((
                row.get::<_, u64>(0)?,
                row.get::<_, u16>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<f64>>(4)?,
            ))
        })?;

        let mut histories: BTreeMap<(u64, u16), HistoricalVariance> = BTreeMap::new();
        for row in rows {
            let (player_id, season, seasons, metric, coefficient) = row?;
            let history = histories
                .entry((player_id, season))
                .or_insert_with(|| HistoricalVariance {
                    player_id: PlayerId::new(player_id),
                    season: Season::new(season),
                    seasons,
                    coefficients: BTreeMap::new(),
                });
            if let (Some(metric), Some(coefficient)) = (metric, coefficient) {
                history.coefficients.insert(metric.parse()?, coefficient);
            }
        }
        Ok(histories.into_values().collect())
    }

    /// Every stored profile for `season` (or all seasons) as an in-memory source
    pub fn load_profiles(&self, season: Option<Season>) -> Result<MemoryProfiles> {
        let mut profiles = MemoryProfiles::new();
        for team in self.list_team_profiles(season)? {
            profiles.insert_team(team);
        }
        for usage in self.list_usage(season)? {
            profiles.insert_usage(usage);
        }
        for efficiency in self.list_efficiency(season)? {
            profiles.insert_efficiency(efficiency);
        }
        for history in self.list_variance(season)? {
            profiles.insert_variance(history);
        }
        Ok(profiles)
    }
}
