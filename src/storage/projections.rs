//! Scenario, projection record and override log persistence

use super::schema::ProjectionDatabase;
use crate::engine::{
    models::{ProjectionRecord, Scenario, StatOverride, TeamVolume},
    scenario::{ProjectionBook, ScenarioSet},
    stats::{StatField, StatLine},
};
use crate::{OverrideId, PlayerId, Position, ProjectionId, ScenarioId, Season, TeamId};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::collections::BTreeMap;

impl ProjectionDatabase {
    /// Replace all stored engine state with `book` in one transaction.
    pub fn save_book(&mut self, book: &ProjectionBook) -> Result<()> {
        let tx = self.conn.transaction()?;
        Self::write_book(&tx, book)?;
        tx.commit()?;
        Ok(())
    }

    /// Load the book, hand it to `update` and write back what it returns,
    /// all under one `BEGIN IMMEDIATE` transaction.
    ///
    /// The write lock is held from the read onward, so a second process
    /// running the same sequence waits for this one to commit and then reads
    /// its result. `update` returning `None` leaves the stored book as is; an
    /// error rolls the transaction back.
    pub fn update_book<T, E>(
        &mut self,
        update: impl FnOnce(ProjectionBook) -> std::result::Result<(Option<ProjectionBook>, T), E>,
    ) -> std::result::Result<T, E>
    where
        E: From<anyhow::Error>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to lock the projection book for writing")?;
        let book = Self::read_book(&tx)?;
        let (updated, output) = update(book)?;
        if let Some(book) = updated {
            Self::write_book(&tx, &book)?;
        }
        tx.commit().context("Failed to commit the projection book")?;
        Ok(output)
    }

    fn write_book(tx: &Transaction<'_>, book: &ProjectionBook) -> Result<()> {
        tx.execute("DELETE FROM stat_overrides", [])?;
        tx.execute("DELETE FROM projections", [])?;
        tx.execute("DELETE FROM scenarios", [])?;

        for set in book.sets() {
            Self::insert_set(tx, set)?;
        }
        Ok(())
    }

    fn insert_set(tx: &Transaction<'_>, set: &ScenarioSet) -> Result<()> {
        let scenario = &set.scenario;
        tx.execute(
            "INSERT INTO scenarios
             (scenario_id, name, season, is_baseline, base_scenario_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                scenario.id.as_u64(),
                scenario.name,
                scenario.season.as_u16(),
                scenario.is_baseline,
                scenario.base_scenario_id.map(|id| id.as_u64()),
                scenario.created_at,
            ],
        )?;

        for record in set.records.values() {
            // Pairs rather than a map keep the column independent of key encoding
            let frozen: Vec<(StatField, f64)> =
                record.frozen.iter().map(|(f, v)| (*f, *v)).collect();
            tx.execute(
                "INSERT INTO projections
                 (projection_id, scenario_id, player_id, name, team, position, season,
                  games_in_season, team_pass_attempts, team_rush_attempts, team_targets,
                  team_sack_yards, stats, frozen, has_overrides, is_fill_player, fantasy_points)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    record.id.as_u64(),
                    scenario.id.as_u64(),
                    record.player_id.map(|id| id.as_u64()),
                    record.name,
                    record.team.as_str(),
                    record.position.as_str(),
                    record.season.as_u16(),
                    record.games_in_season,
                    record.volume.pass_attempts,
                    record.volume.rush_attempts,
                    record.volume.targets,
                    record.volume.sack_yards,
                    serde_json::to_string(&record.stats)?,
                    serde_json::to_string(&frozen)?,
                    record.has_overrides,
                    record.is_fill_player,
                    record.stats.fantasy_points,
                ],
            )?;
        }

        for entry in &set.overrides {
            tx.execute(
                "INSERT INTO stat_overrides
                 (override_id, projection_id, field, calculated_value, manual_value, notes,
                  created_at, cleared)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    entry.id.as_u64(),
                    entry.projection_id.as_u64(),
                    entry.field.as_str(),
                    entry.calculated_value,
                    entry.manual_value,
                    entry.notes,
                    entry.created_at,
                    entry.cleared,
                ],
            )?;
        }
        Ok(())
    }

    /// Load every scenario with its records and override log.
    pub fn load_book(&self) -> Result<ProjectionBook> {
        Self::read_book(&self.conn)
    }

    fn read_book(conn: &Connection) -> Result<ProjectionBook> {
        let mut sets: BTreeMap<ScenarioId, ScenarioSet> = BTreeMap::new();

        let mut stmt = conn.prepare(
            "SELECT scenario_id, name, season, is_baseline, base_scenario_id, created_at
             FROM scenarios ORDER BY scenario_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Scenario {
                id: ScenarioId::new(row.get(0)?),
                name: row.get(1)?,
                season: Season::new(row.get(2)?),
                is_baseline: row.get(3)?,
                base_scenario_id: row.get::<_, Option<u64>>(4)?.map(ScenarioId::new),
                created_at: row.get(5)?,
            })
        })?;
        for row in rows {
            let scenario = row?;
            sets.insert(scenario.id, ScenarioSet::new(scenario));
        }

        let mut stmt = conn.prepare(
            "SELECT projection_id, scenario_id, player_id, name, team, position, season,
                    games_in_season, team_pass_attempts, team_rush_attempts, team_targets,
                    team_sack_yards, stats, frozen, has_overrides, is_fill_player
             FROM projections ORDER BY projection_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, u64>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, Option<u64>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, u16>(6)?,
                row.get::<_, f64>(7)?,
                TeamVolume {
                    pass_attempts: row.get(8)?,
                    rush_attempts: row.get(9)?,
                    targets: row.get(10)?,
                    sack_yards: row.get(11)?,
                },
                row.get::<_, String>(12)?,
                row.get::<_, String>(13)?,
                row.get::<_, bool>(14)?,
                row.get::<_, bool>(15)?,
            ))
        })?;
        for row in rows {
            let (
                id,
                scenario_id,
                player_id,
                name,
                team,
                position,
                season,
                games_in_season,
                volume,
                stats,
                frozen,
                has_overrides,
                is_fill_player,
            ) = row?;
            let stats: StatLine = serde_json::from_str(&stats)
                .with_context(|| format!("Corrupt stat line on projection {id}"))?;
            let frozen: Vec<(StatField, f64)> = serde_json::from_str(&frozen)
                .with_context(|| format!("Corrupt frozen fields on projection {id}"))?;
            let record = ProjectionRecord {
                id: ProjectionId::new(id),
                scenario_id: ScenarioId::new(scenario_id),
                player_id: player_id.map(PlayerId::new),
                name,
                team: TeamId::new(team),
                position: position.parse::<Position>()?,
                season: Season::new(season),
                volume,
                games_in_season,
                stats,
                frozen: frozen.into_iter().collect(),
                has_overrides,
                is_fill_player,
            };
            let set = sets
                .get_mut(&record.scenario_id)
                .with_context(|| format!("Projection {id} references a missing scenario"))?;
            set.records.insert(record.id, record);
        }

        let mut stmt = conn.prepare(
            "SELECT o.override_id, o.projection_id, p.scenario_id, o.field, o.calculated_value,
                    o.manual_value, o.notes, o.created_at, o.cleared
             FROM stat_overrides o
             JOIN projections p ON p.projection_id = o.projection_id
             ORDER BY o.override_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, u64>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, u64>(7)?,
                row.get::<_, bool>(8)?,
            ))
        })?;
        for row in rows {
            let (id, projection_id, scenario_id, field, calculated, manual, notes, created_at, cleared) =
                row?;
            let entry = StatOverride {
                id: OverrideId::new(id),
                projection_id: ProjectionId::new(projection_id),
                field: field.parse()?,
                calculated_value: calculated,
                manual_value: manual,
                notes,
                created_at,
                cleared,
            };
            if let Some(set) = sets.get_mut(&ScenarioId::new(scenario_id)) {
                set.overrides.push(entry);
            }
        }

        Ok(ProjectionBook::from_sets(sets.into_values()))
    }
}
