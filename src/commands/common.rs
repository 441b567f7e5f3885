//! Common utilities and helper functions shared across commands.
//!
//! Every command loads the stored profiles and book into an engine and runs
//! one engine operation; mutating commands do so through
//! [`CommandContext::update`], which saves the book back.

use crate::{
    config::EngineConfig,
    engine::{models::ProjectionRecord, MemoryProfiles, ProjectionEngine},
    storage::ProjectionDatabase,
    Result, Season,
};
use serde::Serialize;
use std::path::Path;

pub type Engine = ProjectionEngine<MemoryProfiles>;

/// Context containing common resources needed by every command
pub struct CommandContext {
    pub db: ProjectionDatabase,
    pub config: EngineConfig,
}

impl CommandContext {
    /// Open the configured database and load the engine configuration
    pub fn new(config_path: Option<&Path>, db_path: Option<&Path>) -> Result<Self> {
        let config = EngineConfig::load(config_path)?;
        // tarpaulin::skip - file I/O, tested via integration tests
        let db = match db_path {
            Some(path) => ProjectionDatabase::open(path)?,
            None => ProjectionDatabase::new()?,
        };
        Ok(Self { db, config })
    }

    pub fn from_parts(db: ProjectionDatabase, config: EngineConfig) -> Self {
        Self { db, config }
    }

    /// Build an engine over stored profiles (one season, or all) and the saved book
    pub fn engine(&self, season: Option<Season>) -> Result<Engine> {
        let profiles = self.db.load_profiles(season)?;
        let book = self.db.load_book()?;
        Ok(ProjectionEngine::with_book(profiles, self.config.clone(), book))
    }

    /// Run a mutating engine operation over the latest stored book.
    ///
    /// The book is read, changed and written back inside one immediate
    /// transaction, so commands from concurrent processes apply one after
    /// the other rather than overwriting each other's records.
    pub fn update<T>(
        &mut self,
        season: Option<Season>,
        operation: impl FnOnce(&Engine) -> Result<T>,
    ) -> Result<(Engine, T)> {
        let profiles = self.db.load_profiles(season)?;
        let config = self.config.clone();
        self.db.update_book(|book| {
            let engine = ProjectionEngine::with_book(profiles, config, book);
            let output = operation(&engine)?;
            Ok((Some(engine.snapshot()), (engine, output)))
        })
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One-line text summary of a projection record
pub fn format_record(record: &ProjectionRecord) -> String {
    let s = &record.stats;
    let mut flags = String::new();
    if record.is_fill_player {
        flags.push_str(" [fill]");
    }
    if record.has_overrides {
        flags.push_str(" [override]");
    }
    format!(
        "{:>5}  {:<24} {:<3} {:<4} pass {:>6.1}/{:>7.1}y {:>4.1}td  rush {:>5.1}/{:>6.1}y  rec {:>5.1}/{:>6.1}y  {:>7.2} pts{}",
        record.id,
        record.name,
        record.position,
        record.team,
        s.pass_attempts,
        s.pass_yards,
        s.pass_tds,
        s.rush_attempts,
        s.rush_yards,
        s.receptions,
        s.rec_yards,
        s.fantasy_points,
        flags
    )
}

pub fn print_records(records: &[ProjectionRecord]) {
    for record in records {
        println!("{}", format_record(record));
    }
}
