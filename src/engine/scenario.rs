//! Scenarios as explicit aggregates and the book that owns them.
//!
//! A [`ScenarioSet`] is one scenario plus every record and override log row it
//! owns. Nothing is shared between sets, so branching is a structural deep
//! copy with fresh identities.

use super::{
    models::{now_secs, ProjectionRecord, Scenario, StatOverride},
    stats::StatField,
};
use crate::{
    cli::types::{OverrideId, Position, ProjectionId, ScenarioId, Season, TeamId},
    error::{ProjectionError, Result},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSet {
    pub scenario: Scenario,
    pub records: BTreeMap<ProjectionId, ProjectionRecord>,
    /// Append-only; a `cleared` row unfreezes its field.
    pub overrides: Vec<StatOverride>,
}

impl ScenarioSet {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            records: BTreeMap::new(),
            overrides: Vec::new(),
        }
    }

    pub fn id(&self) -> ScenarioId {
        self.scenario.id
    }

    pub fn team_records<'a>(
        &'a self,
        team: &'a TeamId,
        season: Season,
    ) -> impl Iterator<Item = &'a ProjectionRecord> + 'a {
        self.records
            .values()
            .filter(move |r| &r.team == team && r.season == season)
    }

    /// Real (non-fill) players of one team/position group.
    pub fn real_players<'a>(
        &'a self,
        team: &'a TeamId,
        position: Position,
        season: Season,
    ) -> Vec<&'a ProjectionRecord> {
        self.team_records(team, season)
            .filter(|r| r.position == position && !r.is_fill_player)
            .collect()
    }

    pub fn fill_player<'a>(
        &'a self,
        team: &'a TeamId,
        position: Position,
        season: Season,
    ) -> Option<&'a ProjectionRecord> {
        self.team_records(team, season)
            .find(|r| r.position == position && r.is_fill_player)
    }

    pub fn overrides_for(&self, id: ProjectionId) -> impl Iterator<Item = &StatOverride> {
        self.overrides.iter().filter(move |o| o.projection_id == id)
    }

    /// Latest log row per field, with cleared fields dropped.
    pub fn active_overrides(&self, id: ProjectionId) -> BTreeMap<StatField, &StatOverride> {
        let mut latest: BTreeMap<StatField, &StatOverride> = BTreeMap::new();
        for entry in self.overrides_for(id) {
            latest.insert(entry.field, entry);
        }
        latest.retain(|_, entry| !entry.cleared);
        latest
    }

    /// Replace (or insert) the fill record of a group, removing it when `fill` is `None`.
    pub fn set_fill(
        &mut self,
        team: &TeamId,
        position: Position,
        season: Season,
        fill: Option<ProjectionRecord>,
    ) {
        self.records.retain(|_, r| {
            !(r.is_fill_player && &r.team == team && r.position == position && r.season == season)
        });
        if let Some(fill) = fill {
            self.records.insert(fill.id, fill);
        }
    }
}

/// Every scenario held by the engine, plus the identity sequences.
///
/// Identities behave like database sequences: once allocated they are never
/// reused, even if the operation that took them fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectionBook {
    scenarios: BTreeMap<ScenarioId, ScenarioSet>,
    last_scenario_id: u64,
    last_projection_id: u64,
    last_override_id: u64,
}

impl ProjectionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a book from stored sets; sequences resume past the highest id.
    pub fn from_sets(sets: impl IntoIterator<Item = ScenarioSet>) -> Self {
        let mut book = Self::default();
        for set in sets {
            book.insert_set(set);
        }
        book
    }

    fn insert_set(&mut self, set: ScenarioSet) {
        self.last_scenario_id = self.last_scenario_id.max(set.id().as_u64());
        if let Some(max) = set.records.keys().next_back() {
            self.last_projection_id = self.last_projection_id.max(max.as_u64());
        }
        if let Some(max) = set.overrides.iter().map(|o| o.id.as_u64()).max() {
            self.last_override_id = self.last_override_id.max(max);
        }
        self.scenarios.insert(set.id(), set);
    }

    pub fn allocate_scenario_id(&mut self) -> ScenarioId {
        self.last_scenario_id += 1;
        ScenarioId::new(self.last_scenario_id)
    }

    pub fn allocate_projection_id(&mut self) -> ProjectionId {
        self.last_projection_id += 1;
        ProjectionId::new(self.last_projection_id)
    }

    pub fn allocate_override_id(&mut self) -> OverrideId {
        self.last_override_id += 1;
        OverrideId::new(self.last_override_id)
    }

    pub fn sets(&self) -> impl Iterator<Item = &ScenarioSet> {
        self.scenarios.values()
    }

    pub fn scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.values().map(|s| &s.scenario)
    }

    pub fn scenario(&self, id: ScenarioId) -> Result<&ScenarioSet> {
        self.scenarios
            .get(&id)
            .ok_or(ProjectionError::ScenarioNotFound { id: id.as_u64() })
    }

    pub fn scenario_mut(&mut self, id: ScenarioId) -> Result<&mut ScenarioSet> {
        self.scenarios
            .get_mut(&id)
            .ok_or(ProjectionError::ScenarioNotFound { id: id.as_u64() })
    }

    pub fn baseline(&self, season: Season) -> Option<&ScenarioSet> {
        self.scenarios
            .values()
            .find(|s| s.scenario.is_baseline && s.scenario.season == season)
    }

    /// The baseline scenario for `season`, created on first use.
    pub fn ensure_baseline(&mut self, season: Season) -> ScenarioId {
        if let Some(existing) = self.baseline(season) {
            return existing.id();
        }
        let id = self.allocate_scenario_id();
        let scenario = Scenario {
            id,
            name: format!("Baseline {season}"),
            season,
            is_baseline: true,
            base_scenario_id: None,
            created_at: now_secs(),
        };
        self.scenarios.insert(id, ScenarioSet::new(scenario));
        id
    }

    pub fn find_record(&self, id: ProjectionId) -> Result<&ProjectionRecord> {
        self.scenarios
            .values()
            .find_map(|s| s.records.get(&id))
            .ok_or(ProjectionError::ProjectionNotFound { id: id.as_u64() })
    }

    /// Branch a snapshot of a scenario into a new, independent scenario.
    ///
    /// Every record and override row gets a new identity; override rows are
    /// re-pointed at the copied records. Field values and history are kept.
    pub fn branch(&mut self, source: &ScenarioSet, name: &str, created_at: u64) -> Scenario {
        let id = self.allocate_scenario_id();
        let scenario = Scenario {
            id,
            name: name.to_string(),
            season: source.scenario.season,
            is_baseline: false,
            base_scenario_id: Some(source.id()),
            created_at,
        };

        let mut remap: HashMap<ProjectionId, ProjectionId> = HashMap::new();
        let mut records = BTreeMap::new();
        for (old_id, record) in &source.records {
            let new_id = self.allocate_projection_id();
            remap.insert(*old_id, new_id);
            let mut copy = record.clone();
            copy.id = new_id;
            copy.scenario_id = id;
            records.insert(new_id, copy);
        }

        let mut overrides = Vec::with_capacity(source.overrides.len());
        for entry in &source.overrides {
            // Rows for records that no longer exist have nothing to point at
            let Some(projection_id) = remap.get(&entry.projection_id) else {
                continue;
            };
            let mut copy = entry.clone();
            copy.id = self.allocate_override_id();
            copy.projection_id = *projection_id;
            overrides.push(copy);
        }

        self.scenarios.insert(
            id,
            ScenarioSet {
                scenario: scenario.clone(),
                records,
                overrides,
            },
        );
        scenario
    }

    /// Remove a scenario and everything it owns. The baseline is permanent.
    pub fn delete(&mut self, id: ScenarioId) -> Result<ScenarioSet> {
        let set = self.scenario(id)?;
        if set.scenario.is_baseline {
            return Err(ProjectionError::BaselineScenario { id: id.as_u64() });
        }
        self.scenarios
            .remove(&id)
            .ok_or(ProjectionError::ScenarioNotFound { id: id.as_u64() })
    }
}
