//! Projection Consistency Engine.
//!
//! [`ProjectionEngine`] is the service the CLI (or any other caller) talks
//! to. Profiles come in through a [`ProfileSource`]; scenarios, records and
//! override logs live in a [`ProjectionBook`] held behind a read/write lock.
//!
//! Every mutation follows the same shape: take the group scope for the
//! affected (scenario, team, position) groups, snapshot what it needs under
//! the read lock, compute the new values on copies, then commit them in one
//! write-locked step. A failed computation never reaches the book.

pub mod calculator;
pub mod dependency;
pub mod fill;
pub mod locks;
pub mod models;
pub mod overrides;
pub mod regression;
pub mod scenario;
pub mod stats;
pub mod team;
pub mod variance;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::{
    cli::types::{PlayerId, Position, ProjectionId, ScenarioId, Season, TeamId},
    config::EngineConfig,
    error::{ProjectionError, Result},
};
use calculator::ProjectionCalculator;
use fill::{verify_totals, CategoryCheck, FillGroup, FillReconciler, Reconciliation};
use locks::{GroupKey, GroupLocks};
use models::{
    now_secs, HistoricalVariance, PlayerEfficiencyProfile, PlayerUsageProfile, ProjectionRecord,
    Scenario, StatOverride, TeamSeasonProfile,
};
use overrides::OverrideOutcome;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rayon::prelude::*;
use scenario::ProjectionBook;
use serde::Serialize;
use stats::StatField;
use std::collections::{BTreeMap, HashMap};
use team::{resolve_team_totals, TeamTotals};
use variance::{ConfidenceLevel, VarianceEstimate, VarianceEstimator};

/// Ingestion contract: where team and player inputs come from.
pub trait ProfileSource: Send + Sync {
    fn team_profile(&self, team: &TeamId, season: Season) -> Result<Option<TeamSeasonProfile>>;

    /// Every player with a share of `team`'s volume in `season`.
    fn usage_profiles(&self, team: &TeamId, season: Season) -> Result<Vec<PlayerUsageProfile>>;

    fn efficiency_profile(
        &self,
        player: PlayerId,
        season: Season,
    ) -> Result<Option<PlayerEfficiencyProfile>>;

    fn variance_history(
        &self,
        player: PlayerId,
        season: Season,
    ) -> Result<Option<HistoricalVariance>>;
}

/// Profiles held in memory, keyed the way the ingestion contract keys them.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfiles {
    teams: HashMap<(TeamId, Season), TeamSeasonProfile>,
    usage: HashMap<(TeamId, Season), Vec<PlayerUsageProfile>>,
    efficiency: HashMap<(PlayerId, Season), PlayerEfficiencyProfile>,
    variance: HashMap<(PlayerId, Season), HistoricalVariance>,
}

impl MemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_team(&mut self, profile: TeamSeasonProfile) {
        self.teams
            .insert((profile.team.clone(), profile.season), profile);
    }

    /// Insert or replace a player's usage for their team and season.
    pub fn insert_usage(&mut self, profile: PlayerUsageProfile) {
        let roster = self
            .usage
            .entry((profile.team.clone(), profile.season))
            .or_default();
        roster.retain(|u| u.player_id != profile.player_id);
        roster.push(profile);
    }

    pub fn insert_efficiency(&mut self, profile: PlayerEfficiencyProfile) {
        self.efficiency
            .insert((profile.player_id, profile.season), profile);
    }

    pub fn insert_variance(&mut self, history: HistoricalVariance) {
        self.variance
            .insert((history.player_id, history.season), history);
    }
}

impl ProfileSource for MemoryProfiles {
    fn team_profile(&self, team: &TeamId, season: Season) -> Result<Option<TeamSeasonProfile>> {
        Ok(self.teams.get(&(team.clone(), season)).cloned())
    }

    fn usage_profiles(&self, team: &TeamId, season: Season) -> Result<Vec<PlayerUsageProfile>> {
        let mut roster = self
            .usage
            .get(&(team.clone(), season))
            .cloned()
            .unwrap_or_default();
        roster.sort_by_key(|u| u.player_id);
        Ok(roster)
    }

    fn efficiency_profile(
        &self,
        player: PlayerId,
        season: Season,
    ) -> Result<Option<PlayerEfficiencyProfile>> {
        Ok(self.efficiency.get(&(player, season)).cloned())
    }

    fn variance_history(
        &self,
        player: PlayerId,
        season: Season,
    ) -> Result<Option<HistoricalVariance>> {
        Ok(self.variance.get(&(player, season)).cloned())
    }
}

/// Team totals against everything projected for the team in one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamReport {
    pub team: TeamId,
    pub season: Season,
    pub scenario_id: ScenarioId,
    pub records: usize,
    pub fill_players: usize,
    pub checks: Vec<CategoryCheck>,
}

impl TeamReport {
    pub fn is_consistent(&self, epsilon: f64) -> bool {
        self.checks.iter().all(|c| c.residual.abs() <= epsilon)
    }
}

/// What a group needs to be reconciled: totals, the real players as they
/// will be after the pending change, and the identity for a new fill.
struct FillPlan {
    key: GroupKey,
    season: Season,
    totals: TeamTotals,
    players: Vec<ProjectionRecord>,
    existing_fill: Option<ProjectionRecord>,
    fill_id: ProjectionId,
}

pub struct ProjectionEngine<S: ProfileSource> {
    source: S,
    config: EngineConfig,
    book: RwLock<ProjectionBook>,
    locks: GroupLocks,
}

impl<S: ProfileSource> ProjectionEngine<S> {
    pub fn new(source: S, config: EngineConfig) -> Self {
        Self::with_book(source, config, ProjectionBook::new())
    }

    /// Resume from a previously saved book.
    pub fn with_book(source: S, config: EngineConfig, book: ProjectionBook) -> Self {
        Self {
            source,
            config,
            book: RwLock::new(book),
            locks: GroupLocks::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, ProjectionBook> {
        self.book.read()
    }

    fn write(&self) -> RwLockWriteGuard<'_, ProjectionBook> {
        self.book.write()
    }

    /// Copy of the whole book, e.g. for persistence.
    pub fn snapshot(&self) -> ProjectionBook {
        self.read().clone()
    }

    pub fn record(&self, id: ProjectionId) -> Result<ProjectionRecord> {
        self.read().find_record(id).cloned()
    }

    pub fn scenario_records(&self, id: ScenarioId) -> Result<Vec<ProjectionRecord>> {
        Ok(self.read().scenario(id)?.records.values().cloned().collect())
    }

    /// The full override log of one record, oldest first.
    pub fn override_history(&self, id: ProjectionId) -> Result<Vec<StatOverride>> {
        let book = self.read();
        let record = book.find_record(id)?;
        let set = book.scenario(record.scenario_id)?;
        Ok(set.overrides_for(id).cloned().collect())
    }

    pub fn baseline_id(&self, season: Season) -> Result<ScenarioId> {
        self.read()
            .baseline(season)
            .map(|s| s.id())
            .ok_or(ProjectionError::NoBaseline {
                season: season.as_u16(),
            })
    }

    fn resolve_scenario(&self, season: Season, scenario: Option<ScenarioId>) -> Result<ScenarioId> {
        match scenario {
            Some(id) => {
                self.read().scenario(id)?;
                Ok(id)
            }
            None => self.baseline_id(season),
        }
    }

    fn team_totals(&self, team: &TeamId, season: Season) -> Result<TeamTotals> {
        let profile = self.source.team_profile(team, season)?.ok_or_else(|| {
            ProjectionError::TeamProfileNotFound {
                team: team.to_string(),
                season: season.as_u16(),
            }
        })?;
        resolve_team_totals(&profile)
    }

    /// Project every player of `team` into the baseline scenario and
    /// reconcile all four position groups.
    ///
    /// Re-running it rebuilds calculated values from the current profiles and
    /// replays the overrides already on each player's record.
    pub fn compute_baseline(&self, team: &TeamId, season: Season) -> Result<Vec<ProjectionRecord>> {
        let totals = self.team_totals(team, season)?;
        let usages = self.source.usage_profiles(team, season)?;
        let calc = ProjectionCalculator::new(&self.config);
        calc.validate_shares(team, &usages)?;

        let mut inputs = Vec::with_capacity(usages.len());
        for usage in usages {
            let efficiency = self.source.efficiency_profile(usage.player_id, season)?;
            inputs.push((usage, efficiency));
        }

        let scenario_id = self.write().ensure_baseline(season);
        let _scope = self.locks.acquire(
            Position::ALL.map(|p| GroupKey::new(scenario_id, team.clone(), p)),
        );

        // Identities and prior records under one write lock
        let (jobs, kept, mut fills) = {
            let mut book = self.write();
            let set = book.scenario(scenario_id)?;
            let mut previous: HashMap<PlayerId, ProjectionRecord> = HashMap::new();
            let mut fills: HashMap<Position, ProjectionRecord> = HashMap::new();
            for record in set.team_records(team, season) {
                match record.player_id {
                    Some(player) if !record.is_fill_player => {
                        previous.insert(player, record.clone());
                    }
                    _ => {
                        fills.insert(record.position, record.clone());
                    }
                }
            }

            let mut jobs = Vec::with_capacity(inputs.len());
            for (usage, efficiency) in inputs {
                let prior = previous.remove(&usage.player_id);
                let id = match &prior {
                    Some(p) => p.id,
                    None => book.allocate_projection_id(),
                };
                jobs.push((usage, efficiency, id, prior));
            }
            // Players without a usage profile this time keep their records
            let kept: Vec<ProjectionRecord> = previous.into_values().collect();
            (jobs, kept, fills)
        };

        let fresh: Vec<ProjectionRecord> = jobs
            .into_par_iter()
            .map(|(usage, efficiency, id, prior)| -> Result<ProjectionRecord> {
                let mut record = calc.project(id, scenario_id, &totals, &usage, efficiency.as_ref())?;
                if let Some(prior) = prior {
                    overrides::reapply_frozen(&mut record, &prior)?;
                }
                Ok(record)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut plans = Vec::with_capacity(Position::ALL.len());
        {
            let mut book = self.write();
            for position in Position::ALL {
                let existing_fill = fills.remove(&position);
                let fill_id = match &existing_fill {
                    Some(f) => f.id,
                    None => book.allocate_projection_id(),
                };
                let players = fresh
                    .iter()
                    .chain(kept.iter())
                    .filter(|r| r.position == position)
                    .cloned()
                    .collect();
                plans.push(FillPlan {
                    key: GroupKey::new(scenario_id, team.clone(), position),
                    season,
                    totals,
                    players,
                    existing_fill,
                    fill_id,
                });
            }
        }
        let reconciliations: Vec<Reconciliation> =
            plans.iter().map(|plan| self.reconcile_plan(plan)).collect();

        {
            let mut book = self.write();
            let set = book.scenario_mut(scenario_id)?;
            for record in &fresh {
                set.records.insert(record.id, record.clone());
            }
            for result in &reconciliations {
                set.set_fill(team, result.position, season, result.fill.clone());
            }
        }

        let mut published = fresh;
        published.extend(reconciliations.into_iter().filter_map(|r| r.fill));
        published.sort_by_key(|r| (r.position, r.is_fill_player, r.id));
        tracing::info!(
            "Computed baseline for {} {}: {} records in scenario {}",
            team,
            season,
            published.len(),
            scenario_id
        );
        Ok(published)
    }

    fn reconcile_plan(&self, plan: &FillPlan) -> Reconciliation {
        let reconciler = FillReconciler::new(&self.config.fill, self.config.games_in_season);
        let players: Vec<&ProjectionRecord> = plan.players.iter().collect();
        let result = reconciler.reconcile(
            &plan.totals,
            FillGroup {
                scenario_id: plan.key.scenario,
                team: &plan.key.team,
                position: plan.key.position,
                season: plan.season,
            },
            &players,
            plan.existing_fill.as_ref(),
            plan.fill_id,
        );
        for inconsistency in &result.inconsistencies {
            tracing::warn!("{}", inconsistency.to_error());
        }
        result
    }

    /// Snapshot one group with `changed` standing in for its stored copy.
    ///
    /// Returns `None` when the team has no profile to reconcile against.
    fn plan_group(
        &self,
        key: &GroupKey,
        season: Season,
        changed: Option<&ProjectionRecord>,
    ) -> Result<Option<FillPlan>> {
        let Some(profile) = self.source.team_profile(&key.team, season)? else {
            tracing::debug!("No team profile for {} {}, skipping fill", key.team, season);
            return Ok(None);
        };
        let totals = resolve_team_totals(&profile)?;

        let mut book = self.write();
        let set = book.scenario(key.scenario)?;
        let players: Vec<ProjectionRecord> = set
            .real_players(&key.team, key.position, season)
            .into_iter()
            .map(|r| match changed {
                Some(c) if c.id == r.id => c.clone(),
                _ => r.clone(),
            })
            .collect();
        let existing_fill = set.fill_player(&key.team, key.position, season).cloned();
        let fill_id = match &existing_fill {
            Some(f) => f.id,
            None => book.allocate_projection_id(),
        };
        Ok(Some(FillPlan {
            key: key.clone(),
            season,
            totals,
            players,
            existing_fill,
            fill_id,
        }))
    }

    /// Commit an override outcome together with its group's new fill record.
    fn commit_outcome(
        &self,
        key: &GroupKey,
        outcome: &OverrideOutcome,
        reconciliation: Option<&Reconciliation>,
    ) -> Result<()> {
        let mut book = self.write();
        let set = book.scenario_mut(key.scenario)?;
        if !set.records.contains_key(&outcome.record.id) {
            return Err(ProjectionError::ProjectionNotFound {
                id: outcome.record.id.as_u64(),
            });
        }
        set.records.insert(outcome.record.id, outcome.record.clone());
        set.overrides.push(outcome.entry.clone());
        if let Some(result) = reconciliation {
            set.set_fill(&key.team, key.position, outcome.record.season, result.fill.clone());
        }
        Ok(())
    }

    fn group_of(&self, id: ProjectionId) -> Result<GroupKey> {
        let book = self.read();
        let record = book.find_record(id)?;
        Ok(GroupKey::new(
            record.scenario_id,
            record.team.clone(),
            record.position,
        ))
    }

    /// Freeze `stat_name` on a record at `manual_value`, cascade to its
    /// dependents and re-reconcile the record's group.
    pub fn apply_override(
        &self,
        projection_id: ProjectionId,
        stat_name: &str,
        manual_value: f64,
        notes: Option<String>,
    ) -> Result<ProjectionRecord> {
        let field: StatField = stat_name.parse()?;
        let key = self.group_of(projection_id)?;
        let _scope = self.locks.acquire([key.clone()]);

        let (record, entry_id) = {
            let mut book = self.write();
            let record = book.find_record(projection_id)?.clone();
            (record, book.allocate_override_id())
        };

        let outcome = overrides::apply_override(
            &record,
            field,
            manual_value,
            notes,
            entry_id,
            now_secs(),
        )?;
        if !outcome.skipped.is_empty() {
            tracing::warn!(
                "Override of {} on projection {} left overridden dependents untouched: {:?}",
                field,
                projection_id,
                outcome.skipped
            );
        }

        let reconciliation = self
            .plan_group(&key, record.season, Some(&outcome.record))?
            .map(|plan| self.reconcile_plan(&plan));
        self.commit_outcome(&key, &outcome, reconciliation.as_ref())?;

        tracing::debug!(
            "Override {} = {} on projection {} recomputed {:?}",
            field,
            manual_value,
            projection_id,
            outcome.recomputed
        );
        Ok(outcome.record)
    }

    /// Remove the override on `stat_name`, restoring the calculated value.
    ///
    /// Returns `None` when the field was not overridden.
    pub fn clear_override(
        &self,
        projection_id: ProjectionId,
        stat_name: &str,
    ) -> Result<Option<ProjectionRecord>> {
        let field: StatField = stat_name.parse()?;
        let key = self.group_of(projection_id)?;
        let _scope = self.locks.acquire([key.clone()]);

        let record = self.record(projection_id)?;
        if !record.is_frozen(field) {
            return Ok(None);
        }
        let entry_id = self.write().allocate_override_id();
        let Some(outcome) = overrides::clear_override(&record, field, entry_id, now_secs())? else {
            return Ok(None);
        };

        let reconciliation = self
            .plan_group(&key, record.season, Some(&outcome.record))?
            .map(|plan| self.reconcile_plan(&plan));
        self.commit_outcome(&key, &outcome, reconciliation.as_ref())?;

        tracing::debug!("Cleared override of {} on projection {}", field, projection_id);
        Ok(Some(outcome.record))
    }

    /// Reconcile one group, reporting residuals and any over-allocation.
    pub fn reconcile_group(
        &self,
        team: &TeamId,
        position: Position,
        season: Season,
        scenario: Option<ScenarioId>,
    ) -> Result<Reconciliation> {
        let scenario_id = self.resolve_scenario(season, scenario)?;
        // Fail on a missing profile rather than silently skipping
        self.team_totals(team, season)?;

        let key = GroupKey::new(scenario_id, team.clone(), position);
        let _scope = self.locks.acquire([key.clone()]);

        let Some(plan) = self.plan_group(&key, season, None)? else {
            return Err(ProjectionError::TeamProfileNotFound {
                team: team.to_string(),
                season: season.as_u16(),
            });
        };
        let result = self.reconcile_plan(&plan);
        self.write()
            .scenario_mut(scenario_id)?
            .set_fill(team, position, season, result.fill.clone());
        Ok(result)
    }

    /// Reconcile one group and return its fill record, if one is needed.
    pub fn reconcile_fill_players(
        &self,
        team: &TeamId,
        position: Position,
        season: Season,
        scenario: Option<ScenarioId>,
    ) -> Result<Option<ProjectionRecord>> {
        Ok(self.reconcile_group(team, position, season, scenario)?.fill)
    }

    /// Deep-copy a scenario, records and override history included.
    pub fn clone_scenario(&self, source: ScenarioId, name: &str) -> Result<Scenario> {
        // Commits are atomic under the write lock, so this copy is consistent
        let snapshot = self.read().scenario(source)?.clone();
        let scenario = self.write().branch(&snapshot, name, now_secs());
        tracing::info!(
            "Cloned scenario {} into {} ({}) with {} records",
            source,
            scenario.id,
            scenario.name,
            snapshot.records.len()
        );
        Ok(scenario)
    }

    pub fn list_scenarios(&self, season: Option<Season>) -> Vec<Scenario> {
        self.read()
            .scenarios()
            .filter(|s| season.map_or(true, |season| s.season == season))
            .cloned()
            .collect()
    }

    /// Delete a non-baseline scenario once no group in it is mid-mutation.
    pub fn delete_scenario(&self, id: ScenarioId) -> Result<Scenario> {
        let keys: Vec<GroupKey> = {
            let book = self.read();
            let set = book.scenario(id)?;
            if set.scenario.is_baseline {
                return Err(ProjectionError::BaselineScenario { id: id.as_u64() });
            }
            set.records
                .values()
                .map(|r| GroupKey::new(id, r.team.clone(), r.position))
                .collect()
        };
        let _scope = self.locks.acquire(keys);
        let removed = self.write().delete(id)?;
        tracing::info!(
            "Deleted scenario {} ({} records, {} override rows)",
            id,
            removed.records.len(),
            removed.overrides.len()
        );
        Ok(removed.scenario)
    }

    /// Confidence bounds for a record at `confidence_level` (0.50/0.80/0.90/0.95).
    pub fn get_variance_estimate(
        &self,
        projection_id: ProjectionId,
        confidence_level: f64,
    ) -> Result<VarianceEstimate> {
        let level = ConfidenceLevel::try_from(confidence_level)?;
        let record = self.record(projection_id)?;

        let (history, years) = match record.player_id {
            Some(player) => {
                let history = self.source.variance_history(player, record.season)?;
                let years = self
                    .source
                    .efficiency_profile(player, record.season)?
                    .map(|e| e.years_of_history())
                    .unwrap_or(0);
                (history, years)
            }
            None => (None, 0),
        };

        Ok(VarianceEstimator::new(&self.config.variance).estimate(
            &record,
            history.as_ref(),
            years,
            level,
        ))
    }

    /// Compare team totals with every record of the team in a scenario.
    pub fn verify_team(
        &self,
        team: &TeamId,
        season: Season,
        scenario: Option<ScenarioId>,
    ) -> Result<TeamReport> {
        let scenario_id = self.resolve_scenario(season, scenario)?;
        let totals = self.team_totals(team, season)?;

        let book = self.read();
        let records: Vec<&ProjectionRecord> =
            book.scenario(scenario_id)?.team_records(team, season).collect();
        Ok(TeamReport {
            team: team.clone(),
            season,
            scenario_id,
            records: records.len(),
            fill_players: records.iter().filter(|r| r.is_fill_player).count(),
            checks: verify_totals(&totals, &records),
        })
    }

    /// Latest override per field for a record, cleared fields excluded.
    pub fn active_overrides(&self, projection_id: ProjectionId) -> Result<BTreeMap<StatField, StatOverride>> {
        let book = self.read();
        let record = book.find_record(projection_id)?;
        Ok(book
            .scenario(record.scenario_id)?
            .active_overrides(projection_id)
            .into_iter()
            .map(|(field, entry)| (field, entry.clone()))
            .collect())
    }
}
