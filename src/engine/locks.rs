//! Mutual exclusion per (scenario, team, position) group.
//!
//! Overrides and fill reconciliation against the same group never interleave.
//! A scope holds one or more groups and releases them all when dropped.

use crate::cli::types::{Position, ScenarioId, TeamId};
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;


#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub scenario: ScenarioId,
    pub team: TeamId,
    pub position: Position,
}

impl GroupKey {
    pub fn new(scenario: ScenarioId, team: TeamId, position: Position) -> Self {
        Self {
            scenario,
            team,
            position,
        }
    }
}

#[derive(Debug, Default)]
pub struct GroupLocks {
    held: Mutex<HashSet<GroupKey>>,
    released: Condvar,
}

impl GroupLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until every key is free, then take them all at once.
    ///
    /// The whole set is taken atomically, so two scopes over overlapping
    /// groups cannot deadlock on acquisition order.
    pub fn acquire(&self, keys: impl IntoIterator<Item = GroupKey>) -> GroupScope<'_> {
        let keys = sorted_keys(keys);
        let mut held = self.held.lock();
        while keys.iter().any(|k| held.contains(k)) {
            self.released.wait(&mut held);
        }
        held.extend(keys.iter().cloned());
        GroupScope { locks: self, keys }
    }

    fn release(&self, keys: &[GroupKey]) {
        let mut held = self.held.lock();
        for key in keys {
            held.remove(key);
        }
        drop(held);
        self.released.notify_all();
    }
}

#[cfg(test)]
impl GroupLocks {
    /// Take the keys only if none is currently held.
    fn try_acquire(&self, keys: impl IntoIterator<Item = GroupKey>) -> Option<GroupScope<'_>> {
        let keys = sorted_keys(keys);
        let mut held = self.held.lock();
        if keys.iter().any(|k| held.contains(k)) {
            return None;
        }
        held.extend(keys.iter().cloned());
        Some(GroupScope { locks: self, keys })
    }

    fn is_held(&self, key: &GroupKey) -> bool {
        self.held.lock().contains(key)
    }
}

fn sorted_keys(keys: impl IntoIterator<Item = GroupKey>) -> Vec<GroupKey> {
    let mut keys: Vec<GroupKey> = keys.into_iter().collect();
    keys.sort();
    keys.dedup();
    keys
}

/// Exclusive hold on a set of groups; released on drop.
#[derive(Debug)]
pub struct GroupScope<'a> {
    locks: &'a GroupLocks,
    keys: Vec<GroupKey>,
}

#[cfg(test)]
impl GroupScope<'_> {
    fn covers(&self, key: &GroupKey) -> bool {
        self.keys.binary_search(key).is_ok()
    }

    fn keys(&self) -> &[GroupKey] {
        &self.keys
    }
}

impl Drop for GroupScope<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.keys);
    }
}
