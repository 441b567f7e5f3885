//! Fixed dependency graph between stat fields.
//!
//! `DIRECT` lists, for every field, the fields computed straight from it.
//! Recalculation after an override walks the transitive closure in rank
//! order, which [`StatField`] declaration order makes topological.

use super::stats::StatField;
use std::collections::BTreeSet;

#[cfg(test)]
mod tests;

use StatField::*;

/// Field → fields whose formula reads it.
pub const DIRECT: &[(StatField, &[StatField])] = &[
    (Games, &[PassAttempts, RushAttempts, Targets]),
    (PassShare, &[PassAttempts]),
    (RushShare, &[RushAttempts]),
    (TargetShare, &[Targets]),
    (CompletionPct, &[Completions]),
    (YardsPerAttempt, &[GrossPassYards]),
    (PassTdRate, &[PassTds]),
    (IntRate, &[Interceptions]),
    (YardsPerCarry, &[GrossRushYards]),
    (RushTdRate, &[RushTds]),
    (FumbleRate, &[RushYards, FumblesLost]),
    (CatchRate, &[Receptions]),
    (YardsPerReception, &[RecYards]),
    (RecTdRate, &[RecTds]),
    (PassAttempts, &[Completions, GrossPassYards, PassYards, PassTds, Interceptions]),
    (RushAttempts, &[GrossRushYards, RushTds, FumblesLost]),
    (Targets, &[Receptions, RecTds]),
    (Completions, &[]),
    (GrossPassYards, &[PassYards]),
    (PassYards, &[FantasyPoints]),
    (PassTds, &[FantasyPoints]),
    (Interceptions, &[FantasyPoints]),
    (GrossRushYards, &[RushYards]),
    (RushYards, &[FantasyPoints]),
    (RushTds, &[FantasyPoints]),
    (FumblesLost, &[FantasyPoints]),
    (Receptions, &[RecYards, FantasyPoints]),
    (RecYards, &[FantasyPoints]),
    (RecTds, &[FantasyPoints]),
    (FantasyPoints, &[]),
];

pub fn direct_dependents(field: StatField) -> &'static [StatField] {
    DIRECT
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, deps)| *deps)
        .unwrap_or(&[])
}

/// Every field that must be recomputed when `field` changes, in recompute order.
///
/// Does not include `field` itself.
pub fn dependents(field: StatField) -> Vec<StatField> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![field];
    while let Some(current) = stack.pop() {
        for dep in direct_dependents(current) {
            if seen.insert(*dep) {
                stack.push(*dep);
            }
        }
    }
    // BTreeSet orders by declaration, i.e. by rank
    seen.into_iter().collect()
}
