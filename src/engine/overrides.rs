//! Manual overrides and the dependency cascade they trigger.
//!
//! Every function here takes the current record by reference and returns a new
//! one. Nothing is written back until the caller commits the outcome, so a
//! failure partway through a cascade leaves the stored record untouched.

use super::{
    calculator::{derive_field, recompute_all, recompute_field},
    dependency::dependents,
    models::{ProjectionRecord, StatOverride},
    stats::{StatField, StatKind},
};
use crate::{
    cli::types::OverrideId,
    error::{ProjectionError, Result},
};
use tracing::debug;

#[cfg(test)]
mod tests;

/// Result of applying or clearing one override.
#[derive(Debug, Clone)]
pub struct OverrideOutcome {
    pub record: ProjectionRecord,
    pub entry: StatOverride,
    /// Dependents recomputed, in order.
    pub recomputed: Vec<StatField>,
    /// Dependents left alone because they carry their own override.
    pub skipped: Vec<StatField>,
}

/// What the engine would hold for `field` if it were not overridden.
pub fn calculated_value(record: &ProjectionRecord, field: StatField) -> f64 {
    if field.is_derived() {
        derive_field(field, &record.stats, &record.volume, record.games_in_season)
            .unwrap_or_else(|| record.stats.get(field))
    } else {
        record
            .frozen
            .get(&field)
            .copied()
            .unwrap_or_else(|| record.stats.get(field))
    }
}

fn invalid(field: StatField, value: f64, reason: &str) -> ProjectionError {
    ProjectionError::InvalidOverrideValue {
        field: field.to_string(),
        value,
        reason: reason.to_string(),
    }
}

pub fn validate_manual_value(record: &ProjectionRecord, field: StatField, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(invalid(field, value, "not a finite number"));
    }
    match field.kind() {
        StatKind::Games if !(0.0..=record.games_in_season).contains(&value) => {
            Err(invalid(field, value, "games outside the season length"))
        }
        _ if field.is_fraction() && !(0.0..=1.0).contains(&value) => {
            Err(invalid(field, value, "fractions must be within [0, 1]"))
        }
        StatKind::Rate | StatKind::Count if value < 0.0 => {
            Err(invalid(field, value, "must not be negative"))
        }
        _ => Ok(()),
    }
}

/// Recompute everything downstream of `field`, then fantasy points.
///
/// Frozen dependents are skipped, never overwritten.
fn cascade(
    record: &mut ProjectionRecord,
    field: StatField,
) -> Result<(Vec<StatField>, Vec<StatField>)> {
    let mut order = dependents(field);
    if field != StatField::FantasyPoints && order.last() != Some(&StatField::FantasyPoints) {
        order.push(StatField::FantasyPoints);
    }

    let mut recomputed = Vec::new();
    let mut skipped = Vec::new();
    for dep in order {
        if record.is_frozen(dep) {
            debug!(projection = %record.id, field = %dep, "skipping overridden dependent");
            skipped.push(dep);
            continue;
        }
        recompute_field(dep, &mut record.stats, &record.volume, record.games_in_season)?;
        recomputed.push(dep);
    }
    Ok((recomputed, skipped))
}

/// Freeze `field` at `manual_value` and recompute its dependents.
pub fn apply_override(
    record: &ProjectionRecord,
    field: StatField,
    manual_value: f64,
    notes: Option<String>,
    entry_id: OverrideId,
    created_at: u64,
) -> Result<OverrideOutcome> {
    if record.is_fill_player {
        return Err(ProjectionError::FillPlayerOverride {
            id: record.id.as_u64(),
        });
    }
    validate_manual_value(record, field, manual_value)?;

    let calculated = calculated_value(record, field);
    let mut next = record.clone();
    next.stats.set(field, manual_value);
    next.frozen.insert(field, calculated);
    next.has_overrides = true;

    let (recomputed, skipped) = cascade(&mut next, field)?;

    let entry = StatOverride {
        id: entry_id,
        projection_id: record.id,
        field,
        calculated_value: calculated,
        manual_value,
        notes,
        created_at,
        cleared: false,
    };
    Ok(OverrideOutcome {
        record: next,
        entry,
        recomputed,
        skipped,
    })
}

/// Unfreeze `field`, restore its calculated value and cascade.
///
/// Returns `None` when the field carries no override.
pub fn clear_override(
    record: &ProjectionRecord,
    field: StatField,
    entry_id: OverrideId,
    created_at: u64,
) -> Result<Option<OverrideOutcome>> {
    if !record.is_frozen(field) {
        return Ok(None);
    }

    let manual_value = record.stats.get(field);
    let restored = calculated_value(record, field);
    let mut next = record.clone();
    next.frozen.remove(&field);
    next.stats.set(field, restored);
    next.has_overrides = !next.frozen.is_empty();

    let (recomputed, skipped) = cascade(&mut next, field)?;

    let entry = StatOverride {
        id: entry_id,
        projection_id: record.id,
        field,
        calculated_value: restored,
        manual_value,
        notes: None,
        created_at,
        cleared: true,
    };
    Ok(Some(OverrideOutcome {
        record: next,
        entry,
        recomputed,
        skipped,
    }))
}

/// Carry `previous`'s overrides onto a freshly calculated record.
///
/// Frozen fields are replayed in rank order so an overridden input is in place
/// before anything derived from it is frozen.
pub fn reapply_frozen(fresh: &mut ProjectionRecord, previous: &ProjectionRecord) -> Result<()> {
    for field in previous.frozen.keys() {
        let calculated = calculated_value(fresh, *field);
        fresh.stats.set(*field, previous.stats.get(*field));
        fresh.frozen.insert(*field, calculated);
        recompute_all(
            &mut fresh.stats,
            &fresh.volume,
            fresh.games_in_season,
            &fresh.frozen,
        )?;
    }
    fresh.has_overrides = !fresh.frozen.is_empty();
    Ok(())
}
