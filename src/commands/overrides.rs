//! Override and clear-override command implementations

use super::common::{format_record, print_json, CommandContext};
use crate::{ProjectionId, Result};

/// Handle the override command
pub fn handle_override(
    ctx: &mut CommandContext,
    projection: ProjectionId,
    stat: &str,
    value: f64,
    notes: Option<String>,
    as_json: bool,
) -> Result<()> {
    let (engine, record) = ctx.update(None, |engine| {
        engine.apply_override(projection, stat, value, notes)
    })?;

    if as_json {
        return print_json(&record);
    }

    println!("✓ Override {} = {} on projection {}", stat, value, projection);
    println!("{}", format_record(&record));
    for (field, entry) in engine.active_overrides(projection)? {
        println!(
            "  {:<18} {:>10.3} (calculated {:.3})",
            field.as_str(),
            entry.manual_value,
            entry.calculated_value
        );
    }
    Ok(())
}

/// Handle the clear-override command
pub fn handle_clear_override(
    ctx: &mut CommandContext,
    projection: ProjectionId,
    stat: &str,
    as_json: bool,
) -> Result<()> {
    let (_, cleared) = ctx.update(None, |engine| engine.clear_override(projection, stat))?;

    if as_json {
        return print_json(&cleared);
    }

    match cleared {
        Some(record) => {
            println!("✓ Cleared override of {} on projection {}", stat, projection);
            println!("{}", format_record(&record));
        }
        None => println!("No override of {} on projection {}", stat, projection),
    }
    Ok(())
}
