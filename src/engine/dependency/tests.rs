//! Unit tests for the dependency graph

use super::*;

#[test]
fn test_every_field_has_an_entry() {
    for field in StatField::ALL {
        assert_eq!(
            DIRECT.iter().filter(|(f, _)| *f == field).count(),
            1,
            "{field} must appear exactly once"
        );
    }
}

#[test]
fn test_graph_is_acyclic_and_forward() {
    for (field, deps) in DIRECT {
        for dep in *deps {
            assert!(
                dep.rank() > field.rank(),
                "{field} -> {dep} points backwards"
            );
        }
    }
}

#[test]
fn test_only_derived_fields_are_dependents() {
    for (_, deps) in DIRECT {
        assert!(deps.iter().all(|d| d.is_derived()));
    }
}

#[test]
fn test_pass_attempts_closure() {
    assert_eq!(
        dependents(StatField::PassAttempts),
        vec![
            StatField::Completions,
            StatField::GrossPassYards,
            StatField::PassYards,
            StatField::PassTds,
            StatField::Interceptions,
            StatField::FantasyPoints,
        ]
    );
}

#[test]
fn test_share_closure_reaches_volume_and_points() {
    let deps = dependents(StatField::TargetShare);
    assert_eq!(deps.first(), Some(&StatField::Targets));
    assert!(deps.contains(&StatField::Receptions));
    assert!(deps.contains(&StatField::RecYards));
    assert!(deps.contains(&StatField::RecTds));
    assert_eq!(deps.last(), Some(&StatField::FantasyPoints));
    assert!(!deps.contains(&StatField::RushYards));
}

#[test]
fn test_closure_is_sorted_by_rank() {
    for field in StatField::ALL {
        let deps = dependents(field);
        assert!(deps.windows(2).all(|w| w[0].rank() < w[1].rank()));
        assert!(!deps.contains(&field));
    }
}

#[test]
fn test_points_reachable_from_every_scoring_input() {
    for field in StatField::ALL {
        let deps = dependents(field);
        let reaches_points = deps.contains(&StatField::FantasyPoints);
        let expected = !matches!(field, StatField::Completions | StatField::CompletionPct | StatField::FantasyPoints);
        assert_eq!(reaches_points, expected, "{field}");
    }
}

#[test]
fn test_net_yardage_follows_gross_and_fumbles() {
    assert_eq!(
        dependents(StatField::YardsPerCarry),
        vec![
            StatField::GrossRushYards,
            StatField::RushYards,
            StatField::FantasyPoints,
        ]
    );
    let deps = dependents(StatField::FumbleRate);
    assert!(deps.contains(&StatField::RushYards));
    assert!(deps.contains(&StatField::FumblesLost));
    assert!(!deps.contains(&StatField::GrossRushYards));
}
