//! ID types for teams, players, projections and scenarios.

use crate::error::{ProjectionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Team abbreviation, normalised to upper case.
///
/// # Examples
///
/// ```rust
/// use gridiron_proj::TeamId;
///
/// let team = TeamId::new("kc");
/// assert_eq!(team.as_str(), "KC");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn new(abbr: impl AsRef<str>) -> Self {
        Self(abbr.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TeamId {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(ProjectionError::invalid_team(s, "empty team id"));
        }
        Ok(Self::new(s))
    }
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ProjectionError;

            fn from_str(s: &str) -> Result<Self> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

numeric_id!(
    /// Type-safe wrapper for player IDs
    PlayerId
);

numeric_id!(
    /// Identity of a single ProjectionRecord, unique across scenarios.
    ProjectionId
);

numeric_id!(
    /// Identity of a Scenario (baseline or branch).
    ScenarioId
);

numeric_id!(
    /// Identity of a StatOverride log row.
    OverrideId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_id_normalises_case() {
        assert_eq!(TeamId::new(" buf ").as_str(), "BUF");
        assert_eq!("det".parse::<TeamId>().unwrap(), TeamId::new("DET"));
        assert!("  ".parse::<TeamId>().is_err());
    }

    #[test]
    fn test_numeric_ids_parse() {
        assert_eq!("42".parse::<ProjectionId>().unwrap().as_u64(), 42);
        assert_eq!(ScenarioId::new(7).to_string(), "7");
        assert!(matches!(
            "x".parse::<PlayerId>(),
            Err(ProjectionError::InvalidId(_))
        ));
    }
}
