//! Type-safe wrappers and enums shared by the CLI and the engine.

pub mod ids;
pub mod position;
pub mod time;

pub use ids::{OverrideId, PlayerId, ProjectionId, ScenarioId, TeamId};
pub use position::Position;
pub use time::Season;
