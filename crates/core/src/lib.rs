//! PyChamp core data models.
//!
//! Levels, the level catalog, star ratings and the persisted progression
//! state shared by every other crate in the workspace.

#![warn(missing_docs)]

mod id;
mod level;
mod catalog;
mod stars;
mod state;
pub mod time;

pub use id::LevelId;
pub use level::{normalize_output, Level, SuccessCondition};
pub use catalog::{CatalogError, LevelCatalog};
pub use stars::{InvalidStars, Stars};
pub use state::{LevelStats, ProgressState};
pub use time::{format_duration_ms, Clock};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
