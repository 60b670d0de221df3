//! Progress Tracking
//!
//! Level unlocks, completions, star scoring, hint and timing statistics, and
//! their persistence.

#![warn(missing_docs)]

pub mod error;
pub mod record;
pub mod tracker;
pub mod views;

pub use error::ProgressError;
pub use record::{Decoded, RecordError};
pub use tracker::{
    CompletionSummary, HintReveal, OverallProgress, ProgressTracker, Session, SharedTracker,
    TrackerConfig, DEFAULT_STORAGE_KEY,
};
pub use views::{LevelMapEntry, LevelStatus, Navigation};
