//! Errors reported by tracker operations.

use pychamp_core::LevelId;

/// Conditions that stop a tracker operation. State is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    /// The id is not in the level catalog
    #[error("level {0} does not exist")]
    LevelNotFound(LevelId),

    /// The level is neither unlocked nor completed
    #[error("level {0} is locked; complete the previous levels first")]
    LevelLocked(LevelId),

    /// A session operation was called with no level started
    #[error("no level is being played")]
    NoActiveSession,
}
