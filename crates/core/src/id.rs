//! Level identifiers.

use serde::{Deserialize, Serialize};

/// Identifier of a level in the catalog.
///
/// Ids are positive and dense: a catalog of `n` levels uses `1..=n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(u32);

impl LevelId {
    /// The first level. Always unlocked.
    pub const FIRST: LevelId = LevelId(1);

    /// Create from a raw number.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The level that follows this one, regardless of whether it exists.
    pub fn next(self) -> LevelId {
        LevelId(self.0.saturating_add(1))
    }

    /// The level before this one, if any.
    pub fn previous(self) -> Option<LevelId> {
        (self.0 > 1).then(|| LevelId(self.0 - 1))
    }
}

impl From<u32> for LevelId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for LevelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for LevelId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}
