//! Star ratings.

use serde::{Deserialize, Serialize};

/// A 1-3 star rating for a level completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stars(u8);

impl Stars {
    /// Lowest rating a completion can earn.
    pub const ONE: Stars = Stars(1);
    /// Rating for a completion with one or two hints.
    pub const TWO: Stars = Stars(2);
    /// Rating for a completion without hints.
    pub const THREE: Stars = Stars(3);
    /// Highest rating per level.
    pub const MAX: u8 = 3;

    /// Rate a completion by the number of hints used during the session.
    ///
    /// Hint count is the only input: elapsed time never changes the rating.
    pub fn from_hints(hints: u32) -> Self {
        match hints {
            0 => Stars::THREE,
            1..=2 => Stars::TWO,
            _ => Stars::ONE,
        }
    }

    /// Numeric value, 1 through 3.
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Error for a rating outside `1..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("star rating must be between 1 and 3, got {0}")]
pub struct InvalidStars(pub u8);

impl TryFrom<u8> for Stars {
    type Error = InvalidStars;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=Self::MAX).contains(&value) {
            Ok(Stars(value))
        } else {
            Err(InvalidStars(value))
        }
    }
}

impl From<Stars> for u8 {
    fn from(stars: Stars) -> Self {
        stars.0
    }
}

impl std::fmt::Display for Stars {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..Self::MAX {
            f.write_str(if i < self.0 { "★" } else { "☆" })?;
        }
        Ok(())
    }
}
