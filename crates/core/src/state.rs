//! Player progression state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::id::LevelId;
use crate::stars::Stars;
use crate::Time;

/// Everything persisted about a player's progress.
///
/// Field names follow the stored record layout. Unknown fields found in a
/// stored record are kept in `extra` and written back untouched. Decoding is
/// field-by-field and lives with the tracker, so only `Serialize` is derived.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressState {
    /// Levels the player may start. Always contains level 1.
    #[serde(rename = "unlockedLevels")]
    pub unlocked_levels: BTreeSet<LevelId>,

    /// Levels solved at least once
    #[serde(rename = "completedLevels")]
    pub completed_levels: BTreeSet<LevelId>,

    /// Best rating per completed level
    #[serde(rename = "levelScores")]
    pub level_scores: BTreeMap<LevelId, Stars>,

    /// Per-level counters
    #[serde(rename = "levelStats")]
    pub level_stats: BTreeMap<LevelId, LevelStats>,

    /// Sum of successful completion durations, in milliseconds
    #[serde(rename = "totalPlayTime")]
    pub total_play_time_ms: u64,

    /// Lifetime hint count across all levels
    #[serde(rename = "hintsUsed")]
    pub hints_used_total: u64,

    /// Unrecognized fields, preserved on round-trip
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            unlocked_levels: BTreeSet::from([LevelId::FIRST]),
            completed_levels: BTreeSet::new(),
            level_scores: BTreeMap::new(),
            level_stats: BTreeMap::new(),
            total_play_time_ms: 0,
            hints_used_total: 0,
            extra: serde_json::Map::new(),
        }
    }
}

impl ProgressState {
    /// Whether the level may be started: unlocked, or completed at some point.
    pub fn is_accessible(&self, id: LevelId) -> bool {
        self.unlocked_levels.contains(&id) || self.completed_levels.contains(&id)
    }

    /// Restore structural invariants after loading untrusted data.
    ///
    /// Level 1 is unlocked and every completed level is unlocked. Returns
    /// true if anything changed.
    pub fn repair(&mut self) -> bool {
        let before = self.unlocked_levels.len();
        self.unlocked_levels.insert(LevelId::FIRST);
        self.unlocked_levels
            .extend(self.completed_levels.iter().copied());
        self.unlocked_levels.len() != before
    }

    /// Sum of best ratings over all scored levels.
    pub fn total_stars(&self) -> u32 {
        self.level_scores.values().map(|s| u32::from(s.get())).sum()
    }
}

/// Counters kept for a single level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelStats {
    /// Times the level was started
    pub attempts: u32,

    /// Fastest successful completion, in milliseconds
    #[serde(rename = "bestTime")]
    pub best_time_ms: Option<u64>,

    /// Hints revealed on this level across all sessions
    #[serde(rename = "totalHints")]
    pub total_hints_used: u32,

    /// When the level was first solved
    #[serde(rename = "firstCompleted", with = "chrono::serde::ts_milliseconds_option")]
    pub first_completed_at: Option<Time>,
}
