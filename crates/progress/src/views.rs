//! Read-only views for the level map and in-level navigation.

use pychamp_core::{LevelId, LevelStats, Stars};
use pychamp_storage::Storage;

use crate::tracker::ProgressTracker;

/// How a level appears on the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelStatus {
    /// Not yet reachable
    Locked,
    /// Playable, never completed
    Unlocked,
    /// Completed at least once
    Completed {
        /// Best rating, if one was recorded
        stars: Option<Stars>,
    },
}

impl LevelStatus {
    /// Whether the level can be started.
    pub fn is_playable(&self) -> bool {
        !matches!(self, LevelStatus::Locked)
    }
}

/// One node on the level map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelMapEntry {
    /// Level id
    pub id: LevelId,
    /// Level title
    pub title: String,
    /// Concepts covered
    pub concepts: String,
    /// Map status
    pub status: LevelStatus,
    /// Counters for tooltips
    pub stats: LevelStats,
}

/// Previous/next buttons while playing a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Navigation {
    /// Previous level, if it exists and is playable
    pub previous: Option<LevelId>,
    /// Next level, if it exists and is playable
    pub next: Option<LevelId>,
}

impl<S: Storage> ProgressTracker<S> {
    /// Status of a single level.
    pub fn level_status(&self, id: LevelId) -> LevelStatus {
        if self.is_completed(id) {
            LevelStatus::Completed {
                stars: self.stars_for(id),
            }
        } else if self.is_unlocked(id) {
            LevelStatus::Unlocked
        } else {
            LevelStatus::Locked
        }
    }

    /// Every catalog level with its status, in order.
    pub fn level_map(&self) -> Vec<LevelMapEntry> {
        self.catalog()
            .iter()
            .map(|level| LevelMapEntry {
                id: level.id,
                title: level.title.clone(),
                concepts: level.concepts.clone(),
                status: self.level_status(level.id),
                stats: self.stats_for(level.id),
            })
            .collect()
    }

    /// Playable neighbours of `id`.
    pub fn navigation(&self, id: LevelId) -> Navigation {
        let playable = |candidate: LevelId| {
            self.catalog().contains(candidate) && self.state().is_accessible(candidate)
        };
        Navigation {
            previous: id.previous().filter(|p| playable(*p)),
            next: Some(id.next()).filter(|n| playable(*n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pychamp_core::{Clock, LevelCatalog};
    use pychamp_storage::MemoryStorage;
    use std::sync::Arc;

    async fn tracker_with_level_one_done() -> ProgressTracker<MemoryStorage> {
        let mut t = ProgressTracker::new(MemoryStorage::new(), Arc::new(LevelCatalog::builtin()))
            .with_clock(Clock::fixed(pychamp_core::time::fixed_now()));
        t.start_level(LevelId::FIRST).await.unwrap();
        t.increment_hint().await.unwrap();
        t.complete_level().await.unwrap();
        t
    }

    #[tokio::test]
    async fn test_level_map_statuses() {
        let t = tracker_with_level_one_done().await;
        let map = t.level_map();
        assert_eq!(map.len(), 5);
        assert_eq!(
            map[0].status,
            LevelStatus::Completed {
                stars: Some(Stars::TWO)
            }
        );
        assert_eq!(map[0].stats.total_hints_used, 1);
        assert_eq!(map[1].status, LevelStatus::Unlocked);
        assert_eq!(map[2].status, LevelStatus::Locked);
        assert!(!map[2].status.is_playable());
        assert_eq!(map[4].title, "Loops");
    }

    #[tokio::test]
    async fn test_navigation() {
        let t = tracker_with_level_one_done().await;
        assert_eq!(
            t.navigation(LevelId::FIRST),
            Navigation {
                previous: None,
                next: Some(LevelId::new(2))
            }
        );
        assert_eq!(
            t.navigation(LevelId::new(2)),
            Navigation {
                previous: Some(LevelId::FIRST),
                next: None
            }
        );
        assert_eq!(t.navigation(LevelId::new(5)).next, None);
    }
}
