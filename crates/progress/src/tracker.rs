//! Progress tracking service.
//!
//! [`ProgressTracker`] is the single owner of a player's [`ProgressState`].
//! Every mutation goes through one of its operations and is persisted
//! immediately; persistence failures are logged and the game carries on
//! from memory.

use std::sync::Arc;

use pychamp_core::{Clock, Level, LevelCatalog, LevelId, LevelStats, ProgressState, Stars, Time};
use pychamp_storage::Storage;
use tracing::{debug, info, warn};

use crate::error::ProgressError;
use crate::record;

/// Storage key used by the browser version of the game.
pub const DEFAULT_STORAGE_KEY: &str = "pychamp_progress";

/// Configuration for the progress tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Slot the progress record is stored under
    pub storage_key: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

/// The level currently being attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    level: LevelId,
    started_at: Time,
    hint_count: u32,
    hints_revealed: usize,
}

impl Session {
    /// Level being played.
    pub fn level(&self) -> LevelId {
        self.level
    }

    /// When the level was started.
    pub fn started_at(&self) -> Time {
        self.started_at
    }

    /// Hints used since the level was started.
    pub fn hint_count(&self) -> u32 {
        self.hint_count
    }

    /// Hint texts handed out by [`ProgressTracker::reveal_hint`] so far.
    pub fn hints_revealed(&self) -> usize {
        self.hints_revealed
    }
}

/// What `complete_level` reports back for the victory screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSummary {
    /// Level that was completed
    pub level: LevelId,
    /// Rating earned by this run
    pub stars: Stars,
    /// Best rating ever earned on the level, including this run
    pub best_stars: Stars,
    /// Time from level start to completion, in milliseconds
    pub elapsed_ms: u64,
    /// Following level, `None` after the last one
    pub next_level: Option<LevelId>,
    /// Whether this run unlocked `next_level`
    pub unlocked_next: bool,
}

/// A hint handed out by [`ProgressTracker::reveal_hint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintReveal {
    /// 1-based position of the hint
    pub number: usize,
    /// Hints the level has
    pub total: usize,
    /// Hint text
    pub text: String,
    /// Hints still hidden
    pub remaining: usize,
    /// Hints used in this session, this one included
    pub session_hints: u32,
}

/// Whole-game progress summary.
#[derive(Debug, Clone, PartialEq)]
pub struct OverallProgress {
    /// Catalog levels completed at least once
    pub completed_count: usize,
    /// Levels in the catalog
    pub total_count: usize,
    /// `completed_count / total_count` as a percentage, capped at 100
    pub percentage: f32,
    /// Sum of best ratings
    pub total_stars: u32,
    /// Stars available across the catalog
    pub max_stars: u32,
    /// Lifetime hint count
    pub hints_used: u64,
    /// Sum of successful completion times, in milliseconds
    pub total_play_time_ms: u64,
}

/// Tracker for a single player's progression.
///
/// Operations take `&mut self`; callers that share a tracker across tasks
/// wrap it in a [`SharedTracker`] so mutations stay serialized.
pub struct ProgressTracker<S: Storage> {
    storage: S,
    catalog: Arc<LevelCatalog>,
    state: ProgressState,
    session: Option<Session>,
    clock: Clock,
    config: TrackerConfig,
}

/// A tracker behind an async mutex, for use from concurrent tasks.
pub type SharedTracker<S> = Arc<tokio::sync::Mutex<ProgressTracker<S>>>;

impl<S: Storage> ProgressTracker<S> {
    /// Create a tracker with fresh progress. Call [`load`](Self::load) to
    /// restore saved progress.
    pub fn new(storage: S, catalog: Arc<LevelCatalog>) -> Self {
        Self {
            storage,
            catalog,
            state: ProgressState::default(),
            session: None,
            clock: Clock::default(),
            config: TrackerConfig::default(),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Wrap the tracker for shared use.
    pub fn into_shared(self) -> SharedTracker<S> {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    /// Clock used for session timing.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// Catalog the tracker plays against.
    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    /// Current state, read-only.
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Active session, if a level is being played.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Level of the active session.
    pub fn active_level(&self) -> Option<&Level> {
        self.session.as_ref().and_then(|s| self.catalog.get(s.level))
    }

    /// Restore progress from storage.
    ///
    /// Never fails: unreadable or corrupt data falls back to defaults, and
    /// malformed fields are replaced one by one. Any active session is dropped.
    pub async fn load(&mut self) {
        self.session = None;
        let key = self.config.storage_key.as_str();

        let raw = match self.storage.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("No saved progress found, starting fresh");
                self.state = ProgressState::default();
                return;
            }
            Err(e) => {
                warn!("Failed to read progress, starting fresh: {}", e);
                self.state = ProgressState::default();
                return;
            }
        };

        match record::decode(&raw) {
            Ok(decoded) => {
                for field in &decoded.backfilled {
                    warn!("Progress field {} missing or malformed, using default", field);
                }
                self.state = decoded.state;
                info!(
                    "Progress loaded: {} unlocked, {} completed",
                    self.state.unlocked_levels.len(),
                    self.state.completed_levels.len()
                );
            }
            Err(e) => {
                warn!("Discarding saved progress: {}", e);
                self.state = ProgressState::default();
            }
        }
    }

    /// Persist the current state. Failures are logged and swallowed.
    pub async fn save(&mut self) {
        let json = match record::encode(&self.state) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize progress: {}", e);
                return;
            }
        };
        match self.storage.set(&self.config.storage_key, &json).await {
            Ok(()) => debug!("Progress saved"),
            Err(e) => warn!("Failed to save progress: {}", e),
        }
    }

    /// Begin a session on `id` and return the level to render.
    ///
    /// A completed level stays playable even if it is somehow missing from
    /// the unlocked set. Starting replaces any session already in progress.
    pub async fn start_level(&mut self, id: LevelId) -> Result<&Level, ProgressError> {
        if !self.catalog.contains(id) {
            warn!("Level {} not found", id);
            return Err(ProgressError::LevelNotFound(id));
        }
        if !self.state.is_accessible(id) {
            warn!("Level {} is not accessible yet", id);
            return Err(ProgressError::LevelLocked(id));
        }

        if let Some(previous) = self.session.take() {
            debug!("Discarding session on level {}", previous.level);
        }
        self.session = Some(Session {
            level: id,
            started_at: self.clock.now(),
            hint_count: 0,
            hints_revealed: 0,
        });
        let stats = self.state.level_stats.entry(id).or_default();
        stats.attempts = stats.attempts.saturating_add(1);
        self.save().await;

        info!("Starting level {}", id);
        self.catalog
            .get(id)
            .ok_or(ProgressError::LevelNotFound(id))
    }

    /// Record one hint for the active session. Returns the session hint count.
    pub async fn increment_hint(&mut self) -> Result<u32, ProgressError> {
        let session = self.session.as_mut().ok_or(ProgressError::NoActiveSession)?;
        session.hint_count = session.hint_count.saturating_add(1);
        let (level, count) = (session.level, session.hint_count);

        self.state.hints_used_total = self.state.hints_used_total.saturating_add(1);
        let stats = self.state.level_stats.entry(level).or_default();
        stats.total_hints_used = stats.total_hints_used.saturating_add(1);
        self.save().await;

        debug!("Hint {} used on level {}", count, level);
        Ok(count)
    }

    /// Reveal the next hint of the active level and count it.
    ///
    /// Hints are shown in order regardless of how many were counted through
    /// [`increment_hint`](Self::increment_hint). Returns `None`, without
    /// counting, once every hint has been shown.
    pub async fn reveal_hint(&mut self) -> Result<Option<HintReveal>, ProgressError> {
        let session = self.session.as_ref().ok_or(ProgressError::NoActiveSession)?;
        let level = self
            .catalog
            .get(session.level)
            .ok_or(ProgressError::LevelNotFound(session.level))?;

        let index = session.hints_revealed;
        let total = level.hints.len();
        let Some(text) = level.hints.get(index).cloned() else {
            debug!("All {} hints of level {} already shown", total, level.id);
            return Ok(None);
        };

        let session_hints = self.increment_hint().await?;
        if let Some(session) = self.session.as_mut() {
            session.hints_revealed = index + 1;
        }
        Ok(Some(HintReveal {
            number: index + 1,
            total,
            text,
            remaining: total - index - 1,
            session_hints,
        }))
    }

    /// Record a successful run of the active level and end the session.
    ///
    /// Callers invoke this at most once per successful run: play time is
    /// accumulated on every call.
    pub async fn complete_level(&mut self) -> Result<CompletionSummary, ProgressError> {
        let session = self.session.as_ref().ok_or(ProgressError::NoActiveSession)?;
        let id = session.level;
        let now = self.clock.now();
        let elapsed_ms = u64::try_from((now - session.started_at).num_milliseconds()).unwrap_or(0);
        let stars = Stars::from_hints(session.hint_count);

        self.state.completed_levels.insert(id);
        self.state.unlocked_levels.insert(id);

        let best_stars = *self
            .state
            .level_scores
            .entry(id)
            .and_modify(|best| *best = (*best).max(stars))
            .or_insert(stars);

        let stats = self.state.level_stats.entry(id).or_default();
        stats.first_completed_at.get_or_insert(now);
        stats.best_time_ms = Some(stats.best_time_ms.map_or(elapsed_ms, |t| t.min(elapsed_ms)));

        let next_level = Some(id.next()).filter(|next| self.catalog.contains(*next));
        let unlocked_next = match next_level {
            Some(next) => self.state.unlocked_levels.insert(next),
            None => false,
        };
        if unlocked_next {
            info!("Level {} unlocked", id.next());
        }

        self.state.total_play_time_ms = self.state.total_play_time_ms.saturating_add(elapsed_ms);
        self.save().await;
        self.session = None;

        info!("Level {} complete: {} stars in {} ms", id, stars.get(), elapsed_ms);
        Ok(CompletionSummary {
            level: id,
            stars,
            best_stars,
            elapsed_ms,
            next_level,
            unlocked_next,
        })
    }

    /// Erase all progress, saved and in memory. Confirmation is the caller's job.
    pub async fn reset_progress(&mut self) {
        if let Err(e) = self.storage.remove(&self.config.storage_key).await {
            warn!("Failed to clear saved progress: {}", e);
        }
        self.state = ProgressState::default();
        self.session = None;
        info!("Progress reset");
    }

    // === Queries ===

    /// Whether the level is in the unlocked set.
    pub fn is_unlocked(&self, id: LevelId) -> bool {
        self.state.unlocked_levels.contains(&id)
    }

    /// Whether the level was completed at least once.
    pub fn is_completed(&self, id: LevelId) -> bool {
        self.state.completed_levels.contains(&id)
    }

    /// Best rating for the level, if completed.
    pub fn stars_for(&self, id: LevelId) -> Option<Stars> {
        self.state.level_scores.get(&id).copied()
    }

    /// Counters for the level, zeroed if it was never played.
    pub fn stats_for(&self, id: LevelId) -> LevelStats {
        self.state.level_stats.get(&id).cloned().unwrap_or_default()
    }

    /// Summary across the whole catalog.
    pub fn overall_progress(&self) -> OverallProgress {
        let total_count = self.catalog.count();
        let completed_count = self
            .state
            .completed_levels
            .iter()
            .filter(|id| self.catalog.contains(**id))
            .count();
        let total_stars = self
            .state
            .level_scores
            .iter()
            .filter(|(id, _)| self.catalog.contains(**id))
            .map(|(_, stars)| u32::from(stars.get()))
            .sum();
        let percentage = if total_count > 0 {
            (completed_count as f32 / total_count as f32 * 100.0).min(100.0)
        } else {
            0.0
        };

        OverallProgress {
            completed_count,
            total_count,
            percentage,
            total_stars,
            max_stars: total_count as u32 * u32::from(Stars::MAX),
            hints_used: self.state.hints_used_total,
            total_play_time_ms: self.state.total_play_time_ms,
        }
    }
}
