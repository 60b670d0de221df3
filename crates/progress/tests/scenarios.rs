use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Duration;
use pychamp_core::time::fixed_now;
use pychamp_core::{Clock, LevelCatalog, LevelId, ProgressState, Stars};
use pychamp_progress::{ProgressError, ProgressTracker, DEFAULT_STORAGE_KEY};
use pychamp_storage::{JsonStorage, MemoryStorage, Storage};

fn id(n: u32) -> LevelId {
    LevelId::new(n)
}

fn fresh() -> ProgressTracker<MemoryStorage> {
    ProgressTracker::new(MemoryStorage::new(), Arc::new(LevelCatalog::builtin()))
        .with_clock(Clock::fixed(fixed_now()))
}

fn assert_invariants<S: Storage>(t: &ProgressTracker<S>) {
    let state = t.state();
    assert!(state.unlocked_levels.contains(&LevelId::FIRST));
    assert!(state.completed_levels.is_subset(&state.unlocked_levels));
}

#[tokio::test]
async fn test_one_hint_earns_two_stars_and_unlocks_next() {
    let mut t = fresh();
    t.start_level(id(1)).await.unwrap();
    t.increment_hint().await.unwrap();
    let summary = t.complete_level().await.unwrap();

    assert_eq!(summary.stars, Stars::TWO);
    assert_eq!(summary.next_level, Some(id(2)));
    assert_eq!(t.state().unlocked_levels, BTreeSet::from([id(1), id(2)]));
    assert_eq!(t.state().completed_levels, BTreeSet::from([id(1)]));
    assert!(t.session().is_none());
    assert_invariants(&t);
}

#[tokio::test]
async fn test_no_hints_earns_three_stars() {
    let mut t = fresh();
    t.start_level(id(1)).await.unwrap();
    t.clock_mut().advance(Duration::minutes(30));
    let summary = t.complete_level().await.unwrap();
    assert_eq!(summary.stars, Stars::THREE);
    assert_eq!(t.stars_for(id(1)), Some(Stars::THREE));
}

#[tokio::test]
async fn test_three_hints_earn_one_star() {
    let mut t = fresh();
    t.start_level(id(1)).await.unwrap();
    for _ in 0..3 {
        t.increment_hint().await.unwrap();
    }
    assert_eq!(t.complete_level().await.unwrap().stars, Stars::ONE);
}

#[tokio::test]
async fn test_locked_level_refuses_to_start() {
    let mut t = fresh();
    let before = t.state().clone();

    let err = t.start_level(id(2)).await.unwrap_err();
    assert_eq!(err, ProgressError::LevelLocked(id(2)));
    assert_eq!(t.state(), &before);
    assert!(t.session().is_none());
}

#[tokio::test]
async fn test_best_score_is_kept() {
    let mut t = fresh();
    t.start_level(id(1)).await.unwrap();
    t.complete_level().await.unwrap();

    t.start_level(id(1)).await.unwrap();
    for _ in 0..4 {
        t.increment_hint().await.unwrap();
    }
    let summary = t.complete_level().await.unwrap();

    assert_eq!(summary.stars, Stars::ONE);
    assert_eq!(summary.best_stars, Stars::THREE);
    assert_eq!(t.stars_for(id(1)), Some(Stars::THREE));
}

#[tokio::test]
async fn test_final_level_has_no_successor() {
    let mut t = fresh();
    for n in 1..=4 {
        t.start_level(id(n)).await.unwrap();
        t.complete_level().await.unwrap();
    }
    let unlocked = t.state().unlocked_levels.clone();
    assert_eq!(unlocked.len(), 5);

    t.start_level(id(5)).await.unwrap();
    let summary = t.complete_level().await.unwrap();
    assert_eq!(summary.next_level, None);
    assert!(!summary.unlocked_next);
    assert_eq!(t.state().unlocked_levels, unlocked);

    let overall = t.overall_progress();
    assert_eq!(overall.completed_count, 5);
    assert_eq!(overall.percentage, 100.0);
    assert_eq!(overall.total_stars, overall.max_stars);
}

#[tokio::test]
async fn test_session_operations_need_a_started_level() {
    let mut t = fresh();
    assert_eq!(t.increment_hint().await.unwrap_err(), ProgressError::NoActiveSession);
    assert_eq!(t.reveal_hint().await.unwrap_err(), ProgressError::NoActiveSession);
    assert_eq!(t.complete_level().await.unwrap_err(), ProgressError::NoActiveSession);
    assert_eq!(t.state(), &ProgressState::default());
}

#[tokio::test]
async fn test_completing_ends_the_session() {
    let mut t = fresh();
    t.start_level(id(1)).await.unwrap();
    t.complete_level().await.unwrap();
    assert_eq!(t.complete_level().await.unwrap_err(), ProgressError::NoActiveSession);
}

#[tokio::test]
async fn test_starting_another_level_discards_the_session() {
    let mut t = fresh();
    t.start_level(id(1)).await.unwrap();
    t.complete_level().await.unwrap();

    t.start_level(id(1)).await.unwrap();
    t.increment_hint().await.unwrap();
    t.start_level(id(2)).await.unwrap();

    let session = t.session().unwrap();
    assert_eq!(session.level(), id(2));
    assert_eq!(session.hint_count(), 0);
    assert_eq!(t.complete_level().await.unwrap().stars, Stars::THREE);
}

#[tokio::test]
async fn test_reset_twice_equals_reset_once() {
    let storage = MemoryStorage::new();
    let mut t = ProgressTracker::new(storage.clone(), Arc::new(LevelCatalog::builtin()));
    t.start_level(id(1)).await.unwrap();
    t.increment_hint().await.unwrap();
    t.complete_level().await.unwrap();
    t.start_level(id(2)).await.unwrap();

    t.reset_progress().await;
    let once = t.state().clone();
    assert!(t.session().is_none());
    assert!(storage.peek(DEFAULT_STORAGE_KEY).await.is_none());

    t.reset_progress().await;
    assert_eq!(t.state(), &once);
    assert_eq!(once, ProgressState::default());
    assert!(storage.peek(DEFAULT_STORAGE_KEY).await.is_none());
}

#[tokio::test]
async fn test_progress_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(LevelCatalog::builtin());

    let saved = {
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        let mut t = ProgressTracker::new(storage, catalog.clone())
            .with_clock(Clock::fixed(fixed_now()));
        t.load().await;
        t.start_level(id(1)).await.unwrap();
        t.clock_mut().advance(Duration::seconds(12));
        t.increment_hint().await.unwrap();
        t.complete_level().await.unwrap();
        t.start_level(id(2)).await.unwrap();
        t.state().clone()
    };

    let storage = JsonStorage::new(dir.path()).await.unwrap();
    let mut t = ProgressTracker::new(storage, catalog);
    t.load().await;

    assert_eq!(t.state(), &saved);
    assert!(t.session().is_none());
    assert_eq!(t.stats_for(id(2)).attempts, 1);
    assert_eq!(t.stats_for(id(1)).best_time_ms, Some(12_000));
    assert_invariants(&t);
}

#[tokio::test]
async fn test_corrupt_field_keeps_unlock_history() {
    let storage = MemoryStorage::new();
    storage
        .seed(
            DEFAULT_STORAGE_KEY,
            r#"{"unlockedLevels":[1,2,3],"completedLevels":[1,2],"levelScores":{"1":3,"2":2},
                "levelStats":"oops","totalPlayTime":5000,"hintsUsed":2,"playerName":"Ada"}"#,
        )
        .await;

    let mut t = ProgressTracker::new(storage.clone(), Arc::new(LevelCatalog::builtin()));
    t.load().await;

    assert!(t.is_unlocked(id(3)));
    assert!(t.is_completed(id(2)));
    assert_eq!(t.stars_for(id(2)), Some(Stars::TWO));
    assert_eq!(t.stats_for(id(1)).attempts, 0);
    assert_eq!(t.state().total_play_time_ms, 5000);

    // Unknown fields are written back on the next save.
    t.start_level(id(3)).await.unwrap();
    let raw = storage.peek(DEFAULT_STORAGE_KEY).await.unwrap();
    assert!(raw.contains("\"playerName\":\"Ada\""));
}

#[tokio::test]
async fn test_bad_list_element_keeps_the_rest() {
    let storage = MemoryStorage::new();
    storage
        .seed(
            DEFAULT_STORAGE_KEY,
            r#"{"unlockedLevels":[1,2,3,4,null],"completedLevels":[1,"two",3],
                "levelStats":{"3":{"attempts":4,"bestTime":"fast","totalHints":1}}}"#,
        )
        .await;

    let mut t = ProgressTracker::new(storage, Arc::new(LevelCatalog::builtin()));
    t.load().await;

    assert!(t.is_unlocked(id(4)));
    assert!(!t.is_unlocked(id(5)));
    assert!(t.is_completed(id(3)));
    assert!(!t.is_completed(id(2)));
    assert_eq!(t.stats_for(id(3)).attempts, 4);
    assert_eq!(t.stats_for(id(3)).total_hints_used, 1);
    assert_eq!(t.stats_for(id(3)).best_time_ms, None);
    assert_invariants(&t);
}

#[tokio::test]
async fn test_garbage_record_loads_defaults() {
    let storage = MemoryStorage::new();
    storage.seed(DEFAULT_STORAGE_KEY, "{{{ not json").await;

    let mut t = ProgressTracker::new(storage, Arc::new(LevelCatalog::builtin()));
    t.load().await;
    assert_eq!(t.state(), &ProgressState::default());
    assert!(t.start_level(id(1)).await.is_ok());
}

#[tokio::test]
async fn test_scores_never_decrease_over_mixed_runs() {
    let mut t = fresh();
    let mut best = 0;
    for hints in [2, 0, 5, 1, 3] {
        t.start_level(id(1)).await.unwrap();
        for _ in 0..hints {
            t.increment_hint().await.unwrap();
        }
        t.complete_level().await.unwrap();
        let stars = t.stars_for(id(1)).unwrap().get();
        assert!(stars >= best);
        best = stars;
        assert_invariants(&t);
    }
    assert_eq!(best, 3);
}
