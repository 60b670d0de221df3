//! Persisted progress record.
//!
//! Decoding is tolerant: each top-level field is parsed on its own and
//! replaced by its default when malformed, and entries of the per-level maps
//! are dropped individually. A corrupt star map therefore never erases the
//! unlock history stored next to it.

use std::collections::{BTreeMap, BTreeSet};

use pychamp_core::{time, LevelId, LevelStats, ProgressState, Stars};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const UNLOCKED: &str = "unlockedLevels";
const COMPLETED: &str = "completedLevels";
const SCORES: &str = "levelScores";
const STATS: &str = "levelStats";
const PLAY_TIME: &str = "totalPlayTime";
const HINTS: &str = "hintsUsed";

/// Per-level completion map written by early versions of the game.
const LEGACY_COMPLETED: &str = "levelsCompleted";

const KNOWN_FIELDS: [&str; 6] = [UNLOCKED, COMPLETED, SCORES, STATS, PLAY_TIME, HINTS];

/// Why a stored record could not be used at all.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The stored text is not JSON
    #[error("stored progress is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored JSON is not an object
    #[error("stored progress is not a JSON object")]
    NotAnObject,
}

/// Result of decoding a stored record.
#[derive(Debug)]
pub struct Decoded {
    /// The usable state
    pub state: ProgressState,

    /// Fields that were missing or malformed and fell back to defaults, or
    /// had individual entries dropped
    pub backfilled: Vec<&'static str>,
}

/// Serialize state to the stored layout.
pub fn encode(state: &ProgressState) -> serde_json::Result<String> {
    serde_json::to_string(state)
}

/// Decode a stored record, backfilling defaults field by field.
pub fn decode(raw: &str) -> Result<Decoded, RecordError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(mut object) = value else {
        return Err(RecordError::NotAnObject);
    };

    let mut backfilled = Vec::new();
    let mut state = ProgressState::default();

    let legacy = object.remove(LEGACY_COMPLETED);

    match take_ids(&mut object, UNLOCKED) {
        Some((ids, dropped)) => {
            state.unlocked_levels = ids;
            if dropped {
                backfilled.push(UNLOCKED);
            }
        }
        None => backfilled.push(UNLOCKED),
    }

    let completed = take_ids(&mut object, COMPLETED);

    if let Some(entries) = take_entries(&mut object, SCORES, &mut backfilled) {
        let (scores, dropped) = decode_entries::<Stars>(entries);
        if dropped {
            backfilled.push(SCORES);
        }
        state.level_scores = scores;
    }

    if let Some(entries) = take_entries(&mut object, STATS, &mut backfilled) {
        let mut stats = BTreeMap::new();
        let mut dropped = false;
        for (key, value) in entries {
            match (parse_id(&key), decode_stats(value)) {
                (Some(id), Some((entry, partial))) => {
                    dropped |= partial;
                    stats.insert(id, entry);
                }
                _ => dropped = true,
            }
        }
        if dropped {
            backfilled.push(STATS);
        }
        state.level_stats = stats;
    }

    match (completed, legacy) {
        (Some((ids, dropped)), legacy) => {
            state.completed_levels = ids;
            if dropped {
                backfilled.push(COMPLETED);
            }
            // Superseded by completedLevels; carried along untouched.
            if let Some(legacy) = legacy {
                object.insert(LEGACY_COMPLETED.to_string(), legacy);
            }
        }
        (None, legacy) => {
            if !migrate_legacy(legacy.as_ref(), &mut state) {
                backfilled.push(COMPLETED);
            }
        }
    }

    match take_field::<u64>(&mut object, PLAY_TIME) {
        Some(ms) => state.total_play_time_ms = ms,
        None => backfilled.push(PLAY_TIME),
    }

    match take_field::<u64>(&mut object, HINTS) {
        Some(count) => state.hints_used_total = count,
        None => backfilled.push(HINTS),
    }

    if state.repair() && !backfilled.contains(&UNLOCKED) {
        backfilled.push(UNLOCKED);
    }

    debug_assert!(KNOWN_FIELDS.iter().all(|k| !object.contains_key(*k)));
    state.extra = object;

    Ok(Decoded { state, backfilled })
}

/// Remove `key` and parse it, `None` when absent or malformed.
fn take_field<T: DeserializeOwned>(object: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = object.remove(key)?;
    serde_json::from_value(value).ok()
}

/// Remove `key` expecting an object. Records a backfill unless it is an object.
fn take_entries(
    object: &mut Map<String, Value>,
    key: &'static str,
    backfilled: &mut Vec<&'static str>,
) -> Option<Map<String, Value>> {
    match object.remove(key) {
        Some(Value::Object(entries)) => Some(entries),
        _ => {
            backfilled.push(key);
            None
        }
    }
}

/// Parse `"<id>": value` entries, skipping bad ones. Returns whether any were skipped.
fn decode_entries<T: DeserializeOwned>(entries: Map<String, Value>) -> (BTreeMap<LevelId, T>, bool) {
    let mut out = BTreeMap::new();
    let mut dropped = false;
    for (key, value) in entries {
        match (parse_id(&key), serde_json::from_value::<T>(value)) {
            (Some(id), Ok(parsed)) => {
                out.insert(id, parsed);
            }
            _ => dropped = true,
        }
    }
    (out, dropped)
}

/// Remove `key` expecting an id list. Elements that are not positive ids are
/// skipped; the flag tells whether any were.
fn take_ids(object: &mut Map<String, Value>, key: &str) -> Option<(BTreeSet<LevelId>, bool)> {
    let Value::Array(items) = object.remove(key)? else {
        return None;
    };
    let mut dropped = false;
    let ids = items
        .into_iter()
        .filter_map(|item| {
            let id = serde_json::from_value::<LevelId>(item)
                .ok()
                .filter(|id| id.get() > 0);
            dropped |= id.is_none();
            id
        })
        .collect();
    Some((ids, dropped))
}

fn parse_id(key: &str) -> Option<LevelId> {
    key.parse::<LevelId>().ok().filter(|id| id.get() > 0)
}

/// Decode one `levelStats` entry field by field. A malformed counter falls
/// back to its default without taking the others with it; the flag tells
/// whether that happened. `None` when the entry is not an object.
fn decode_stats(value: Value) -> Option<(LevelStats, bool)> {
    let Value::Object(fields) = value else {
        return None;
    };
    let mut stats = LevelStats::default();
    let mut dropped = false;
    for (key, value) in fields {
        let parsed = match key.as_str() {
            "attempts" => parse_into(value, &mut stats.attempts),
            "bestTime" => parse_into(value, &mut stats.best_time_ms),
            "totalHints" => parse_into(value, &mut stats.total_hints_used),
            "firstCompleted" => match value {
                Value::Null => true,
                other => match other.as_i64().and_then(time::from_millis) {
                    Some(at) => {
                        stats.first_completed_at = Some(at);
                        true
                    }
                    None => false,
                },
            },
            _ => true,
        };
        dropped |= !parsed;
    }
    Some((stats, dropped))
}

fn parse_into<T: DeserializeOwned>(value: Value, slot: &mut T) -> bool {
    match serde_json::from_value(value) {
        Ok(parsed) => {
            *slot = parsed;
            true
        }
        Err(_) => false,
    }
}

/// Seed completions, scores and stats from the legacy `levelsCompleted` map.
///
/// Stored `levelScores` and `levelStats` values take precedence; legacy data
/// only raises a score or fills a counter that is still unset.
fn migrate_legacy(legacy: Option<&Value>, state: &mut ProgressState) -> bool {
    let Some(Value::Object(entries)) = legacy else {
        return false;
    };
    for (key, entry) in entries {
        let Some(id) = parse_id(key) else {
            continue;
        };
        state.completed_levels.insert(id);

        let stars = entry
            .get("stars")
            .and_then(Value::as_u64)
            .and_then(|s| u8::try_from(s).ok())
            .and_then(|s| Stars::try_from(s).ok());
        if let Some(stars) = stars {
            let best = state.level_scores.entry(id).or_insert(stars);
            *best = (*best).max(stars);
        }

        let stats = state.level_stats.entry(id).or_default();
        if stats.first_completed_at.is_none() {
            stats.first_completed_at = entry
                .get("completedAt")
                .and_then(Value::as_i64)
                .and_then(time::from_millis);
        }
        if stats.total_hints_used == 0 {
            if let Some(hints) = entry
                .get("hintsUsed")
                .and_then(Value::as_u64)
                .and_then(|h| u32::try_from(h).ok())
            {
                stats.total_hints_used = hints;
            }
        }
    }
    true
}
