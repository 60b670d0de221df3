//! Time source and duration formatting.

use chrono::{DateTime, Duration, Utc};

/// Clock used to timestamp sessions, switchable to a fixed time for tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    /// Real system time
    #[default]
    System,
    /// Frozen at the given instant until advanced
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// A clock frozen at `at`.
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Clock::Fixed(at)
    }

    /// Current time, truncated to whole milliseconds so it survives persistence unchanged.
    pub fn now(&self) -> DateTime<Utc> {
        let now = match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        };
        truncate_to_millis(now)
    }

    /// Move a fixed clock forward. No effect on the system clock.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

fn truncate_to_millis(t: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(t.timestamp_millis()).unwrap_or(t)
}

/// Instant from milliseconds since the Unix epoch, `None` when out of range.
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// Deterministic instant for tests (2023-11-14T22:13:20Z).
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

/// Format milliseconds as `m:ss`, e.g. `83_000` becomes `1:23`.
pub fn format_duration_ms(ms: u64) -> String {
    let seconds = ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
