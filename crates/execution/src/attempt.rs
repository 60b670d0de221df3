//! Submitting code for the active level.
//!
//! Ties a [`CodeRunner`] to a [`ProgressTracker`]: the submission runs, its
//! output is checked against the level, and a passing run completes the
//! level exactly once. A failing run leaves the session active so the player
//! can try again.

use pychamp_progress::{CompletionSummary, ProgressError, ProgressTracker};
use pychamp_storage::Storage;
use tracing::{debug, info};

use crate::runner::{CodeRunner, RunOutcome, RunnerError};

/// Errors that stop a submission.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    /// Tracker refused, typically because no level is active
    #[error(transparent)]
    Progress(#[from] ProgressError),

    /// Code could not be run
    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    /// Program raised an error
    Errored(RunOutcome),
    /// Program ran but its output does not solve the level
    WrongOutput(RunOutcome),
    /// Level solved and recorded
    Solved {
        /// What the program printed
        outcome: RunOutcome,
        /// Completion details from the tracker
        summary: CompletionSummary,
    },
}

impl AttemptResult {
    /// Whether the submission completed the level.
    pub fn is_solved(&self) -> bool {
        matches!(self, AttemptResult::Solved { .. })
    }
}

/// Run `code` against the tracker's active level.
pub async fn submit<S, R>(
    tracker: &mut ProgressTracker<S>,
    runner: &R,
    code: &str,
) -> Result<AttemptResult, AttemptError>
where
    S: Storage,
    R: CodeRunner + ?Sized,
{
    let level = tracker
        .active_level()
        .ok_or(ProgressError::NoActiveSession)?
        .clone();

    let outcome = runner.run(code, &level).await?;

    if outcome.error.is_some() {
        debug!("Submission for level {} raised an error", level.id);
        return Ok(AttemptResult::Errored(outcome));
    }
    if !level.is_solved_by(&outcome.output) {
        debug!("Submission for level {} produced unexpected output", level.id);
        return Ok(AttemptResult::WrongOutput(outcome));
    }

    info!("Success condition met for level {}", level.id);
    let summary = tracker.complete_level().await?;
    Ok(AttemptResult::Solved { outcome, summary })
}
