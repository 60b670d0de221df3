//! Execution layer - running submissions and turning passing runs into
//! level completions.

#![warn(missing_docs)]

pub mod runner;
pub mod attempt;

pub use runner::{CodeRunner, CommandRunner, RunOutcome, RunnerConfig, RunnerError};
pub use attempt::{submit, AttemptError, AttemptResult};
