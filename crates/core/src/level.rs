//! Level model - one self-contained coding exercise.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::id::LevelId;

/// A coding exercise with fixed instructional content and a success condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    /// Position in the catalog, starting at 1
    pub id: LevelId,

    /// Display title
    pub title: String,

    /// Python concepts practiced, e.g. "for loops, range"
    #[serde(default)]
    pub concepts: String,

    /// Scene dialogue shown when the level opens
    #[serde(default)]
    pub dialogue: String,

    /// What the player has to do
    pub instructions: String,

    /// Code placed in the editor when the level starts
    #[serde(default)]
    pub starting_code: String,

    /// Ordered hints, revealed one at a time
    #[serde(default)]
    pub hints: Vec<String>,

    /// Reference solution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,

    /// Exact output expected when no success condition is given
    #[serde(default)]
    pub expected_output: Option<String>,

    /// Check used instead of exact match when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_condition: Option<SuccessCondition>,
}

impl Level {
    /// Whether captured program output satisfies this level.
    pub fn is_solved_by(&self, output: &str) -> bool {
        let output = normalize_output(output);
        match (&self.success_condition, &self.expected_output) {
            (Some(condition), _) => condition.matches(&output),
            (None, Some(expected)) => output == normalize_output(expected),
            (None, None) => false,
        }
    }

    /// Whether the level can ever be solved.
    pub fn has_success_check(&self) -> bool {
        self.success_condition.is_some() || self.expected_output.is_some()
    }
}

/// Predicate over normalized program output.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuccessCondition {
    /// Output must equal the given text.
    ExactOutput {
        /// Expected text, normalized before comparison
        expected: String,
    },

    /// Output must contain `needle` and be at least `min_chars` long.
    Contains {
        /// Required substring
        needle: String,
        /// Minimum length in characters
        #[serde(default)]
        min_chars: usize,
    },

    /// Arbitrary predicate, only available to catalogs built in code.
    #[serde(skip)]
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl SuccessCondition {
    /// Wrap a closure as a condition.
    pub fn custom(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        SuccessCondition::Custom(Arc::new(predicate))
    }

    /// Evaluate against already-normalized output.
    pub fn matches(&self, output: &str) -> bool {
        match self {
            SuccessCondition::ExactOutput { expected } => output == normalize_output(expected),
            SuccessCondition::Contains { needle, min_chars } => {
                output.contains(needle.as_str()) && output.chars().count() >= *min_chars
            }
            SuccessCondition::Custom(predicate) => predicate(output),
        }
    }
}

impl std::fmt::Debug for SuccessCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuccessCondition::ExactOutput { expected } => {
                f.debug_struct("ExactOutput").field("expected", expected).finish()
            }
            SuccessCondition::Contains { needle, min_chars } => f
                .debug_struct("Contains")
                .field("needle", needle)
                .field("min_chars", min_chars)
                .finish(),
            SuccessCondition::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Trim surrounding whitespace and unify line endings.
pub fn normalize_output(output: &str) -> String {
    output.trim().replace("\r\n", "\n")
}
