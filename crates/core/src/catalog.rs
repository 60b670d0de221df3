//! Level catalog - the static, ordered set of levels.

use std::path::Path;

use crate::id::LevelId;
use crate::level::{Level, SuccessCondition};

/// Errors raised while building a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No levels were supplied
    #[error("catalog contains no levels")]
    Empty,

    /// Ids do not form the sequence 1..=n
    #[error("level ids must be dense starting at 1: expected {expected}, found {found}")]
    NonDenseIds {
        /// Id expected at this position
        expected: LevelId,
        /// Id actually present
        found: LevelId,
    },

    /// A level has neither expected output nor a success condition
    #[error("level {0} has no expected output or success condition")]
    MissingSuccessCheck(LevelId),

    /// Catalog file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog file is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Immutable, validated list of levels indexed by id.
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    levels: Vec<Level>,
}

impl LevelCatalog {
    /// Validate and build a catalog. Levels may be supplied in any order.
    pub fn new(mut levels: Vec<Level>) -> Result<Self, CatalogError> {
        if levels.is_empty() {
            return Err(CatalogError::Empty);
        }
        levels.sort_by_key(|l| l.id);

        for (pos, level) in levels.iter().enumerate() {
            let expected = LevelId::new(pos as u32 + 1);
            if level.id != expected {
                return Err(CatalogError::NonDenseIds {
                    expected,
                    found: level.id,
                });
            }
            if !level.has_success_check() {
                return Err(CatalogError::MissingSuccessCheck(level.id));
            }
        }

        Ok(Self { levels })
    }

    /// Parse a JSON array of levels.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let levels: Vec<Level> = serde_json::from_str(json)?;
        Self::new(levels)
    }

    /// Read a JSON catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Look up a level.
    pub fn get(&self, id: LevelId) -> Option<&Level> {
        let index = (id.get() as usize).checked_sub(1)?;
        self.levels.get(index)
    }

    /// Whether the id refers to a level in this catalog.
    pub fn contains(&self, id: LevelId) -> bool {
        self.get(id).is_some()
    }

    /// Number of levels.
    pub fn count(&self) -> usize {
        self.levels.len()
    }

    /// Levels in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter()
    }

    /// The five levels that ship with the game.
    pub fn builtin() -> Self {
        Self {
            levels: builtin_levels(),
        }
    }
}

fn builtin_levels() -> Vec<Level> {
    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    vec![
        Level {
            id: LevelId::new(1),
            title: "Hello Python".to_string(),
            concepts: "print, variables".to_string(),
            dialogue: "Welcome to Python! Let's start with a simple greeting.".to_string(),
            instructions: "Write a Python program that prints 'Hello, World!' to the console."
                .to_string(),
            starting_code: "# Write your code here\n".to_string(),
            hints: strings(&[
                "Use the print() function to display text",
                "Put your text in quotes: print('Hello, World!')",
                "Make sure the text matches exactly: 'Hello, World!'",
            ]),
            solution: Some("print('Hello, World!')".to_string()),
            expected_output: Some("Hello, World!".to_string()),
            success_condition: None,
        },
        Level {
            id: LevelId::new(2),
            title: "Variables & Math".to_string(),
            concepts: "variables, arithmetic".to_string(),
            dialogue: "Great job! Now let's learn about variables and math.".to_string(),
            instructions:
                "Create two variables 'a' and 'b' with values 5 and 3, then print their sum."
                    .to_string(),
            starting_code: "# Create variables and calculate\n".to_string(),
            hints: strings(&[
                "Create variables: a = 5 and b = 3",
                "Add them together: a + b",
                "Print the result: print(a + b)",
            ]),
            solution: Some("a = 5\nb = 3\nprint(a + b)".to_string()),
            expected_output: Some("8".to_string()),
            success_condition: None,
        },
        Level {
            id: LevelId::new(3),
            title: "User Input".to_string(),
            concepts: "input, strings".to_string(),
            dialogue: "Now let's make our programs interactive!".to_string(),
            instructions: "Ask the user for their name and greet them personally. \
                           The greeting should start with 'Hello,'"
                .to_string(),
            starting_code: "# Get user input and greet them\n".to_string(),
            hints: strings(&[
                "Use input() to get user input",
                "Store the result in a variable: name = input('What is your name? ')",
                "Use f-strings or concatenation to create the greeting: print(f'Hello, {name}!')",
            ]),
            solution: Some(
                "name = input('What is your name? ')\nprint(f'Hello, {name}!')".to_string(),
            ),
            expected_output: None,
            success_condition: Some(SuccessCondition::Contains {
                needle: "Hello,".to_string(),
                min_chars: 7,
            }),
        },
        Level {
            id: LevelId::new(4),
            title: "Conditions".to_string(),
            concepts: "if statements, comparison".to_string(),
            dialogue: "Time to make decisions in your code!".to_string(),
            instructions: "Write a program that checks if a number is positive, negative, or zero. \
                           Use the variable 'number = 5' and print 'positive', 'negative', or 'zero'."
                .to_string(),
            starting_code: "number = 5\n# Write your if-elif-else logic here\n".to_string(),
            hints: strings(&[
                "Use if, elif, and else statements",
                "Compare with 0: if number > 0:",
                "Don't forget the colons and indentation",
            ]),
            solution: Some(
                "number = 5\nif number > 0:\n    print('positive')\nelif number < 0:\n    print('negative')\nelse:\n    print('zero')"
                    .to_string(),
            ),
            expected_output: Some("positive".to_string()),
            success_condition: None,
        },
        Level {
            id: LevelId::new(5),
            title: "Loops".to_string(),
            concepts: "for loops, range".to_string(),
            dialogue: "Let's learn about repetition with loops!".to_string(),
            instructions: "Use a for loop to print numbers from 1 to 5, each on a new line."
                .to_string(),
            starting_code: "# Write a for loop here\n".to_string(),
            hints: strings(&[
                "Use range(1, 6) to get numbers 1 to 5",
                "for i in range(1, 6):",
                "Print each number: print(i)",
            ]),
            solution: Some("for i in range(1, 6):\n    print(i)".to_string()),
            expected_output: Some("1\n2\n3\n4\n5".to_string()),
            success_condition: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_valid() {
        let builtin = LevelCatalog::builtin();
        let rebuilt = LevelCatalog::new(builtin.iter().cloned().collect()).unwrap();
        assert_eq!(rebuilt.count(), 5);
        assert_eq!(rebuilt.get(LevelId::new(5)).unwrap().title, "Loops");
        assert!(rebuilt.get(LevelId::new(0)).is_none());
        assert!(rebuilt.get(LevelId::new(6)).is_none());
    }

    #[test]
    fn test_builtin_solutions_pass() {
        let catalog = LevelCatalog::builtin();
        let sample_outputs = [
            "Hello, World!\n",
            "8\n",
            "What is your name? Hello, Ada!\n",
            "positive\n",
            "1\n2\n3\n4\n5\n",
        ];
        for (level, output) in catalog.iter().zip(sample_outputs) {
            assert!(level.is_solved_by(output), "level {} rejected {:?}", level.id, output);
        }
    }

    #[test]
    fn test_rejects_gaps() {
        let mut levels: Vec<Level> = LevelCatalog::builtin().iter().cloned().collect();
        levels.remove(1);
        match LevelCatalog::new(levels) {
            Err(CatalogError::NonDenseIds { expected, found }) => {
                assert_eq!(expected, LevelId::new(2));
                assert_eq!(found, LevelId::new(3));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(LevelCatalog::new(vec![]), Err(CatalogError::Empty)));
    }

    #[test]
    fn test_rejects_unsolvable_level() {
        let mut levels: Vec<Level> = LevelCatalog::builtin().iter().cloned().collect();
        levels[0].expected_output = None;
        assert!(matches!(
            LevelCatalog::new(levels),
            Err(CatalogError::MissingSuccessCheck(id)) if id == LevelId::FIRST
        ));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("levels.json");
        std::fs::write(
            &path,
            r#"[
                {"id": 2, "title": "Two", "instructions": "print 2", "expectedOutput": "2"},
                {"id": 1, "title": "One", "instructions": "print 1", "expectedOutput": "1",
                 "hints": ["print(1)"]}
            ]"#,
        )
        .unwrap();

        let catalog = LevelCatalog::from_path(&path).unwrap();
        assert_eq!(catalog.count(), 2);
        assert_eq!(catalog.get(LevelId::FIRST).unwrap().hints.len(), 1);
        assert!(catalog.get(LevelId::new(2)).unwrap().is_solved_by("2"));
    }
}
