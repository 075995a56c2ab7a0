//! Keyword-based task complexity estimation for agent requests.

use serde::{Deserialize, Serialize};

const COMPLEX_KEYWORDS: &[&str] = &[
    "research",
    "comprehensive",
    "architecture",
    "multi-step",
    "in-depth",
    "detailed analysis",
    "strategy",
    "optimize",
    "refactor",
    "investigate",
    "end-to-end",
    "system design",
];

const MODERATE_KEYWORDS: &[&str] = &[
    "review",
    "summarize",
    "compare",
    "explain",
    "analyze",
    "evaluate",
    "outline",
    "draft",
    "translate",
    "classify",
];

/// Outcome of scoring a task description.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Complexity {
    pub complex_matches: usize,
    pub moderate_matches: usize,
    pub length: usize,
    pub multiplier: f64,
}

impl Complexity {
    /// Score `task`: 2.5 with two complex keywords or more than 500
    /// characters, 1.5 with one complex keyword, two moderate keywords or
    /// more than 200 characters, else 1.0. Each keyword counts once.
    pub fn assess(task: &str) -> Self {
        let lower = task.to_lowercase();
        let count = |keywords: &[&str]| keywords.iter().filter(|k| lower.contains(*k)).count();

        let complex_matches = count(COMPLEX_KEYWORDS);
        let moderate_matches = count(MODERATE_KEYWORDS);
        let length = task.chars().count();

        let multiplier = if complex_matches >= 2 || length > 500 {
            2.5
        } else if complex_matches >= 1 || moderate_matches >= 2 || length > 200 {
            1.5
        } else {
            1.0
        };

        Self {
            complex_matches,
            moderate_matches,
            length,
            multiplier,
        }
    }
}
