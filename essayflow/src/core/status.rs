//! Stage kind enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three stages of an essay workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Produce the first draft from the topic.
    Generate,
    /// Critique the draft.
    Review,
    /// Rewrite the draft using the critique.
    Revise,
}

impl StageKind {
    /// All stages in execution order.
    pub const ALL: [Self; 3] = [Self::Generate, Self::Review, Self::Revise];

    /// Returns the stage name used in logs and events.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Review => "review",
            Self::Revise => "revise",
        }
    }

    /// Returns the 1-based position of the stage in the pipeline.
    #[must_use]
    pub const fn step(&self) -> usize {
        match self {
            Self::Generate => 1,
            Self::Review => 2,
            Self::Revise => 3,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
