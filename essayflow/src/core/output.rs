//! Stage result and pipeline run types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::EssayRequest;

/// The output of one pipeline stage.
///
/// Immutable once returned; its `text` becomes the input of the next stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    /// The generated text.
    pub text: String,
    /// The model identifier the stage was configured with.
    pub model: String,
}

impl StageResult {
    /// Creates a new stage result.
    #[must_use]
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
        }
    }
}

/// The three results of one complete workflow invocation.
///
/// Lives only in memory for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Unique identifier for the run.
    pub run_id: Uuid,
    /// The request the run was started with.
    pub request: EssayRequest,
    /// Output of the generate stage.
    pub essay: StageResult,
    /// Output of the review stage.
    pub feedback: StageResult,
    /// Output of the revise stage.
    pub revision: StageResult,
}
