//! Progress events emitted while a workflow runs.
//!
//! The library never prints. Callers decide how to surface progress by
//! plugging in an [`EventSink`].

mod sink;

pub use sink::{
    event_stage, CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent,
};

/// A stage has started.
pub const STAGE_STARTED: &str = "stage.started";
/// A stage returned a result.
pub const STAGE_COMPLETED: &str = "stage.completed";
/// A stage failed terminally.
pub const STAGE_FAILED: &str = "stage.failed";
/// A stage output was written to disk.
pub const ARTIFACT_SAVED: &str = "artifact.saved";
/// All three stages finished and were saved.
pub const WORKFLOW_COMPLETED: &str = "workflow.completed";
