//! Sinks that receive workflow progress events.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, Level};

use crate::core::StageKind;

/// Receives progress events from the pipeline and the workflow.
///
/// Event names are the constants in [`crate::events`]. Payloads are small
/// JSON objects that carry at least a `stage` field for stage and artifact
/// events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers an event.
    async fn emit(&self, event_type: &str, data: Option<Value>);

    /// Delivers an event without awaiting. Must never fail.
    fn try_emit(&self, event_type: &str, data: Option<Value>);
}

/// Reads the `stage` field of an event payload.
#[must_use]
pub fn event_stage(data: Option<&Value>) -> Option<StageKind> {
    serde_json::from_value(data?.get("stage")?.clone()).ok()
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<Value>) {}

    fn try_emit(&self, _event_type: &str, _data: Option<Value>) {}
}

/// Forwards events to `tracing` at a fixed level.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl LoggingEventSink {
    /// Logs at `level`; anything other than `DEBUG` logs at info.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// Logs at debug.
    #[must_use]
    pub const fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log(&self, event_type: &str, data: Option<&Value>) {
        let stage = event_stage(data).map_or("-", |s| s.as_str());
        if self.level == Level::DEBUG {
            debug!(event = %event_type, stage, payload = ?data, "Workflow event");
        } else {
            info!(event = %event_type, stage, "Workflow event");
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.log(event_type, data.as_ref());
    }

    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        self.log(event_type, data.as_ref());
    }
}

/// One event captured by [`CollectingEventSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// The event name.
    pub event_type: String,
    /// The payload, if any.
    pub data: Option<Value>,
}

impl RecordedEvent {
    /// The stage the event refers to, if its payload names one.
    #[must_use]
    pub fn stage(&self) -> Option<StageKind> {
        event_stage(self.data.as_ref())
    }
}

/// Keeps every event in arrival order. Used by tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event received so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Number of events received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// True until the first event arrives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Events whose name equals `event_type`.
    #[must_use]
    pub fn events_of_type(&self, event_type: &str) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Stages named by the `event_type` events, in arrival order.
    #[must_use]
    pub fn stages_for(&self, event_type: &str) -> Vec<StageKind> {
        self.events_of_type(event_type)
            .iter()
            .filter_map(RecordedEvent::stage)
            .collect()
    }

    fn record(&self, event_type: &str, data: Option<Value>) {
        self.events.lock().push(RecordedEvent {
            event_type: event_type.to_string(),
            data,
        });
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.record(event_type, data);
    }

    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        self.record(event_type, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ARTIFACT_SAVED, STAGE_COMPLETED, STAGE_STARTED};
    use serde_json::json;

    #[test]
    fn test_event_stage() {
        assert_eq!(
            event_stage(Some(&json!({"stage": "review"}))),
            Some(StageKind::Review)
        );
        assert_eq!(event_stage(Some(&json!({"stage": "proofread"}))), None);
        assert_eq!(event_stage(Some(&json!({"files": []}))), None);
        assert_eq!(event_stage(None), None);
    }

    #[tokio::test]
    async fn test_noop_and_logging_sinks_accept_anything() {
        NoOpEventSink.emit(STAGE_STARTED, None).await;
        NoOpEventSink.try_emit(STAGE_STARTED, Some(json!({"x": 1})));

        let sink = LoggingEventSink::debug();
        sink.emit(STAGE_STARTED, Some(json!({"stage": "generate"}))).await;
        LoggingEventSink::default().try_emit(ARTIFACT_SAVED, None);
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(STAGE_STARTED, Some(json!({"stage": "generate"}))).await;
        sink.try_emit(STAGE_COMPLETED, Some(json!({"stage": "generate"})));
        sink.emit(STAGE_STARTED, Some(json!({"stage": "review"}))).await;
        sink.emit(ARTIFACT_SAVED, None).await;

        assert_eq!(sink.len(), 4);
        assert_eq!(sink.events_of_type(STAGE_STARTED).len(), 2);
        assert_eq!(
            sink.stages_for(STAGE_STARTED),
            vec![StageKind::Generate, StageKind::Review]
        );
        assert_eq!(sink.events()[3].stage(), None);
    }
}
