//! End-to-end essay workflow: run each stage, then persist its output.
//!
//! Files are written as soon as their stage succeeds, so a failure in a later
//! stage still leaves the earlier outputs on disk.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::artifacts::{
    artifact_filename, render_essay, render_feedback, render_revision, ArtifactWriter,
    SavedArtifact,
};
use crate::core::{StageKind, StageResult};
use crate::errors::EssayflowError;
use crate::events::{self, EventSink, NoOpEventSink};
use crate::pipeline::{EssayPipeline, EssayRequest};
use crate::utils::{file_timestamp, iso_timestamp, now_utc};

/// The three files produced by a successful workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowReport {
    /// The first draft.
    pub essay: SavedArtifact,
    /// The review.
    pub feedback: SavedArtifact,
    /// The revised essay.
    pub revision: SavedArtifact,
}

impl WorkflowReport {
    /// Iterates the saved artifacts in stage order.
    pub fn artifacts(&self) -> impl Iterator<Item = &SavedArtifact> {
        [&self.essay, &self.feedback, &self.revision].into_iter()
    }
}

/// Drives an [`EssayPipeline`] and writes each stage's output to disk.
pub struct EssayWorkflow {
    pipeline: EssayPipeline,
    writer: ArtifactWriter,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for EssayWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EssayWorkflow")
            .field("pipeline", &self.pipeline)
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}

impl EssayWorkflow {
    /// Creates a workflow writing into `writer`'s directory.
    #[must_use]
    pub fn new(pipeline: EssayPipeline, writer: ArtifactWriter) -> Self {
        Self {
            pipeline,
            writer,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the sink that receives `artifact.saved` and completion events.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// The underlying pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &EssayPipeline {
        &self.pipeline
    }

    /// Runs generate → review → revise, saving after every stage.
    pub async fn run(&self, request: &EssayRequest) -> Result<WorkflowReport, EssayflowError> {
        let timestamp = file_timestamp(&now_utc());
        info!(
            topic = %request.topic(),
            language = request.language().unwrap_or("default"),
            "Starting essay workflow"
        );

        let essay = self.pipeline.generate(request).await?;
        let essay_doc = render_essay(&essay, request.topic(), &iso_timestamp(&now_utc()));
        let saved_essay = self
            .persist(StageKind::Generate, &timestamp, &essay, &essay_doc)
            .await?;

        let feedback = self.pipeline.review(request, &essay.text).await?;
        let feedback_doc =
            render_feedback(&feedback, &essay.model, &iso_timestamp(&now_utc()));
        let saved_feedback = self
            .persist(StageKind::Review, &timestamp, &feedback, &feedback_doc)
            .await?;

        let revision = self
            .pipeline
            .revise(request, &essay.text, &feedback.text)
            .await?;
        let revision_doc = render_revision(&revision, request.topic(), &iso_timestamp(&now_utc()));
        let saved_revision = self
            .persist(StageKind::Revise, &timestamp, &revision, &revision_doc)
            .await?;

        let report = WorkflowReport {
            essay: saved_essay,
            feedback: saved_feedback,
            revision: saved_revision,
        };
        let files: Vec<String> = report
            .artifacts()
            .map(|a| a.path.display().to_string())
            .collect();
        self.events
            .emit(
                events::WORKFLOW_COMPLETED,
                Some(serde_json::json!({ "files": files })),
            )
            .await;
        Ok(report)
    }

    async fn persist(
        &self,
        stage: StageKind,
        timestamp: &str,
        result: &StageResult,
        document: &str,
    ) -> Result<SavedArtifact, EssayflowError> {
        let filename = artifact_filename(stage, timestamp);
        let path = self.writer.save(&filename, document).await?;

        self.events
            .emit(
                events::ARTIFACT_SAVED,
                Some(serde_json::json!({
                    "stage": stage,
                    "path": path.display().to_string(),
                })),
            )
            .await;

        Ok(SavedArtifact {
            content: result.text.clone(),
            model: result.model.clone(),
            filename,
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::events::CollectingEventSink;
    use crate::pipeline::RetryPolicy;
    use crate::providers::ProviderError;
    use crate::testing::ScriptedGenerator;

    fn pipeline(generator: Arc<ScriptedGenerator>) -> EssayPipeline {
        EssayPipeline::new(
            generator,
            ModelConfig::new("writer", "critic"),
            RetryPolicy::new().with_max_attempts(1),
        )
    }

    #[tokio::test]
    async fn test_run_writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(ScriptedGenerator::with_responses(["draft", "notes", "final"]));
        let sink = Arc::new(CollectingEventSink::new());
        let workflow = EssayWorkflow::new(pipeline(generator), ArtifactWriter::new(dir.path()))
            .with_events(sink.clone());

        let request = EssayRequest::new("Bridges", None).unwrap();
        let report = workflow.run(&request).await.unwrap();

        let stamp = |name: &str, prefix: &str| {
            name.strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(".md"))
                .unwrap()
                .to_string()
        };
        let essay_ts = stamp(&report.essay.filename, "essay-");
        assert_eq!(essay_ts.len(), "2025-01-02T03-04-05".len());
        assert_eq!(stamp(&report.feedback.filename, "feedback-"), essay_ts);
        assert_eq!(stamp(&report.revision.filename, "essay-updated-"), essay_ts);
        assert_eq!(report.essay.content, "draft");
        assert_eq!(report.feedback.model, "critic");

        let essay_doc = tokio::fs::read_to_string(&report.essay.path).await.unwrap();
        assert!(essay_doc.starts_with("# Essay\n\n**Model:** writer\n"));
        assert!(essay_doc.contains("**Prompt:** Bridges\n"));
        assert!(essay_doc.ends_with("draft"));

        let feedback_doc = tokio::fs::read_to_string(&report.feedback.path).await.unwrap();
        assert!(feedback_doc.contains("**Original Essay Model:** writer"));

        let revision_doc = tokio::fs::read_to_string(&report.revision.path).await.unwrap();
        assert!(revision_doc.ends_with("final"));

        assert_eq!(sink.events_of_type(events::ARTIFACT_SAVED).len(), 3);
        assert_eq!(sink.events_of_type(events::WORKFLOW_COMPLETED).len(), 1);
    }

    #[tokio::test]
    async fn test_earlier_outputs_survive_later_failure() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(ScriptedGenerator::new());
        generator.push_ok("draft");
        generator.push_err(ProviderError::Authentication("revoked".into()));

        let workflow = EssayWorkflow::new(pipeline(generator), ArtifactWriter::new(dir.path()));
        let err = workflow
            .run(&EssayRequest::new("Bridges", None).unwrap())
            .await
            .unwrap_err();

        assert!(err.is_provider());
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("essay-"));
    }
}
