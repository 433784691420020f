//! The generate → review → revise pipeline.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::prompts;
use super::retry::{with_retry_hinted, RetryPolicy};
use crate::cancellation::CancellationToken;
use crate::config::ModelConfig;
use crate::core::{PipelineRun, StageKind, StageResult};
use crate::errors::EssayflowError;
use crate::events::{self, EventSink, NoOpEventSink};
use crate::providers::{ProviderError, TextGenerator};

/// What to write about, and in which language.
///
/// Validated at construction: the topic is trimmed and must not be blank,
/// and a blank language is treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssayRequest {
    topic: String,
    language: Option<String>,
}

impl EssayRequest {
    /// Creates a request, rejecting a blank topic.
    pub fn new(
        topic: impl Into<String>,
        language: Option<String>,
    ) -> Result<Self, EssayflowError> {
        let topic = topic.into().trim().to_string();
        if topic.is_empty() {
            return Err(EssayflowError::invalid_request("essay prompt must not be empty"));
        }
        let language = language
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        Ok(Self { topic, language })
    }

    /// The essay topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The target language, if any.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

/// Runs the three essay stages against a [`TextGenerator`].
///
/// Each stage is one remote call wrapped by the retry executor. Stages hold
/// no state between calls; everything they need is passed in.
pub struct EssayPipeline {
    generator: Arc<dyn TextGenerator>,
    models: ModelConfig,
    retry: RetryPolicy,
    events: Arc<dyn EventSink>,
    cancel: Arc<CancellationToken>,
}

impl std::fmt::Debug for EssayPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EssayPipeline")
            .field("models", &self.models)
            .field("retry", &self.retry)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl EssayPipeline {
    /// Creates a pipeline with no event sink and a fresh cancellation token.
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, models: ModelConfig, retry: RetryPolicy) -> Self {
        Self {
            generator,
            models,
            retry,
            events: Arc::new(NoOpEventSink),
            cancel: Arc::new(CancellationToken::new()),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Shares a cancellation token with the caller.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: Arc<CancellationToken>) -> Self {
        self.cancel = cancel;
        self
    }

    /// The configured models.
    #[must_use]
    pub const fn models(&self) -> &ModelConfig {
        &self.models
    }

    /// The cancellation token stages race against.
    #[must_use]
    pub fn cancellation(&self) -> Arc<CancellationToken> {
        self.cancel.clone()
    }

    /// Writes the first draft.
    pub async fn generate(&self, request: &EssayRequest) -> Result<StageResult, EssayflowError> {
        let prompt = prompts::essay_prompt(request.topic(), request.language());
        self.run_stage(StageKind::Generate, &self.models.essay_model, prompt)
            .await
    }

    /// Critiques `essay` against the request's topic.
    pub async fn review(
        &self,
        request: &EssayRequest,
        essay: &str,
    ) -> Result<StageResult, EssayflowError> {
        let prompt = prompts::review_prompt(essay, request.topic(), request.language());
        self.run_stage(StageKind::Review, &self.models.review_model, prompt)
            .await
    }

    /// Rewrites `essay` taking `feedback` into account.
    pub async fn revise(
        &self,
        request: &EssayRequest,
        essay: &str,
        feedback: &str,
    ) -> Result<StageResult, EssayflowError> {
        let prompt =
            prompts::revision_prompt(essay, feedback, request.topic(), request.language());
        self.run_stage(StageKind::Revise, &self.models.essay_model, prompt)
            .await
    }

    /// Runs all three stages in order, feeding each output forward.
    ///
    /// The first unrecovered failure aborts the remaining stages.
    pub async fn run(&self, request: EssayRequest) -> Result<PipelineRun, EssayflowError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("essay_pipeline", run_id = %run_id);

        async {
            let essay = self.generate(&request).await?;
            let feedback = self.review(&request, &essay.text).await?;
            let revision = self.revise(&request, &essay.text, &feedback.text).await?;

            Ok::<_, EssayflowError>(PipelineRun {
                run_id,
                request,
                essay,
                feedback,
                revision,
            })
        }
        .instrument(span)
        .await
    }

    async fn run_stage(
        &self,
        stage: StageKind,
        model: &str,
        prompt: String,
    ) -> Result<StageResult, EssayflowError> {
        let span = info_span!("stage", stage = %stage, model = %model);

        async {
            self.events
                .emit(
                    events::STAGE_STARTED,
                    Some(serde_json::json!({
                        "stage": stage,
                        "step": stage.step(),
                        "model": model,
                    })),
                )
                .await;

            let call = with_retry_hinted(
                &self.retry,
                stage.as_str(),
                || self.generator.generate(model, &prompt),
                ProviderError::is_transient,
                ProviderError::retry_after,
            );

            let outcome = tokio::select! {
                biased;
                reason = self.cancel.cancelled() => Err(EssayflowError::cancelled(stage, reason)),
                result = call => result.map_err(EssayflowError::from),
            };

            match outcome {
                Ok(generation) => {
                    info!(
                        chars = generation.text.len(),
                        served_by = %generation.model,
                        finish_reason = generation.finish_reason.as_deref(),
                        total_tokens = generation.usage.map(|u| u.total_tokens),
                        "Stage completed"
                    );
                    self.events
                        .emit(
                            events::STAGE_COMPLETED,
                            Some(serde_json::json!({
                                "stage": stage,
                                "step": stage.step(),
                                "model": model,
                            })),
                        )
                        .await;
                    Ok(StageResult::new(generation.text, model))
                }
                Err(err) => {
                    self.events
                        .emit(
                            events::STAGE_FAILED,
                            Some(serde_json::json!({
                                "stage": stage,
                                "error": err.to_string(),
                            })),
                        )
                        .await;
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{Generation, MockTextGenerator, TokenUsage};
    use mockall::Sequence;

    fn policy() -> RetryPolicy {
        RetryPolicy::new()
            .with_max_attempts(3)
            .with_initial_delay_ms(0)
            .with_max_delay_ms(0)
    }

    fn models() -> ModelConfig {
        ModelConfig::new("writer", "critic")
    }

    #[test]
    fn test_request_rejects_blank_topic() {
        let err = EssayRequest::new("   ", None).unwrap_err();
        assert!(matches!(err, EssayflowError::InvalidRequest(_)));
    }

    #[test]
    fn test_request_normalizes_language() {
        let request = EssayRequest::new(" Tides ", Some("  ".to_string())).unwrap();
        assert_eq!(request.topic(), "Tides");
        assert_eq!(request.language(), None);

        let request = EssayRequest::new("Tides", Some("German".to_string())).unwrap();
        assert_eq!(request.language(), Some("German"));
    }

    #[tokio::test]
    async fn test_generate_uses_essay_model() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .withf(|model, prompt| {
                model == "writer" && prompt.contains("Climate change") && prompt.contains("Spanish")
            })
            .times(1)
            .returning(|_, _| Ok(Generation::new("Un ensayo.", "provider/writer-v2")));

        let pipeline = EssayPipeline::new(Arc::new(mock), models(), policy());
        let request = EssayRequest::new("Climate change", Some("Spanish".into())).unwrap();
        let result = pipeline.generate(&request).await.unwrap();

        assert_eq!(result, StageResult::new("Un ensayo.", "writer"));
    }

    #[tokio::test]
    async fn test_review_uses_review_model() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .withf(|model, prompt| model == "critic" && prompt.contains("Draft text"))
            .times(1)
            .returning(|_, _| Ok(Generation::new("Needs work.", "critic")));

        let pipeline = EssayPipeline::new(Arc::new(mock), models(), policy());
        let request = EssayRequest::new("Topic", None).unwrap();
        let result = pipeline.review(&request, "Draft text").await.unwrap();

        assert_eq!(result.model, "critic");
        assert_eq!(result.text, "Needs work.");
    }

    #[tokio::test]
    async fn test_generation_metadata_does_not_leak_into_result() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate().times(1).returning(|_, _| {
            let mut generation = Generation::new("Revised.", "provider/writer-v2");
            generation.finish_reason = Some("length".into());
            generation.usage = Some(TokenUsage {
                prompt_tokens: 900,
                completion_tokens: 100,
                total_tokens: 1000,
            });
            Ok(generation)
        });

        let pipeline = EssayPipeline::new(Arc::new(mock), models(), policy());
        let request = EssayRequest::new("Topic", None).unwrap();
        let result = pipeline.revise(&request, "Draft", "Notes").await.unwrap();

        assert_eq!(result, StageResult::new("Revised.", "writer"));
    }

    #[tokio::test]
    async fn test_transient_error_is_retried() {
        let mut seq = Sequence::new();
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(ProviderError::Network("reset".into())));
        mock.expect_generate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(Generation::new("Finally.", "writer")));

        let pipeline = EssayPipeline::new(Arc::new(mock), models(), policy());
        let request = EssayRequest::new("Topic", None).unwrap();

        assert_eq!(pipeline.generate(&request).await.unwrap().text, "Finally.");
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .times(1)
            .returning(|_, _| Err(ProviderError::Authentication("bad key".into())));

        let pipeline = EssayPipeline::new(Arc::new(mock), models(), policy());
        let request = EssayRequest::new("Topic", None).unwrap();
        let err = pipeline.generate(&request).await.unwrap_err();

        assert!(matches!(
            err,
            EssayflowError::Provider(ProviderError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_stage() {
        let mock = MockTextGenerator::new();
        let cancel = Arc::new(CancellationToken::new());
        cancel.cancel("user interrupt");

        let pipeline =
            EssayPipeline::new(Arc::new(mock), models(), policy()).with_cancellation(cancel);
        let request = EssayRequest::new("Topic", None).unwrap();
        let err = pipeline.generate(&request).await.unwrap_err();

        assert!(err.is_cancelled());
        assert!(err.to_string().contains("user interrupt"));
    }
}
