//! # Essayflow
//!
//! Generate an essay from a prompt, have it critiqued, then revise it using
//! the critique, all against a remote text-generation API.
//!
//! Essayflow provides:
//!
//! - **Retry executor**: bounded exponential backoff around any async call
//! - **Essay pipeline**: strictly sequential generate → review → revise stages
//! - **Providers**: a pluggable text-generation trait with an OpenRouter client
//! - **Artifacts**: timestamped markdown files for each stage output
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use essayflow::prelude::*;
//! use std::sync::Arc;
//!
//! let config = AppConfig::from_env()?;
//! let client = Arc::new(OpenRouterClient::new(config.provider_config())?);
//! let pipeline = EssayPipeline::new(client, config.models.clone(), config.retry);
//!
//! let run = pipeline.run(EssayRequest::new("Climate change", None)?).await?;
//! println!("{}", run.revision.text);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod artifacts;
pub mod cancellation;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod pipeline;
pub mod providers;
pub mod testing;
pub mod utils;
pub mod workflow;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::artifacts::{ArtifactWriter, SavedArtifact};
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{AppConfig, ConfigError, ModelConfig};
    pub use crate::core::{PipelineRun, StageKind, StageResult};
    pub use crate::errors::EssayflowError;
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::pipeline::{
        with_retry, with_retry_if, EssayPipeline, EssayRequest, RetryPolicy,
    };
    pub use crate::providers::{
        Generation, OpenRouterClient, OpenRouterConfig, ProviderError, TextGenerator,
    };
    pub use crate::workflow::{EssayWorkflow, WorkflowReport};
}
