//! Error types for essayflow.
//!
//! Configuration problems are fatal and raised before any stage runs.
//! Provider failures travel up through the pipeline unchanged.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::core::StageKind;
use crate::providers::ProviderError;

/// The main error type for essayflow operations.
#[derive(Debug, Error)]
pub enum EssayflowError {
    /// A required setting was missing or invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The text-generation call failed terminally.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The request handed to the pipeline was unusable.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The run was cancelled while a stage was in flight.
    #[error("Pipeline cancelled during {stage} stage: {reason}")]
    Cancelled {
        /// The stage that was interrupted.
        stage: StageKind,
        /// The cancellation reason.
        reason: String,
    },

    /// A stage output could not be written to disk.
    #[error("Failed to save markdown file {}: {source}", path.display())]
    Artifact {
        /// The file that could not be written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl EssayflowError {
    /// Creates an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Creates a cancellation error.
    #[must_use]
    pub fn cancelled(stage: StageKind, reason: impl Into<String>) -> Self {
        Self::Cancelled {
            stage,
            reason: reason.into(),
        }
    }

    /// Returns true if the error came from the text-generation provider.
    #[must_use]
    pub const fn is_provider(&self) -> bool {
        matches!(self, Self::Provider(_))
    }

    /// Returns true if the run was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
