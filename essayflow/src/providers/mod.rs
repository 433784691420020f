//! Text-generation providers.
//!
//! The pipeline only sees the [`TextGenerator`] trait. Transport,
//! authentication and model routing live behind it.

mod openrouter;

pub use openrouter::{
    OpenRouterClient, OpenRouterConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_MS,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    #[serde(default)]
    pub completion_tokens: u32,
    /// Total tokens billed.
    #[serde(default)]
    pub total_tokens: u32,
}

/// A single completed generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    /// The generated text.
    pub text: String,
    /// The model that served the request, as reported by the provider.
    pub model: String,
    /// Why the model stopped, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    /// Token usage, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl Generation {
    /// Creates a generation with just text and model.
    #[must_use]
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            finish_reason: None,
            usage: None,
        }
    }
}

/// Errors returned by a text-generation provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Credentials were rejected.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The provider asked us to slow down.
    #[error("Rate limit exceeded: retry after {retry_after:?}s")]
    RateLimited {
        /// Seconds suggested by the `Retry-After` header.
        retry_after: Option<u64>,
    },

    /// The request itself was rejected.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Any other non-success HTTP status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The request never completed.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The client could not be set up.
    #[error("Provider configuration error: {0}")]
    Configuration(String),

    /// The response carried no text.
    #[error("Empty response from model {model}")]
    EmptyResponse {
        /// The model that was asked.
        model: String,
    },
}

impl ProviderError {
    /// Returns true if a later attempt could plausibly succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network(_)
            | Self::RateLimited { .. }
            | Self::InvalidResponse(_)
            | Self::EmptyResponse { .. } => true,
            Self::Api { status, .. } => *status >= 500 || *status == 408,
            Self::Authentication(_) | Self::InvalidRequest(_) | Self::Configuration(_) => false,
        }
    }

    /// The wait the provider asked for before the next attempt, if any.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited {
                retry_after: Some(secs),
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

/// A remote text-generation capability.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Sends a single user prompt to `model` and returns the completion.
    async fn generate(&self, model: &str, prompt: &str) -> Result<Generation, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Network("reset".into()).is_transient());
        assert!(ProviderError::RateLimited { retry_after: Some(3) }.is_transient());
        assert!(ProviderError::Api { status: 502, message: String::new() }.is_transient());
        assert!(ProviderError::Api { status: 408, message: String::new() }.is_transient());
        assert!(ProviderError::EmptyResponse { model: "m".into() }.is_transient());

        assert!(!ProviderError::Authentication("bad key".into()).is_transient());
        assert!(!ProviderError::InvalidRequest("bad".into()).is_transient());
        assert!(!ProviderError::Api { status: 402, message: String::new() }.is_transient());
        assert!(!ProviderError::Configuration("tls".into()).is_transient());
    }

    #[test]
    fn test_retry_after_only_from_rate_limit() {
        assert_eq!(
            ProviderError::RateLimited { retry_after: Some(7) }.retry_after(),
            Some(Duration::from_secs(7))
        );
        assert_eq!(ProviderError::RateLimited { retry_after: None }.retry_after(), None);
        assert_eq!(ProviderError::Network("reset".into()).retry_after(), None);
    }

    #[test]
    fn test_generation_new() {
        let generation = Generation::new("hello", "model-x");
        assert_eq!(generation.text, "hello");
        assert_eq!(generation.model, "model-x");
        assert!(generation.usage.is_none());
    }

    #[tokio::test]
    async fn test_mock_generator() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .withf(|model, prompt| model == "m" && prompt.contains("topic"))
            .times(1)
            .returning(|model, _| Ok(Generation::new("done", model)));

        let generation = mock.generate("m", "a topic").await.unwrap();
        assert_eq!(generation.text, "done");
    }
}
