//! OpenAI-compatible chat-completions client, pointed at OpenRouter by default.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{Generation, ProviderError, TextGenerator, TokenUsage};

/// Base URL of the OpenRouter API.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default limit for one HTTP request, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;

/// Connection settings for [`OpenRouterClient`].
#[derive(Clone)]
pub struct OpenRouterConfig {
    /// Bearer token sent with every request.
    pub api_key: String,
    /// API root; `/chat/completions` is appended.
    pub base_url: String,
    /// Limit for one request, from connect to the last body byte.
    pub timeout: Duration,
}

impl std::fmt::Debug for OpenRouterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenRouterConfig {
    /// Creates a config for the public OpenRouter endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }

    /// Overrides the API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for an OpenAI-compatible chat-completions API.
pub struct OpenRouterClient {
    config: OpenRouterConfig,
    client: reqwest::Client,
}

impl OpenRouterClient {
    /// Creates a client whose requests give up after `config.timeout`.
    pub fn new(config: OpenRouterConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Configuration(e.to_string()))?;
        Ok(Self::with_client(config, client))
    }

    /// Creates a client reusing an existing `reqwest::Client`.
    ///
    /// The caller's client keeps its own timeout settings.
    #[must_use]
    pub const fn with_client(config: OpenRouterConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.config.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|e| ProviderError::InvalidRequest(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn transport_error(err: &reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Network(format!("request timed out: {err}"))
        } else {
            ProviderError::Network(err.to_string())
        }
    }

    fn map_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> ProviderError {
        match status.as_u16() {
            401 | 403 => ProviderError::Authentication(body.to_string()),
            429 => ProviderError::RateLimited { retry_after },
            400 | 404 | 422 => ProviderError::InvalidRequest(body.to_string()),
            code => ProviderError::Api {
                status: code,
                message: body.to_string(),
            },
        }
    }

    fn parse_response(body: &str, requested_model: &str) -> Result<Generation, ProviderError> {
        let response: ChatResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let model = response
            .model
            .unwrap_or_else(|| requested_model.to_string());
        let choice = response.choices.into_iter().next();
        let finish_reason = choice.as_ref().and_then(|c| c.finish_reason.clone());
        let text = choice
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::EmptyResponse {
                model: model.clone(),
            })?;

        Ok(Generation {
            text,
            model,
            finish_reason,
            usage: response.usage,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenRouterClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<Generation, ProviderError> {
        let payload = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(model = %model, prompt_chars = prompt.len(), "Sending chat completion");
        let response = self
            .client
            .post(self.endpoint())
            .headers(self.build_headers()?)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let text = response
            .text()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        if !status.is_success() {
            return Err(Self::map_error(status, retry_after, &text));
        }

        Self::parse_response(&text, model)
    }
}
