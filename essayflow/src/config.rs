//! Application configuration loaded from the process environment.
//!
//! Every setting is read and validated once, before any stage runs.
//! A `.env` file in the working directory is honored when present; real
//! environment variables take precedence over it.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::pipeline::retry::{
    RetryPolicy, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_MS,
};
use crate::providers::{OpenRouterConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_MS};

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
/// Environment variable naming the essay (generate/revise) model.
pub const ENV_ESSAY_MODEL: &str = "ESSAY_MODEL";
/// Environment variable naming the review model.
pub const ENV_REVIEW_MODEL: &str = "REVIEW_MODEL";
/// Environment variable overriding the API root.
pub const ENV_BASE_URL: &str = "OPENROUTER_BASE_URL";
/// Environment variable for the attempt budget.
pub const ENV_RETRY_ATTEMPTS: &str = "RETRY_ATTEMPTS";
/// Environment variable for the first retry delay in milliseconds.
pub const ENV_RETRY_DELAY: &str = "DEFAULT_RETRY_DELAY";
/// Environment variable for the retry delay ceiling in milliseconds.
pub const ENV_MAX_RETRY_DELAY: &str = "MAX_RETRY_DELAY";
/// Environment variable for the per-request HTTP timeout in milliseconds.
pub const ENV_REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT";
/// Environment variable for the output directory.
pub const ENV_OUTPUT_DIR: &str = "OUTPUT_DIR";

/// Default directory for generated markdown files.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is absent or blank.
    #[error("{key} is required")]
    Missing {
        /// The variable name.
        key: &'static str,
    },

    /// A variable is present but unusable.
    #[error("{key} {reason} (got {value:?})")]
    Invalid {
        /// The variable name.
        key: &'static str,
        /// The offending value.
        value: String,
        /// What was expected.
        reason: &'static str,
    },
}

impl ConfigError {
    /// Creates a missing-variable error.
    #[must_use]
    pub const fn missing(key: &'static str) -> Self {
        Self::Missing { key }
    }

    /// Creates an invalid-value error.
    #[must_use]
    pub fn invalid(key: &'static str, value: impl Into<String>, reason: &'static str) -> Self {
        Self::Invalid {
            key,
            value: value.into(),
            reason,
        }
    }
}

/// Model identifiers used by the pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    /// Model for the generate and revise stages.
    pub essay_model: String,
    /// Model for the review stage.
    pub review_model: String,
}

impl ModelConfig {
    /// Creates a model configuration.
    #[must_use]
    pub fn new(essay_model: impl Into<String>, review_model: impl Into<String>) -> Self {
        Self {
            essay_model: essay_model.into(),
            review_model: review_model.into(),
        }
    }
}

/// Fully validated application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// API key for the text-generation service.
    pub api_key: String,
    /// API root for the text-generation service.
    pub base_url: String,
    /// Stage models.
    pub models: ModelConfig,
    /// Retry budget applied to every stage.
    pub retry: RetryPolicy,
    /// Limit for a single HTTP request, in milliseconds.
    pub request_timeout_ms: u64,
    /// Directory for generated files.
    pub output_dir: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .field("retry", &self.retry)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl AppConfig {
    /// Loads `.env` (if any) and then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => debug!("Ignoring unreadable .env file: {}", e),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::missing(key));

        let api_key = required(ENV_API_KEY)?;
        let essay_model = required(ENV_ESSAY_MODEL)?;
        let review_model = required(ENV_REVIEW_MODEL)?;

        let max_attempts = match get(ENV_RETRY_ATTEMPTS) {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError::invalid(
                        ENV_RETRY_ATTEMPTS,
                        raw,
                        "must be a positive integer",
                    ))
                }
            },
            None => DEFAULT_MAX_ATTEMPTS,
        };
        let initial_delay_ms =
            parse_millis(get(ENV_RETRY_DELAY), ENV_RETRY_DELAY, DEFAULT_INITIAL_DELAY_MS)?;
        let max_delay_ms =
            parse_millis(get(ENV_MAX_RETRY_DELAY), ENV_MAX_RETRY_DELAY, DEFAULT_MAX_DELAY_MS)?;
        let request_timeout_ms = match get(ENV_REQUEST_TIMEOUT) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => {
                    return Err(ConfigError::invalid(
                        ENV_REQUEST_TIMEOUT,
                        raw,
                        "must be a positive number (in milliseconds)",
                    ))
                }
            },
            None => DEFAULT_REQUEST_TIMEOUT_MS,
        };

        Ok(Self {
            api_key,
            base_url: get(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            models: ModelConfig::new(essay_model, review_model),
            retry: RetryPolicy::new()
                .with_max_attempts(max_attempts)
                .with_initial_delay_ms(initial_delay_ms)
                .with_max_delay_ms(max_delay_ms),
            request_timeout_ms,
            output_dir: get(ENV_OUTPUT_DIR)
                .map_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR), PathBuf::from),
        })
    }

    /// Overrides the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Connection settings for the HTTP provider.
    #[must_use]
    pub fn provider_config(&self) -> OpenRouterConfig {
        OpenRouterConfig::new(self.api_key.clone())
            .with_base_url(self.base_url.clone())
            .with_timeout(Duration::from_millis(self.request_timeout_ms))
    }
}

fn parse_millis(raw: Option<String>, key: &'static str, default: u64) -> Result<u64, ConfigError> {
    raw.map_or(Ok(default), |raw| {
        raw.parse::<u64>().map_err(|_| {
            ConfigError::invalid(key, raw, "must be a non-negative number (in milliseconds)")
        })
    })
}
