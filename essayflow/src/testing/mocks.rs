//! Scripted text generators for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::providers::{Generation, ProviderError, TextGenerator};

/// One call observed by a test generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The model that was requested.
    pub model: String,
    /// The full prompt that was sent.
    pub prompt: String,
}

/// A generator that replays queued outcomes in order and records every call.
///
/// When the queue runs dry it fails with a non-transient error so a test
/// that makes too many calls stops immediately.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    outcomes: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGenerator {
    /// Creates a generator with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator that answers with the given texts in order.
    #[must_use]
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Self::new();
        for response in responses {
            generator.push_ok(response);
        }
        generator
    }

    /// Queues a successful response.
    pub fn push_ok(&self, text: impl Into<String>) {
        self.outcomes.lock().push_back(Ok(text.into()));
    }

    /// Queues a failure.
    pub fn push_err(&self, err: ProviderError) {
        self.outcomes.lock().push_back(Err(err));
    }

    /// Returns every call made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns the number of calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the number of queued outcomes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.outcomes.lock().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, model: &str, prompt: &str) -> Result<Generation, ProviderError> {
        self.calls.lock().push(RecordedCall {
            model: model.to_string(),
            prompt: prompt.to_string(),
        });

        let next = self.outcomes.lock().pop_front();
        match next {
            Some(Ok(text)) => Ok(Generation::new(text, model)),
            Some(Err(err)) => Err(err),
            None => Err(ProviderError::InvalidRequest(
                "no scripted response left".to_string(),
            )),
        }
    }
}

/// A generator that always fails with the same error.
#[derive(Debug)]
pub struct FailingGenerator {
    error: ProviderError,
    calls: Mutex<usize>,
}

impl FailingGenerator {
    /// Creates a generator failing with `error` on every call.
    #[must_use]
    pub const fn new(error: ProviderError) -> Self {
        Self {
            error,
            calls: Mutex::new(0),
        }
    }

    /// Returns the number of calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _model: &str, _prompt: &str) -> Result<Generation, ProviderError> {
        *self.calls.lock() += 1;
        Err(self.error.clone())
    }
}
