//! Pipeline stages and the retry executor that wraps them.
//!
//! This module provides:
//! - Bounded exponential-backoff retry
//! - Prompt builders for each stage
//! - The sequential generate → review → revise pipeline

mod essay;
pub mod prompts;
pub mod retry;

pub use essay::{EssayPipeline, EssayRequest};
pub use retry::{
    backoff_delay_ms, with_retry, with_retry_hinted, with_retry_if, RetryDecision, RetryPolicy,
    RetryState,
};
