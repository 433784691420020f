//! Testing utilities for essayflow pipelines.
//!
//! Provides [`TextGenerator`](crate::providers::TextGenerator) doubles that
//! need no network.

mod mocks;

pub use mocks::{FailingGenerator, RecordedCall, ScriptedGenerator};
