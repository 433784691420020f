//! Core domain model types for essayflow.
//!
//! This module contains the values that flow between pipeline stages:
//! - The stage kind enum
//! - The per-stage result and the in-memory record of a whole run

mod output;
mod status;

pub use output::{PipelineRun, StageResult};
pub use status::StageKind;
