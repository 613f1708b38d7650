//! Pipeline module.
//!
//! This module provides the report pipeline and its progress model.

mod builder;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder, run};
pub use progress::{
    ClosureProgressReporter, NoopProgressReporter, PipelineStage, ProgressReporter,
    ProgressUpdate,
};
