//! Pipeline composition and execution for survey analyses.

mod runner;

pub use runner::{Pipeline, PipelineConfig, PipelineOutput, PipelineStep};
