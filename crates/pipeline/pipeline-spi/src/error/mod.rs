//! Error types for preprocessing.

mod pipeline_error;

pub use pipeline_error::{PipelineError, Result};
