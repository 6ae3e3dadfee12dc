// src/pipeline.rs
pub mod config;
pub mod context;
pub mod stream;

pub use config::{ErrorStrategy, FileConfig, PipelineConfig, RouteConfig};
pub use context::{ProcessResult, ProcessingStats};
pub use stream::EventPipeline;
