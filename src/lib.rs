// src/lib.rs
pub mod error;
pub mod input_format;
pub mod pipeline;
pub mod record;
pub mod router;
pub mod template;
pub mod time_window;

pub use error::*;

pub use input_format::{JsonlRecordParser, RecordParser};
pub use pipeline::{ErrorStrategy, EventPipeline, FileConfig, PipelineConfig, ProcessingStats};
pub use record::{Field, FieldValue, Frame, ObjectKind, Record, RecordObject, TickClock, TimestampUnit};
pub use router::{RouteEntry, Router};
pub use template::{CompiledTemplate, DisplayZone, TemplateCompiler};
pub use time_window::TimeWindow;
