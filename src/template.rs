//! The placeholder template language.
//!
//! A template is literal text with `{field.path,param,...}` placeholders.
//! Templates compile once into a [`CompiledTemplate`] which is then rendered
//! against any number of records.

pub mod compiler;
pub mod date_pattern;
pub mod parameter;
pub mod renderer;
pub mod resolver;

pub use compiler::{CompiledTemplate, Placeholder, Reference, TemplateCompiler};
pub use parameter::{DisplayZone, Parameter, TimestampFormat};
pub use renderer::{render, MISSING};
pub use resolver::{FieldPath, Resolved};
