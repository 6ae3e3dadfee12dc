#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown parameter: '{token}'")]
    InvalidParameter { token: String },

    #[error("invalid date pattern in parameter '{token}': {reason}")]
    InvalidDatePattern { token: String, reason: String },

    #[error("parameter '{token}' must be the first parameter of its placeholder")]
    MisplacedTimestamp { token: String },

    #[error("placeholder '{{{placeholder}}}' has no field name")]
    EmptyFieldPath { placeholder: String },
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("placeholder '{placeholder}' applies a date pattern to a non-timestamp value: {found}")]
    TimestampMismatch { placeholder: String, found: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Render error in event '{event}': {source}")]
    Render {
        event: String,
        #[source]
        source: RenderError,
    },

    #[error("Input error at line {line}: {message}")]
    Input { line: usize, message: String },

    #[error("Line too long: {length} > {max_length}")]
    LineTooLong { length: usize, max_length: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },

    #[error("Invalid template for event '{event}': {source}")]
    Template {
        event: String,
        #[source]
        source: TemplateError,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}
