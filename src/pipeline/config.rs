use crate::error::ConfigError;
use crate::router::{RouteEntry, Router};
use crate::template::{DisplayZone, TemplateCompiler};
use crate::time_window::TimeWindow;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

/// Configuration for pipeline behavior
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub error_strategy: ErrorStrategy,
    pub buffer_size: usize,
    pub max_line_length: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            error_strategy: ErrorStrategy::FailFast,
            buffer_size: 65536,       // 64KB
            max_line_length: 1048576, // 1MB
        }
    }
}

/// What to do when one record cannot be decoded or rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStrategy {
    /// Log the failure, count it and continue with the next record
    Skip,
    /// Stop processing on first error
    FailFast,
}

/// One `routes:` entry of a configuration file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RouteConfig {
    pub event: String,
    #[serde(default)]
    pub template: Option<String>,
}

/// YAML configuration file
///
/// ```yaml
/// range: 2h
/// utc: true
/// routes:
///   - event: "log.*"
///     template: "{eventName,0d,C} {message}"
///   - event: jdk.ThreadStart
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub utc: bool,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

impl FileConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: FileConfig = serde_yaml::from_str(text)?;
        if config.routes.is_empty() {
            return Err(ConfigError::Invalid("no routes configured".to_string()));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn zone(&self) -> DisplayZone {
        if self.utc {
            DisplayZone::Utc
        } else {
            DisplayZone::Local
        }
    }

    /// Compile every route; the first bad template aborts.
    pub fn build_router(&self, zone: DisplayZone, now: DateTime<Utc>) -> Result<Router, ConfigError> {
        let window = match &self.range {
            Some(range) => TimeWindow::from_range(range, now)?,
            None => TimeWindow::unbounded(),
        };
        let compiler = TemplateCompiler::new(zone);
        let mut entries = Vec::with_capacity(self.routes.len());
        for route in &self.routes {
            let entry = RouteEntry::compile(&route.event, route.template.as_deref(), &compiler).map_err(
                |source| ConfigError::Template {
                    event: route.event.clone(),
                    source,
                },
            )?;
            entries.push(entry);
        }
        Ok(Router::new(entries, window))
    }
}
