use crate::error::{RenderError, TemplateError};
use crate::record::Record;
use crate::template::{render, CompiledTemplate, TemplateCompiler};
use crate::time_window::TimeWindow;
use std::collections::HashMap;

/// Trailing marker turning a registered event name into a prefix.
pub const WILDCARD: char = '*';

/// An event name (or prefix) and the template its records are printed with.
/// Without a template the record's default text form is printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub name: String,
    pub template: Option<CompiledTemplate>,
    pub is_prefix: bool,
}

impl RouteEntry {
    pub fn compile(
        name: &str,
        template: Option<&str>,
        compiler: &TemplateCompiler,
    ) -> Result<RouteEntry, TemplateError> {
        let (name, is_prefix) = match name.strip_suffix(WILDCARD) {
            Some(prefix) => (prefix, true),
            None => (name, false),
        };
        let template = template.map(|t| compiler.compile(t)).transpose()?;
        Ok(RouteEntry {
            name: name.to_string(),
            template,
            is_prefix,
        })
    }

    pub fn format(&self, record: &Record) -> Result<String, RenderError> {
        match &self.template {
            Some(template) => render(record, template),
            None => Ok(record.to_string()),
        }
    }
}

/// Picks the route for each record: exact names first, then prefixes in
/// registration order.
#[derive(Debug, Clone, Default)]
pub struct Router {
    exact: HashMap<String, RouteEntry>,
    prefixes: Vec<RouteEntry>,
    window: TimeWindow,
}

impl Router {
    pub fn new<I>(entries: I, window: TimeWindow) -> Self
    where
        I: IntoIterator<Item = RouteEntry>,
    {
        let mut exact = HashMap::new();
        let mut prefixes = Vec::new();
        for entry in entries {
            if entry.is_prefix {
                prefixes.push(entry);
            } else {
                exact.insert(entry.name.clone(), entry);
            }
        }
        Router {
            exact,
            prefixes,
            window,
        }
    }

    /// Compile `(event, template)` pairs and build a router from them.
    pub fn from_specs<S: AsRef<str>>(
        specs: &[(S, Option<S>)],
        compiler: &TemplateCompiler,
        window: TimeWindow,
    ) -> Result<Self, TemplateError> {
        let entries = specs
            .iter()
            .map(|(name, template)| {
                RouteEntry::compile(name.as_ref(), template.as_ref().map(|t| t.as_ref()), compiler)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Router::new(entries, window))
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lookup(&self, event_type: &str) -> Option<&RouteEntry> {
        self.exact.get(event_type).or_else(|| {
            self.prefixes
                .iter()
                .find(|entry| event_type.starts_with(entry.name.as_str()))
        })
    }

    /// Format a record, or `None` when it is outside the window or unrouted.
    pub fn dispatch(&self, record: &Record) -> Result<Option<String>, RenderError> {
        if !self.window.admits(record) {
            log::trace!("{}: outside time window", record.event_type);
            return Ok(None);
        }
        match self.lookup(&record.event_type) {
            Some(entry) => entry.format(record).map(Some),
            None => {
                log::trace!("{}: no route", record.event_type);
                Ok(None)
            }
        }
    }
}
