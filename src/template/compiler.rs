use crate::error::TemplateError;
use crate::template::parameter::{DisplayZone, Parameter};
use crate::template::resolver::FieldPath;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// `{...}` markers; the shortest span up to the next `}`.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^}]+)\}").unwrap());

pub const EVENT_NAME_TOKEN: &str = "eventName";
pub const REMAINING_TOKEN: &str = "...";
pub const REMAINING_ALIAS: &str = "remaining";

/// What a placeholder refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    EventName,
    Remaining,
    Field(FieldPath),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub source: String,
    pub reference: Reference,
    pub parameters: Vec<Parameter>,
}

impl Placeholder {
    pub fn is_optional(&self) -> bool {
        self.parameters.iter().any(Parameter::is_optional)
    }
}

/// A parsed template: literal text interleaved with placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplate {
    source: String,
    segments: Vec<(String, Placeholder)>,
    tail: String,
    referenced: HashSet<String>,
}

impl CompiledTemplate {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Literal text preceding each placeholder, in template order.
    pub fn segments(&self) -> &[(String, Placeholder)] {
        &self.segments
    }

    pub fn tail(&self) -> &str {
        &self.tail
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.segments.iter().map(|(_, placeholder)| placeholder)
    }

    /// Whether a top-level field is named by some placeholder of this template.
    pub fn references(&self, field: &str) -> bool {
        self.referenced.contains(field)
    }
}

/// Compiles template strings; every `dt:` parameter is bound to `zone`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateCompiler {
    zone: DisplayZone,
}

impl TemplateCompiler {
    pub fn new(zone: DisplayZone) -> Self {
        TemplateCompiler { zone }
    }

    pub fn compile(&self, template: &str) -> Result<CompiledTemplate, TemplateError> {
        let mut segments = Vec::new();
        let mut referenced = HashSet::new();
        let mut last_end = 0;

        for captures in PLACEHOLDER.captures_iter(template) {
            let (whole, body) = match (captures.get(0), captures.get(1)) {
                (Some(whole), Some(body)) => (whole, body.as_str()),
                _ => continue,
            };
            let literal = template[last_end..whole.start()].to_string();
            last_end = whole.end();

            let placeholder = self.parse_placeholder(body)?;
            if let Reference::Field(path) = &placeholder.reference {
                referenced.insert(path.first().to_string());
            }
            segments.push((literal, placeholder));
        }

        Ok(CompiledTemplate {
            source: template.to_string(),
            segments,
            tail: template[last_end..].to_string(),
            referenced,
        })
    }

    fn parse_placeholder(&self, body: &str) -> Result<Placeholder, TemplateError> {
        let mut parts = body.split(',');
        let name = parts.next().unwrap_or_default().trim();

        let reference = match name {
            EVENT_NAME_TOKEN => Reference::EventName,
            REMAINING_TOKEN | REMAINING_ALIAS => Reference::Remaining,
            _ => Reference::Field(FieldPath::parse(name).ok_or_else(|| {
                TemplateError::EmptyFieldPath {
                    placeholder: body.to_string(),
                }
            })?),
        };

        let mut parameters = Vec::new();
        for (index, part) in parts.enumerate() {
            let token = part.trim();
            let parameter = Parameter::parse(token, self.zone)?;
            if index > 0 && parameter.is_timestamp() {
                return Err(TemplateError::MisplacedTimestamp {
                    token: token.to_string(),
                });
            }
            parameters.push(parameter);
        }

        Ok(Placeholder {
            source: body.to_string(),
            reference,
            parameters,
        })
    }
}
