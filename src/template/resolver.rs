use crate::record::{format_float, format_instant, Field, FieldValue, ObjectKind};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::fmt;

/// A non-empty dotted path such as `eventThread.group.name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Option<FieldPath> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        Some(FieldPath {
            segments: path.split('.').map(|s| s.to_string()).collect(),
        })
    }

    /// Top-level field name this path starts at.
    pub fn first(&self) -> &str {
        &self.segments[0]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// A present, rendered field value. Instants stay typed so that a date
/// pattern can format them.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Text(String),
    Instant(DateTime<Utc>),
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Text(s) => write!(f, "{}", s),
            Resolved::Instant(t) => write!(f, "{}", format_instant(t)),
            Resolved::Bool(b) => write!(f, "{}", b),
            Resolved::Int(i) => write!(f, "{}", i),
            Resolved::UInt(u) => write!(f, "{}", u),
            Resolved::Float(x) => write!(f, "{}", format_float(*x)),
        }
    }
}

/// Resolve `path` against a field set, descending through nested objects.
/// `None` means absent: a missing segment, a null, or a non-object hop.
pub fn resolve(fields: &IndexMap<String, Field>, path: &FieldPath, one_line: bool) -> Option<Resolved> {
    let (last, parents) = path.segments().split_last()?;
    let mut current = fields;
    for segment in parents {
        match &current.get(segment)?.value {
            FieldValue::Object(obj) => current = &obj.fields,
            _ => return None,
        }
    }
    render_field(current.get(last)?, one_line)
}

/// Render one field by the kind of its value.
pub fn render_field(field: &Field, one_line: bool) -> Option<Resolved> {
    if let Some(instant) = field.decoded_instant() {
        return Some(Resolved::Instant(instant));
    }
    let resolved = match &field.value {
        FieldValue::Null => return None,
        FieldValue::Str(s) if one_line => Resolved::Text(s.replace('\n', " ")),
        FieldValue::Str(s) => Resolved::Text(s.clone()),
        FieldValue::Bool(b) => Resolved::Bool(*b),
        FieldValue::Int(i) => Resolved::Int(*i),
        FieldValue::UInt(u) => Resolved::UInt(*u),
        FieldValue::Float(x) => Resolved::Float(*x),
        FieldValue::Instant(t) => Resolved::Instant(*t),
        FieldValue::Frames(frames) => {
            let entries: Vec<String> = frames.iter().map(|frame| frame.to_string()).collect();
            if one_line {
                Resolved::Text(format!("[{}]", entries.join(", ")))
            } else if entries.is_empty() {
                Resolved::Text(String::new())
            } else {
                Resolved::Text(format!("    {}", entries.join("\n    ")))
            }
        }
        FieldValue::Object(obj) if !one_line => Resolved::Text(obj.to_string()),
        FieldValue::Object(obj) => match obj.kind {
            ObjectKind::Generic => Resolved::Text(format!("[{}]", compact_fields(&obj.fields, |_| true))),
            _ => Resolved::Text(obj.short_name()?),
        },
    };
    Some(resolved)
}

/// Comma-joined `name:value` pairs in declared order, one-line mode, for
/// every field accepted by `include`. Nulls read `null`.
pub fn compact_fields<F>(fields: &IndexMap<String, Field>, include: F) -> String
where
    F: Fn(&str) -> bool,
{
    fields
        .iter()
        .filter(|(name, _)| include(name))
        .map(|(name, field)| match render_field(field, true) {
            Some(value) => format!("{}:{}", name, value),
            None => format!("{}:null", name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
