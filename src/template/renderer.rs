use crate::error::RenderError;
use crate::record::Record;
use crate::template::compiler::{CompiledTemplate, Placeholder, Reference};
use crate::template::parameter::Parameter;
use crate::template::resolver::{self, FieldPath, Resolved};

/// Substituted for absent values of non-optional placeholders.
pub const MISSING: &str = "N/A";

const START_TIME: &str = "startTime";
const END_TIME: &str = "endTime";

/// Render one record through a compiled template.
pub fn render(record: &Record, template: &CompiledTemplate) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.source().len() + 64);
    for (literal, placeholder) in template.segments() {
        out.push_str(literal);
        let value = resolve_placeholder(record, template, placeholder);
        out.push_str(&substitute(placeholder, value)?);
    }
    out.push_str(template.tail());
    Ok(out)
}

fn resolve_placeholder(
    record: &Record,
    template: &CompiledTemplate,
    placeholder: &Placeholder,
) -> Option<Resolved> {
    match &placeholder.reference {
        Reference::EventName => Some(Resolved::Text(record.event_type.clone())),
        Reference::Remaining => Some(Resolved::Text(resolver::compact_fields(&record.fields, |name| {
            !template.references(name)
        }))),
        Reference::Field(path) if !record.fields.contains_key(path.first()) => record_time(record, path),
        Reference::Field(path) => resolver::resolve(&record.fields, path, false),
    }
}

/// `startTime` and `endTime` name the record's own instants unless a field
/// of that name exists.
fn record_time(record: &Record, path: &FieldPath) -> Option<Resolved> {
    match path.segments() {
        [name] if name == START_TIME => Some(Resolved::Instant(record.start_time)),
        [name] if name == END_TIME => Some(Resolved::Instant(record.end_time)),
        _ => None,
    }
}

fn substitute(placeholder: &Placeholder, value: Option<Resolved>) -> Result<String, RenderError> {
    let Some(value) = value else {
        return Ok(if placeholder.is_optional() {
            String::new()
        } else {
            MISSING.to_string()
        });
    };

    let mut chain = placeholder.parameters.iter();
    let mut text = match (value, placeholder.parameters.first()) {
        (Resolved::Instant(instant), Some(Parameter::Timestamp(format))) => {
            chain.next();
            format.format(&instant)
        }
        (other, Some(Parameter::Timestamp(_))) => {
            return Err(RenderError::TimestampMismatch {
                placeholder: placeholder.source.clone(),
                found: other.to_string(),
            })
        }
        (other, _) => other.to_string(),
    };

    for parameter in chain {
        text = parameter.format_text(&text);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Field, FieldValue, TimestampUnit};
    use crate::template::compiler::TemplateCompiler;
    use crate::template::parameter::DisplayZone;
    use chrono::{TimeZone, Utc};

    fn render_with(template: &str, record: &Record) -> Result<String, RenderError> {
        let compiled = TemplateCompiler::new(DisplayZone::Utc).compile(template).unwrap();
        render(record, &compiled)
    }

    fn log_record() -> Record {
        Record::new("log.Info", Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap())
            .with_field("message", "hi")
            .with_field("origin", "svc")
    }

    #[test]
    fn test_remaining_fields_scenario() {
        assert_eq!(
            render_with("{eventName} [{...}]", &log_record()).unwrap(),
            "log.Info [message:hi, origin:svc]"
        );
    }

    #[test]
    fn test_remaining_excludes_referenced_fields() {
        assert_eq!(
            render_with("{message}: {remaining}", &log_record()).unwrap(),
            "hi: origin:svc"
        );
        assert_eq!(render_with("{message}{origin}[{...}]", &log_record()).unwrap(), "hisvc[]");
    }

    #[test]
    fn test_record_instants_without_fields() {
        let record = log_record().with_end_time(Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 2).unwrap());
        assert_eq!(render_with("{startTime}", &record).unwrap(), "2024-03-05T10:00:00Z");
        assert_eq!(render_with("{endTime,dt:HH:mm:ss}", &record).unwrap(), "10:00:02");
        assert_eq!(render_with("{startTime.nanos}", &record).unwrap(), "N/A");

        let shadowed = record.clone().with_field("startTime", "declared");
        assert_eq!(render_with("{startTime}", &shadowed).unwrap(), "declared");

        let null_field = record.with_field("startTime", FieldValue::Null);
        assert_eq!(render_with("{startTime}", &null_field).unwrap(), "N/A");
        assert_eq!(render_with("{startTime,o}", &null_field).unwrap(), "");
    }

    #[test]
    fn test_truncate_then_uppercase() {
        let record = log_record().with_field("level", "com.acme.Thing");
        assert_eq!(render_with("{level,0d,C}", &record).unwrap(), "THING");
    }

    #[test]
    fn test_optional_and_missing() {
        let record = log_record().with_field("throwable", FieldValue::Null);
        assert_eq!(render_with("{missingField,o}", &record).unwrap(), "");
        assert_eq!(render_with("{missingField}", &record).unwrap(), "N/A");
        assert_eq!(render_with("{throwable,o,n}", &record).unwrap(), "");
        assert_eq!(render_with("{throwable,C}", &record).unwrap(), "N/A");
        assert_eq!(render_with("{message,o,n}", &record).unwrap(), "\nhi");
    }

    #[test]
    fn test_date_pattern_on_tick_timestamp() {
        let record = log_record().with_field(
            "ts",
            Field::timestamp(1_709_640_000_000, TimestampUnit::EpochMillis),
        );
        assert_eq!(render_with("{ts,dt:yyyy-MM-dd}", &record).unwrap(), "2024-03-05");
    }

    #[test]
    fn test_date_pattern_on_text_is_an_error() {
        let err = render_with("{message,dt:yyyy}", &log_record()).unwrap_err();
        assert!(matches!(err, RenderError::TimestampMismatch { ref found, .. } if found == "hi"));
    }

    #[test]
    fn test_event_name_ignores_same_named_field() {
        let record = log_record().with_field("eventName", "shadow");
        assert_eq!(render_with("{eventName}", &record).unwrap(), "log.Info");
    }

    #[test]
    fn test_special_characters_are_kept() {
        let record = log_record().with_field("path", "C:\\temp\\$1 and $0");
        assert_eq!(render_with("<{path}>", &record).unwrap(), "<C:\\temp\\$1 and $0>");
    }

    #[test]
    fn test_instant_default_text() {
        let record = log_record().with_field("at", Utc.with_ymd_and_hms(2024, 3, 5, 1, 2, 3).unwrap());
        assert_eq!(render_with("{at}", &record).unwrap(), "2024-03-05T01:02:03Z");
    }
}
