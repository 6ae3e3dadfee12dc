//! Structured event records as handed over by a record producer.
//!
//! A [`Record`] carries its event type name, a start/end instant pair and an
//! ordered set of named [`Field`]s. Field order is the declared order and is
//! what "remaining fields" style enumerations walk over.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use indexmap::IndexMap;
use std::fmt;

/// Render an instant the way every text form in this crate does (RFC 3339, UTC).
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Floating point text that always shows a fractional part (`1.0`, not `1`).
pub fn format_float(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

/// Maps raw tick counts of a recording onto absolute time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickClock {
    pub ticks_per_second: i64,
    pub origin_ticks: i64,
    pub origin_time: DateTime<Utc>,
}

impl Default for TickClock {
    fn default() -> Self {
        TickClock {
            ticks_per_second: 1_000_000_000,
            origin_ticks: 0,
            origin_time: DateTime::UNIX_EPOCH,
        }
    }
}

impl TickClock {
    pub fn to_instant(&self, ticks: i64) -> Option<DateTime<Utc>> {
        if self.ticks_per_second <= 0 {
            return None;
        }
        let delta = i128::from(ticks) - i128::from(self.origin_ticks);
        let nanos = delta * 1_000_000_000 / i128::from(self.ticks_per_second);
        let nanos = i64::try_from(nanos).ok()?;
        self.origin_time
            .checked_add_signed(Duration::nanoseconds(nanos))
    }
}

/// Declared encoding of a numeric field that really holds a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampUnit {
    Ticks(TickClock),
    EpochMillis,
}

impl TimestampUnit {
    pub fn to_instant(&self, raw: i64) -> Option<DateTime<Utc>> {
        match self {
            TimestampUnit::Ticks(clock) => clock.to_instant(raw),
            TimestampUnit::EpochMillis => DateTime::from_timestamp_millis(raw),
        }
    }
}

/// Declared metadata of a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldMeta {
    pub timestamp: Option<TimestampUnit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub value: FieldValue,
    pub meta: FieldMeta,
}

impl Field {
    pub fn new(value: FieldValue) -> Self {
        Field {
            value,
            meta: FieldMeta::default(),
        }
    }

    /// A numeric field declared as an encoded timestamp.
    pub fn timestamp(raw: i64, unit: TimestampUnit) -> Self {
        Field {
            value: FieldValue::Int(raw),
            meta: FieldMeta {
                timestamp: Some(unit),
            },
        }
    }

    /// The absolute instant of a timestamp-declared integer field.
    pub fn decoded_instant(&self) -> Option<DateTime<Utc>> {
        match (&self.value, &self.meta.timestamp) {
            (FieldValue::Int(raw), Some(unit)) => unit.to_instant(*raw),
            _ => None,
        }
    }
}

impl From<FieldValue> for Field {
    fn from(value: FieldValue) -> Self {
        Field::new(value)
    }
}

macro_rules! field_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Field {
                fn from(value: $t) -> Self {
                    Field::new(FieldValue::from(value))
                }
            }
        )*
    };
}

field_from!(&str, String, i64, u64, f64, bool, DateTime<Utc>, RecordObject, Vec<Frame>);

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned values above `i64::MAX`
    UInt(u64),
    Float(f64),
    Str(String),
    Instant(DateTime<Utc>),
    Object(RecordObject),
    Frames(Vec<Frame>),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => FieldValue::Int(i),
            Err(_) => FieldValue::UInt(value),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Instant(value)
    }
}

impl From<RecordObject> for FieldValue {
    fn from(value: RecordObject) -> Self {
        FieldValue::Object(value)
    }
}

impl From<Vec<Frame>> for FieldValue {
    fn from(value: Vec<Frame>) -> Self {
        FieldValue::Frames(value)
    }
}

/// Nested object kinds that have a short display name in one-line output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Class,
    ClassLoader,
    Thread,
    ThreadGroup,
    Generic,
}

impl ObjectKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "class" => Some(ObjectKind::Class),
            "classLoader" => Some(ObjectKind::ClassLoader),
            "thread" => Some(ObjectKind::Thread),
            "threadGroup" => Some(ObjectKind::ThreadGroup),
            "generic" => Some(ObjectKind::Generic),
            _ => None,
        }
    }

    /// Field holding the short display name, if this kind has one.
    pub fn display_field(&self) -> Option<&'static str> {
        match self {
            ObjectKind::Class | ObjectKind::ClassLoader | ObjectKind::ThreadGroup => Some("name"),
            ObjectKind::Thread => Some("javaName"),
            ObjectKind::Generic => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordObject {
    pub type_name: String,
    pub kind: ObjectKind,
    pub fields: IndexMap<String, Field>,
}

impl RecordObject {
    pub fn new(type_name: &str, kind: ObjectKind) -> Self {
        RecordObject {
            type_name: type_name.to_string(),
            kind,
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, field: impl Into<Field>) -> Self {
        self.fields.insert(name.to_string(), field.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Short display name (class name, thread name, ...); `None` for generic
    /// objects or when the naming field is missing or null.
    pub fn short_name(&self) -> Option<String> {
        let field = self.get(self.kind.display_field()?)?;
        match &field.value {
            FieldValue::Null => None,
            FieldValue::Str(s) => Some(s.clone()),
            other => Some(scalar_text(other)),
        }
    }
}

impl fmt::Display for RecordObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {{", self.type_name)?;
        write_fields(f, &self.fields, 1)?;
        write!(f, "}}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub type_name: String,
    pub method: String,
    pub line: i32,
}

impl Frame {
    pub fn new(type_name: &str, method: &str, line: i32) -> Self {
        Frame {
            type_name: type_name.to_string(),
            method: method.to_string(),
            line,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(Line:{})", self.type_name, self.method, self.line)
    }
}

/// One event instance. Owned by the producer; formatting never mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub event_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub fields: IndexMap<String, Field>,
}

impl Record {
    pub fn new(event_type: &str, start_time: DateTime<Utc>) -> Self {
        Record {
            event_type: event_type.to_string(),
            start_time,
            end_time: start_time,
            fields: IndexMap::new(),
        }
    }

    pub fn with_end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = end_time;
        self
    }

    pub fn with_field(mut self, name: &str, field: impl Into<Field>) -> Self {
        self.fields.insert(name.to_string(), field.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }
}

/// The default multi-line text form, used when a route has no template.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {{", self.event_type)?;
        writeln!(f, "  startTime = {}", format_instant(&self.start_time))?;
        writeln!(f, "  endTime = {}", format_instant(&self.end_time))?;
        write_fields(f, &self.fields, 1)?;
        write!(f, "}}")
    }
}

fn write_fields(
    f: &mut fmt::Formatter<'_>,
    fields: &IndexMap<String, Field>,
    depth: usize,
) -> fmt::Result {
    let indent = "  ".repeat(depth);
    for (name, field) in fields {
        write!(f, "{}{} = ", indent, name)?;
        if let Some(instant) = field.decoded_instant() {
            writeln!(f, "{}", format_instant(&instant))?;
            continue;
        }
        match &field.value {
            FieldValue::Str(s) => writeln!(f, "\"{}\"", s)?,
            FieldValue::Object(obj) => {
                writeln!(f, "{} {{", obj.type_name)?;
                write_fields(f, &obj.fields, depth + 1)?;
                writeln!(f, "{}}}", indent)?;
            }
            FieldValue::Frames(frames) => {
                writeln!(f, "[")?;
                for frame in frames {
                    writeln!(f, "{}  {}", indent, frame)?;
                }
                writeln!(f, "{}]", indent)?;
            }
            other => writeln!(f, "{}", scalar_text(other))?,
        }
    }
    Ok(())
}

/// Text of a value that has no nested structure. Nested values fall back to
/// their default text form.
pub fn scalar_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => "N/A".to_string(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Int(i) => i.to_string(),
        FieldValue::UInt(u) => u.to_string(),
        FieldValue::Float(x) => format_float(*x),
        FieldValue::Str(s) => s.clone(),
        FieldValue::Instant(t) => format_instant(t),
        FieldValue::Object(obj) => obj.to_string(),
        FieldValue::Frames(frames) => frames
            .iter()
            .map(|frame| frame.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, h, m, s).unwrap()
    }

    #[test]
    fn test_tick_clock_conversion() {
        let clock = TickClock {
            ticks_per_second: 1_000,
            origin_ticks: 500,
            origin_time: at(0, 0, 0),
        };
        assert_eq!(clock.to_instant(500), Some(at(0, 0, 0)));
        assert_eq!(clock.to_instant(3_500), Some(at(0, 0, 3)));
        assert_eq!(clock.to_instant(-500), Some(at(0, 0, 0) - Duration::seconds(1)));
    }

    #[test]
    fn test_tick_clock_rejects_zero_rate() {
        let clock = TickClock {
            ticks_per_second: 0,
            ..TickClock::default()
        };
        assert_eq!(clock.to_instant(10), None);
    }

    #[test]
    fn test_decoded_instant_only_for_declared_fields() {
        let plain = Field::from(1_709_596_800_000_i64);
        assert_eq!(plain.decoded_instant(), None);

        let declared = Field::timestamp(1_709_596_800_000, TimestampUnit::EpochMillis);
        assert_eq!(declared.decoded_instant(), Some(at(0, 0, 0)));
    }

    #[test]
    fn test_short_name_by_kind() {
        let thread = RecordObject::new("java.lang.Thread", ObjectKind::Thread)
            .with_field("javaName", "main")
            .with_field("javaThreadId", 1_i64);
        assert_eq!(thread.short_name(), Some("main".to_string()));

        let generic = RecordObject::new("jdk.types.Thing", ObjectKind::Generic).with_field("name", "x");
        assert_eq!(generic.short_name(), None);

        let unnamed = RecordObject::new("java.lang.Class", ObjectKind::Class).with_field("name", FieldValue::Null);
        assert_eq!(unnamed.short_name(), None);
    }

    #[test]
    fn test_default_text_form() {
        let record = Record::new("log.Info", at(10, 0, 0))
            .with_field("message", "hi")
            .with_field(
                "eventThread",
                RecordObject::new("java.lang.Thread", ObjectKind::Thread).with_field("javaName", "main"),
            )
            .with_field("throwable", FieldValue::Null);

        let text = record.to_string();
        assert_eq!(
            text,
            "log.Info {\n  startTime = 2024-03-05T10:00:00Z\n  endTime = 2024-03-05T10:00:00Z\n  message = \"hi\"\n  eventThread = java.lang.Thread {\n    javaName = \"main\"\n  }\n  throwable = N/A\n}"
        );
    }

    #[test]
    fn test_frame_display() {
        assert_eq!(Frame::new("com.acme.Main", "run", 42).to_string(), "com.acme.Main.run(Line:42)");
    }
}
