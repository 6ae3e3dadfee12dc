// src/input_format.rs - JSON Lines event records

use crate::record::{Field, FieldValue, Frame, ObjectKind, Record, RecordObject, TickClock, TimestampUnit};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::io;
use std::path::{Path, PathBuf};

pub trait RecordParser {
    fn parse_line(&self, line: &str) -> Result<Record, String>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(rename = "type")]
    event_type: String,
    start_time: String,
    end_time: Option<String>,
    clock: Option<ClockSpec>,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClockSpec {
    #[serde(default = "default_ticks_per_second")]
    ticks_per_second: i64,
    #[serde(default)]
    origin_ticks: i64,
    origin_time: Option<String>,
}

fn default_ticks_per_second() -> i64 {
    1_000_000_000
}

#[derive(Debug, Deserialize)]
struct FrameSpec {
    #[serde(rename = "type")]
    type_name: String,
    method: String,
    #[serde(default)]
    line: i32,
}

/// One JSON object per line:
/// `{"type": "...", "startTime": "...", "endTime": "...", "clock": {...}, "fields": {...}}`
#[derive(Debug, Default)]
pub struct JsonlRecordParser;

impl JsonlRecordParser {
    pub fn new() -> Self {
        Self
    }
}

impl RecordParser for JsonlRecordParser {
    fn parse_line(&self, line: &str) -> Result<Record, String> {
        let envelope: Envelope =
            serde_json::from_str(line.trim()).map_err(|e| format!("Failed to parse JSONL record: {}", e))?;

        let start_time = parse_timestamp(&envelope.start_time)?;
        let end_time = match &envelope.end_time {
            Some(text) => parse_timestamp(text)?,
            None => start_time,
        };
        let clock = match envelope.clock {
            Some(spec) => TickClock {
                ticks_per_second: spec.ticks_per_second,
                origin_ticks: spec.origin_ticks,
                origin_time: match spec.origin_time {
                    Some(text) => parse_timestamp(&text)?,
                    None => DateTime::UNIX_EPOCH,
                },
            },
            None => TickClock::default(),
        };

        let mut record = Record::new(&envelope.event_type, start_time).with_end_time(end_time);
        for (name, value) in &envelope.fields {
            let field = convert_value(value, &clock).map_err(|e| format!("field '{}': {}", name, e))?;
            record.fields.insert(name.clone(), field);
        }
        Ok(record)
    }
}

/// RFC 3339 first, then whatever `dateparser` recognizes.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    dateparser::parse(text).map_err(|e| format!("invalid timestamp '{}': {}", text, e))
}

fn convert_value(value: &Value, clock: &TickClock) -> Result<Field, String> {
    let field = match value {
        Value::Null => Field::new(FieldValue::Null),
        Value::Bool(b) => Field::from(*b),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => Field::from(i),
            (None, Some(u)) => Field::from(u),
            _ => Field::from(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => Field::from(s.clone()),
        Value::Array(items) => {
            let mut obj = RecordObject::new("array", ObjectKind::Generic);
            for (index, item) in items.iter().enumerate() {
                obj.fields.insert(index.to_string(), convert_value(item, clock)?);
            }
            Field::from(obj)
        }
        Value::Object(map) => convert_object(map, clock)?,
    };
    Ok(field)
}

fn convert_object(map: &Map<String, Value>, clock: &TickClock) -> Result<Field, String> {
    if let Some(ticks) = map.get("$ticks") {
        let ticks = ticks.as_i64().ok_or("$ticks must be an integer")?;
        return Ok(Field::timestamp(ticks, TimestampUnit::Ticks(*clock)));
    }
    if let Some(millis) = map.get("$epochMillis") {
        let millis = millis.as_i64().ok_or("$epochMillis must be an integer")?;
        return Ok(Field::timestamp(millis, TimestampUnit::EpochMillis));
    }
    if let Some(instant) = map.get("$instant") {
        let text = instant.as_str().ok_or("$instant must be a string")?;
        return Ok(Field::from(parse_timestamp(text)?));
    }
    if let Some(frames) = map.get("$frames") {
        let frames: Vec<FrameSpec> =
            serde_json::from_value(frames.clone()).map_err(|e| format!("invalid $frames: {}", e))?;
        let frames: Vec<Frame> = frames
            .into_iter()
            .map(|f| Frame {
                type_name: f.type_name,
                method: f.method,
                line: f.line,
            })
            .collect();
        return Ok(Field::from(frames));
    }

    let type_name = map.get("$type").and_then(Value::as_str).unwrap_or("object");
    let kind = match map.get("$kind").and_then(Value::as_str) {
        Some(tag) => ObjectKind::from_tag(tag).ok_or_else(|| format!("unknown $kind '{}'", tag))?,
        None => ObjectKind::Generic,
    };

    let mut obj = RecordObject::new(type_name, kind);
    for (name, value) in map.iter().filter(|(name, _)| !name.starts_with('$')) {
        obj.fields.insert(name.clone(), convert_value(value, clock)?);
    }
    Ok(Field::from(obj))
}

/// The record files of a repository directory, in name order.
pub fn repository_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(line: &str) -> Result<Record, String> {
        JsonlRecordParser::new().parse_line(line)
    }

    #[test]
    fn test_minimal_record() {
        let record = parse(r#"{"type": "log.Info", "startTime": "2024-03-05T10:00:00Z"}"#).unwrap();
        assert_eq!(record.event_type, "log.Info");
        assert_eq!(record.start_time, Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap());
        assert_eq!(record.end_time, record.start_time);
        assert!(record.fields.is_empty());
    }

    #[test]
    fn test_field_order_is_preserved() {
        let record = parse(
            r#"{"type": "x", "startTime": "2024-03-05T10:00:00Z", "fields": {"zeta": 1, "alpha": 2, "mid": 3}}"#,
        )
        .unwrap();
        let names: Vec<&str> = record.fields.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_scalar_values() {
        let record = parse(
            r#"{"type": "x", "startTime": "2024-03-05T10:00:00Z",
                "fields": {"s": "text", "i": -4, "f": 1.5, "b": true, "n": null,
                           "whole": 1.0, "big": 18446744073709551615}}"#,
        )
        .unwrap();
        assert_eq!(record.get("s").unwrap().value, FieldValue::Str("text".into()));
        assert_eq!(record.get("i").unwrap().value, FieldValue::Int(-4));
        assert_eq!(record.get("f").unwrap().value, FieldValue::Float(1.5));
        assert_eq!(record.get("b").unwrap().value, FieldValue::Bool(true));
        assert_eq!(record.get("n").unwrap().value, FieldValue::Null);
        assert_eq!(record.get("whole").unwrap().value, FieldValue::Float(1.0));
        assert_eq!(record.get("big").unwrap().value, FieldValue::UInt(u64::MAX));
    }

    #[test]
    fn test_tick_timestamp_uses_record_clock() {
        let record = parse(
            r#"{"type": "x", "startTime": "2024-03-05T10:00:00Z",
                "clock": {"ticksPerSecond": 1000, "originTicks": 0, "originTime": "2024-03-05T00:00:00Z"},
                "fields": {"ts": {"$ticks": 7200000}}}"#,
        )
        .unwrap();
        assert_eq!(
            record.get("ts").unwrap().decoded_instant(),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 2, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_nested_objects_and_frames() {
        let record = parse(
            r#"{"type": "jdk.ThreadStart", "startTime": "2024-03-05T10:00:00Z",
                "fields": {
                  "thread": {"$type": "java.lang.Thread", "$kind": "thread", "javaName": "main",
                             "group": {"$kind": "threadGroup", "name": "system"}},
                  "stackTrace": {"$frames": [{"type": "com.acme.Main", "method": "run", "line": 3}]}
                }}"#,
        )
        .unwrap();
        let FieldValue::Object(thread) = &record.get("thread").unwrap().value else {
            panic!("expected object");
        };
        assert_eq!(thread.type_name, "java.lang.Thread");
        assert_eq!(thread.kind, ObjectKind::Thread);
        assert!(thread.get("$type").is_none());
        assert_eq!(thread.short_name().as_deref(), Some("main"));

        assert_eq!(
            record.get("stackTrace").unwrap().value,
            FieldValue::Frames(vec![Frame::new("com.acme.Main", "run", 3)])
        );
    }

    #[test]
    fn test_invalid_records() {
        assert!(parse("not json").unwrap_err().contains("Failed to parse JSONL"));
        assert!(parse(r#"{"type": "x", "startTime": "whenever"}"#).is_err());
        let err = parse(r#"{"type": "x", "startTime": "2024-03-05T10:00:00Z", "fields": {"t": {"$kind": "bogus"}}}"#)
            .unwrap_err();
        assert!(err.contains("field 't'"));
    }

    #[test]
    fn test_dateparser_fallback() {
        let ts = parse_timestamp("2024-03-05 10:00:00 UTC").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap());
    }
}
