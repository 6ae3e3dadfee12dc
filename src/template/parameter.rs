use crate::error::TemplateError;
use crate::template::date_pattern;
use chrono::{DateTime, FixedOffset, Local, Utc};

/// Time zone timestamps are displayed in. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayZone {
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl DisplayZone {
    fn format(&self, instant: &DateTime<Utc>, strftime: &str) -> String {
        match self {
            DisplayZone::Local => instant.with_timezone(&Local).format(strftime).to_string(),
            DisplayZone::Utc => instant.format(strftime).to_string(),
            DisplayZone::Fixed(offset) => instant.with_timezone(offset).format(strftime).to_string(),
        }
    }
}

/// A compiled `dt:` pattern bound to its display zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampFormat {
    pattern: String,
    strftime: String,
    zone: DisplayZone,
}

impl TimestampFormat {
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn format(&self, instant: &DateTime<Utc>) -> String {
        self.zone.format(instant, &self.strftime)
    }
}

/// One text transform of a placeholder's parameter chain.
///
/// Tokens: `n` newline prefix, `o` optional, `c`/`C` lower/upper case,
/// `<digits>d` drop all but the last `digits + 1` dot-separated segments,
/// `dt:<pattern>` timestamp formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    NewLine,
    LowerCase,
    UpperCase,
    Optional,
    NDots(usize),
    Timestamp(TimestampFormat),
}

impl Parameter {
    pub fn parse(token: &str, zone: DisplayZone) -> Result<Parameter, TemplateError> {
        match token {
            "n" => Ok(Parameter::NewLine),
            "o" => Ok(Parameter::Optional),
            "c" => Ok(Parameter::LowerCase),
            "C" => Ok(Parameter::UpperCase),
            _ => {
                if let Some(pattern) = token.strip_prefix("dt:") {
                    let strftime = date_pattern::to_strftime(pattern).map_err(|reason| {
                        TemplateError::InvalidDatePattern {
                            token: token.to_string(),
                            reason,
                        }
                    })?;
                    return Ok(Parameter::Timestamp(TimestampFormat {
                        pattern: pattern.to_string(),
                        strftime,
                        zone,
                    }));
                }
                token
                    .strip_suffix('d')
                    .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
                    .and_then(|digits| digits.parse().ok())
                    .map(Parameter::NDots)
                    .ok_or_else(|| TemplateError::InvalidParameter {
                        token: token.to_string(),
                    })
            }
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Parameter::Optional)
    }

    pub fn is_timestamp(&self) -> bool {
        matches!(self, Parameter::Timestamp(_))
    }

    /// Apply this parameter to already stringified text. Timestamp formatting
    /// only applies to instants and leaves text untouched.
    pub fn format_text(&self, text: &str) -> String {
        match self {
            Parameter::NewLine => format!("\n{}", text),
            Parameter::LowerCase => text.to_lowercase(),
            Parameter::UpperCase => text.to_uppercase(),
            Parameter::Optional | Parameter::Timestamp(_) => text.to_string(),
            Parameter::NDots(n) => keep_trailing_segments(text, *n),
        }
    }
}

/// Keep the last `n + 1` dot-separated segments of `text`.
fn keep_trailing_segments(text: &str, n: usize) -> String {
    let parts: Vec<&str> = text.split('.').collect();
    let keep = n.saturating_add(1).min(parts.len());
    parts[parts.len() - keep..].join(".")
}
