use crate::error::ConfigError;
use crate::record::Record;
use chrono::{DateTime, Utc};

/// Optional lower bound on record end times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    cutoff: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn unbounded() -> Self {
        TimeWindow { cutoff: None }
    }

    pub fn since(cutoff: DateTime<Utc>) -> Self {
        TimeWindow {
            cutoff: Some(cutoff),
        }
    }

    /// Build a window from a relative range such as `2h` or `1d`, counted back
    /// from `now`. `*` means no window.
    pub fn from_range(range: &str, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        let Some(duration) = parse_range(range)? else {
            return Ok(TimeWindow::unbounded());
        };
        let invalid = |reason: &str| ConfigError::InvalidRange {
            range: range.to_string(),
            reason: reason.to_string(),
        };
        let delta = chrono::Duration::from_std(duration).map_err(|_| invalid("duration is too large"))?;
        let cutoff = now
            .checked_sub_signed(delta)
            .ok_or_else(|| invalid("duration reaches before the supported time range"))?;
        Ok(TimeWindow::since(cutoff))
    }

    pub fn cutoff(&self) -> Option<DateTime<Utc>> {
        self.cutoff
    }

    /// Records ending strictly before the cutoff fall outside the window.
    pub fn admits(&self, record: &Record) -> bool {
        match self.cutoff {
            Some(cutoff) => record.end_time >= cutoff,
            None => true,
        }
    }
}

/// Parse a relative range; `None` for `*`.
pub fn parse_range(range: &str) -> Result<Option<std::time::Duration>, ConfigError> {
    let range = range.trim();
    if range == "*" {
        return Ok(None);
    }
    humantime::parse_duration(&range.to_lowercase())
        .map(Some)
        .map_err(|e| ConfigError::InvalidRange {
            range: range.to_string(),
            reason: e.to_string(),
        })
}
