//! Timestamp decomposition
//!
//! Maps an epoch-millisecond event time to the calendar fields stored in
//! the time dimension. All fields are computed in UTC.

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Calendar fields derived from one event timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeParts {
    /// Seconds since the Unix epoch (milliseconds truncated)
    pub start_time: i64,
    /// Hour of day, 0-23
    pub hour: u32,
    /// Day of month, 1-31
    pub day: u32,
    /// ISO-8601 week of year, 1-53
    pub week: u32,
    /// Month, 1-12
    pub month: u32,
    pub year: i32,
    /// Full English weekday name, e.g. "Monday"
    pub weekday: String,
}

impl TimeParts {
    /// The decomposed instant as a UTC datetime
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.start_time, 0)
    }
}

/// Truncate epoch milliseconds to whole seconds (toward zero)
pub fn epoch_seconds(ts_ms: i64) -> i64 {
    ts_ms / 1000
}

/// Decompose an epoch-millisecond timestamp into calendar fields.
///
/// Returns `None` when the instant is outside chrono's representable range.
pub fn decompose(ts_ms: i64) -> Option<TimeParts> {
    let start_time = epoch_seconds(ts_ms);
    let dt = DateTime::from_timestamp(start_time, 0)?;

    Some(TimeParts {
        start_time,
        hour: dt.hour(),
        day: dt.day(),
        week: dt.iso_week().week(),
        month: dt.month(),
        year: dt.year(),
        weekday: dt.format("%A").to_string(),
    })
}
