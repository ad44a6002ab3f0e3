//! Timestamp parsing for scheduling parameters.
//!
//! Classifier output uses several ISO-8601 shapes. Times without an offset
//! are taken as UTC. The guardrail hour is read in the timestamp's own zone.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// A parsed scheduling timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleTime {
    /// Wall-clock time in the zone the timestamp was written in.
    pub local: NaiveDateTime,
    /// The same instant in UTC.
    pub utc: DateTime<Utc>,
    /// The explicit offset, when the timestamp carried one.
    pub offset: Option<FixedOffset>,
}

impl ScheduleTime {
    pub fn hour(&self) -> u32 {
        self.local.hour()
    }

    /// Render another wall-clock time in this timestamp's zone, keeping
    /// the offset suffix only if the input had one.
    pub fn format_in_zone(&self, wall: NaiveDateTime) -> String {
        match self.offset.and_then(|o| o.from_local_datetime(&wall).single()) {
            Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
            None => wall.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

/// Parse an ISO-8601 timestamp, date-time or date-only.
pub fn parse_schedule_time(raw: &str) -> Option<ScheduleTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(ScheduleTime {
            local: dt.naive_local(),
            utc: dt.with_timezone(&Utc),
            offset: Some(*dt.offset()),
        });
    }

    let naive = raw.strip_suffix('Z').unwrap_or(raw);
    let parsed = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(naive, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    Some(ScheduleTime {
        local: parsed,
        utc: parsed.and_utc(),
        offset: None,
    })
}
