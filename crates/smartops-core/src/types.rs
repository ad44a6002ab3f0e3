//! Shared value types used across the SmartOps crates.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Daily operational window, `start_hour` inclusive to `end_hour` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationalWindow {
    start_hour: u32,
    end_hour: u32,
}

impl OperationalWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    /// Whether a wall-clock hour falls inside the window.
    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.start_hour && hour < self.end_hour
    }

    /// The opening of the window on the given day.
    pub fn opening_on(&self, date: NaiveDate) -> NaiveDateTime {
        let time = NaiveTime::from_hms_opt(self.start_hour, 0, 0).unwrap_or_default();
        date.and_time(time)
    }

    /// Human-readable form, e.g. `08:00-18:00`.
    pub fn label(&self) -> String {
        format!("{:02}:00-{:02}:00", self.start_hour, self.end_hour)
    }
}

impl Default for OperationalWindow {
    fn default() -> Self {
        Self::new(8, 18)
    }
}
