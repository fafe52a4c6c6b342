use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::SchedulingError;

pub const MINUTES_PER_DAY: i64 = 1440;

/// Wall-clock time of day at minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Parses `HH:MM:SS` (or `HH:MM`). Seconds are truncated to the minute.
    pub fn parse(s: &str) -> Result<Self, SchedulingError> {
        let s = s.trim();
        let time = NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
            .map_err(|_| SchedulingError::Format(format!("invalid time of day: {s:?}")))?;
        Ok(Self((time.hour() * 60 + time.minute()) as u16))
    }

    pub fn from_minutes(minutes: i64) -> Result<Self, SchedulingError> {
        if !(0..MINUTES_PER_DAY).contains(&minutes) {
            return Err(SchedulingError::Range(minutes));
        }
        Ok(Self(minutes as u16))
    }

    pub fn minutes(self) -> i64 {
        i64::from(self.0)
    }

    pub fn hour(self) -> u32 {
        u32::from(self.0 / 60)
    }

    pub fn minute(self) -> u32 {
        u32::from(self.0 % 60)
    }

    /// Time reached after `minutes`, failing when it leaves the day.
    pub fn checked_add_minutes(self, minutes: i64) -> Result<Self, SchedulingError> {
        Self::from_minutes(self.minutes() + minutes)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:00", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Half-open span `[start, end)` within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Interval {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl Interval {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, SchedulingError> {
        if start >= end {
            return Err(SchedulingError::InvalidRequest(format!(
                "interval start {start} must be before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Builds an interval from raw minute offsets, both of which must lie in the day.
    pub fn from_minutes(start: i64, end: i64) -> Result<Self, SchedulingError> {
        Self::new(TimeOfDay::from_minutes(start)?, TimeOfDay::from_minutes(end)?)
    }

    pub fn duration_minutes(&self) -> i64 {
        self.end.minutes() - self.start.minutes()
    }

    /// Back-to-back intervals do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// Opening window of the spa, shared by every room and staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusinessHours {
    pub open: TimeOfDay,
    pub close: TimeOfDay,
}

impl BusinessHours {
    pub fn new(open: TimeOfDay, close: TimeOfDay) -> Self {
        Self { open, close }
    }

    /// The full opening window, or `None` when the spa never opens.
    pub fn window(&self) -> Option<Interval> {
        Interval::new(self.open, self.close).ok()
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate, SchedulingError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| SchedulingError::Format(format!("invalid date: {s:?}")))
}
