//! Wall-clock helpers: `HH:MM` times of day and activity dates.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// A time of day with minute resolution, written as `HH:MM`.
///
/// Ordering is by minute of day, so `start <= t <= end` comparisons work
/// directly on parsed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    minutes: u16,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidTime(format!("{hour}:{minute}")));
        }
        Ok(Self {
            minutes: u16::from(hour) * 60 + u16::from(minute),
        })
    }

    /// Build from minutes since midnight; `None` past 23:59.
    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self { minutes })
    }

    pub fn minute_of_day(self) -> u16 {
        self.minutes
    }

    pub fn hour(self) -> u8 {
        (self.minutes / 60) as u8
    }

    pub fn minute(self) -> u8 {
        (self.minutes % 60) as u8
    }

    /// Add `minutes`, returning `None` when the result crosses midnight.
    pub fn checked_add_minutes(self, minutes: u32) -> Option<Self> {
        let total = u32::from(self.minutes).checked_add(minutes)?;
        u16::try_from(total).ok().and_then(Self::from_minutes)
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;

        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Parse an activity date.
///
/// Older clients stored the full ISO timestamp of the picked day, newer ones
/// store the plain calendar date. Both are accepted.
pub fn parse_activity_date(s: &str) -> Result<NaiveDate, ValidationError> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .map_err(|_| ValidationError::InvalidDate(s.to_string()))
}

/// Serde adapter for activity dates: lenient on input, `YYYY-MM-DD` on output.
pub mod activity_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_activity_date(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let t: TimeOfDay = "08:05".parse().unwrap();
        assert_eq!(t.minute_of_day(), 485);
        assert_eq!(t.to_string(), "08:05");

        let short: TimeOfDay = "7:30".parse().unwrap();
        assert_eq!(short.to_string(), "07:30");
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["", "8", "24:00", "12:60", "12:5", "ab:cd", "-1:00", "12:00:00"] {
            assert!(bad.parse::<TimeOfDay>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_ordering_by_minute_of_day() {
        let a: TimeOfDay = "07:59".parse().unwrap();
        let b: TimeOfDay = "08:00".parse().unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_checked_add_stops_at_midnight() {
        let t: TimeOfDay = "23:00".parse().unwrap();
        assert_eq!(t.checked_add_minutes(59).unwrap().to_string(), "23:59");
        assert!(t.checked_add_minutes(60).is_none());
    }

    #[test]
    fn test_activity_date_formats() {
        let plain = parse_activity_date("2025-03-10").unwrap();
        let iso = parse_activity_date("2025-03-10T12:00:00.000Z").unwrap();
        assert_eq!(plain, iso);
        assert!(parse_activity_date("10/03/2025").is_err());
    }
}
