//! The hour-granularity timestamp token and date stepper.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CenturyError;

/// Address of one hourly snapshot: `YYYY-MM-DD HH`, UTC.
///
/// Parsing is strict: fixed width, zero padded, calendar-valid. Stepping
/// delegates to chrono, so day, month, year and leap-day rollover come from
/// the calendar rather than from day-count arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourStamp(DateTime<Utc>);

impl HourStamp {
    /// The following hour's token. Input is assumed valid by construction.
    pub fn next(&self) -> HourStamp {
        HourStamp(self.0 + Duration::hours(1))
    }

    /// Start of this hour.
    pub fn start(&self) -> DateTime<Utc> {
        self.0
    }

    /// Start of the next hour, the exclusive end of this snapshot's range.
    pub fn end(&self) -> DateTime<Utc> {
        self.0 + Duration::hours(1)
    }
}

impl fmt::Display for HourStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H"))
    }
}

impl FromStr for HourStamp {
    type Err = CenturyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CenturyError::InvalidHourToken(s.to_string());

        // Fixed-width shape: digits everywhere except the two dashes and
        // the single space.
        let b = s.as_bytes();
        let shaped = b.len() == 13
            && b.iter()
                .enumerate()
                .all(|(i, c)| match i {
                    4 | 7 => *c == b'-',
                    10 => *c == b' ',
                    _ => c.is_ascii_digit(),
                });
        if !shaped {
            return Err(invalid());
        }

        let year: i32 = s[0..4].parse().map_err(|_| invalid())?;
        let month: u32 = s[5..7].parse().map_err(|_| invalid())?;
        let day: u32 = s[8..10].parse().map_err(|_| invalid())?;
        let hour: u32 = s[11..13].parse().map_err(|_| invalid())?;

        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
        let naive = date.and_hms_opt(hour, 0, 0).ok_or_else(invalid)?;
        Ok(HourStamp(Utc.from_utc_datetime(&naive)))
    }
}

impl Serialize for HourStamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HourStamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
