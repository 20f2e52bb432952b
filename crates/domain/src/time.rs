//! Local calendar-day helpers.
//!
//! Instants are stored in UTC; day boundaries follow the deployment's local
//! calendar, `[00:00:00.000, 23:59:59.999]`.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, Result};

const LAST_MILLISECOND: i64 = 86_399_999;

/// Converts a local wall-clock time to UTC.
///
/// Ambiguous times resolve to the earlier instant; times skipped by a DST
/// gap resolve to the first valid local time after the gap.
pub fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    let resolved = Local
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(naive + TimeDelta::hours(1)))
                .earliest()
        });
    match resolved {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}

/// First instant of a local calendar day.
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    local_to_utc(day.and_time(NaiveTime::MIN))
}

/// Last millisecond of a local calendar day.
pub fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    local_to_utc(day.and_time(NaiveTime::MIN) + TimeDelta::milliseconds(LAST_MILLISECOND))
}

/// The local calendar day an instant falls on.
pub fn local_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// Today's local calendar day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// First day of the month containing `day`.
pub fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// Parses a `YYYY-MM-DD` day, or the local day of an RFC 3339 instant.
pub fn parse_day(input: &str) -> Result<NaiveDate> {
    let input = input.trim();
    if let Ok(day) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(day);
    }
    DateTime::parse_from_rfc3339(input)
        .map(|instant| local_day(instant.with_timezone(&Utc)))
        .map_err(|_| InventoryError::validation(format!("invalid date: {input:?}")))
}

/// Parses an RFC 3339 instant; a bare `YYYY-MM-DD` means local midnight.
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(start_of_day)
        .map_err(|_| InventoryError::validation(format!("invalid date: {input:?}")))
}

/// An inclusive range of instants covering whole local days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Covers a single local day.
    pub fn day(day: NaiveDate) -> Self {
        Self {
            start: start_of_day(day),
            end: end_of_day(day),
        }
    }

    /// Covers `first` through `last`, both inclusive.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Result<Self> {
        if last < first {
            return Err(InventoryError::validation(format!(
                "end date {last} is before start date {first}"
            )));
        }
        Ok(Self {
            start: start_of_day(first),
            end: end_of_day(last),
        })
    }

    pub fn today() -> Self {
        Self::day(today())
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// Serde helpers accepting RFC 3339 instants or bare `YYYY-MM-DD` days.
pub mod flexible {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, de::Error};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_instant(&raw).map_err(D::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, de::Error};

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::super::parse_instant(&raw)
                    .map(Some)
                    .map_err(D::Error::custom),
                None => Ok(None),
            }
        }
    }
}
