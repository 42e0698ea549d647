//! Dashboard reporting windows.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Reporting window selectable on the analytics dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "7d")]
    LastSevenDays,
    #[serde(rename = "30d")]
    LastThirtyDays,
    #[serde(rename = "month")]
    MonthToDate,
    #[serde(rename = "year")]
    YearToDate,
}

impl Timeframe {
    /// Parse a query value, falling back to the last seven days.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("30d") => Self::LastThirtyDays,
            Some("month") => Self::MonthToDate,
            Some("year") => Self::YearToDate,
            _ => Self::LastSevenDays,
        }
    }

    /// Inclusive start of the window ending at `now`.
    #[must_use]
    pub fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::LastSevenDays => now - Duration::days(7),
            Self::LastThirtyDays => now - Duration::days(30),
            Self::MonthToDate => start_of_day(now.year(), now.month(), 1).unwrap_or(now),
            Self::YearToDate => start_of_day(now.year(), 1, 1).unwrap_or(now),
        }
    }
}

fn start_of_day(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 30, 0).unwrap()
    }

    #[test]
    fn test_from_query_defaults_to_seven_days() {
        assert_eq!(Timeframe::from_query(None), Timeframe::LastSevenDays);
        assert_eq!(Timeframe::from_query(Some("bogus")), Timeframe::LastSevenDays);
        assert_eq!(Timeframe::from_query(Some("year")), Timeframe::YearToDate);
    }

    #[test]
    fn test_rolling_windows() {
        let now = at(2024, 3, 15, 12);
        assert_eq!(Timeframe::LastSevenDays.start(now), at(2024, 3, 8, 12));
        assert_eq!(Timeframe::LastThirtyDays.start(now), at(2024, 2, 14, 12));
    }

    #[test]
    fn test_calendar_windows() {
        let now = at(2024, 3, 15, 12);
        assert_eq!(
            Timeframe::MonthToDate.start(now),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            Timeframe::YearToDate.start(now),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }
}
