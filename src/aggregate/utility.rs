use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use std::fmt;

/// Timestamp given to rows whose date cannot be parsed. Sorts before every valid timestamp.
pub const INVALID_TIMESTAMP: i64 = i64::MIN;

/// Conversion rate in percent.
///
/// `None` when visits are missing or zero, or when conversions are missing.
/// Not clamped: more conversions than visits gives a rate above 100.
pub fn conversion_rate(visits: Option<u64>, conversions: Option<u64>) -> Option<f64> {
    match (visits, conversions) {
        (Some(v), Some(c)) if v != 0 => Some(c as f64 / v as f64 * 100.0),
        _ => None,
    }
}

/// Parses a row date as a point in time in `tz`.
///
/// Plain `YYYY-MM-DD` dates resolve to local midnight. Full RFC 3339
/// timestamps are also accepted and converted into `tz`.
pub fn parse_date<Tz: TimeZone>(date: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return local_midnight(day, tz);
    }

    DateTime::parse_from_rfc3339(date)
        .ok()
        .map(|dt| dt.with_timezone(tz))
}

/// Epoch millis of a row date, or [`INVALID_TIMESTAMP`].
pub fn parse_timestamp<Tz: TimeZone>(date: &str, tz: &Tz) -> i64 {
    parse_date(date, tz)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(INVALID_TIMESTAMP)
}

fn local_midnight<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> Option<DateTime<Tz>> {
    let midnight = day.and_hms_opt(0, 0, 0)?;

    // Zones that jump over midnight start the day at the first valid instant.
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
}

/// Year-relative week bucket.
///
/// Week 1 is the first seven days of the row's local calendar year and the
/// count restarts every January 1st. This is not ISO-8601 week numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeekKey {
    Week { year: i32, week: i64 },
    Invalid,
}

impl WeekKey {
    /// Bucket of `date`, taken from its calendar date in its own zone.
    pub fn of<Tz: TimeZone>(date: &DateTime<Tz>) -> Self {
        WeekKey::Week {
            year: date.year(),
            week: i64::from(date.ordinal0()) / 7 + 1,
        }
    }

    /// Display label, e.g. `Week 3 2024`.
    pub fn label(&self) -> String {
        match self {
            WeekKey::Week { year, week } => format!("Week {week} {year}"),
            WeekKey::Invalid => "Unknown week".to_string(),
        }
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekKey::Week { year, week } => write!(f, "{year}-W{week:02}"),
            WeekKey::Invalid => write!(f, "invalid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use chrono_tz::America::New_York;

    #[test]
    fn test_rate_null_cases() {
        assert_eq!(conversion_rate(None, Some(1)), None);
        assert_eq!(conversion_rate(Some(0), Some(1)), None);
        assert_eq!(conversion_rate(Some(0), Some(0)), None);
        assert_eq!(conversion_rate(Some(10), None), None);
    }

    #[test]
    fn test_rate_values() {
        assert_eq!(conversion_rate(Some(100), Some(10)), Some(10.0));
        assert_eq!(conversion_rate(Some(50), Some(0)), Some(0.0));
        assert_eq!(conversion_rate(Some(4), Some(1)), Some(25.0));
    }

    #[test]
    fn test_rate_not_clamped() {
        assert_eq!(conversion_rate(Some(10), Some(15)), Some(150.0));
    }

    #[test]
    fn test_parse_timestamp_utc_midnight() {
        assert_eq!(parse_timestamp("2024-01-01", &Utc), 1_704_067_200_000);
        assert_eq!(parse_timestamp("1970-01-02", &Utc), 86_400_000);
    }

    #[test]
    fn test_parse_timestamp_uses_zone_midnight() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(
            parse_timestamp("2024-01-01", &plus_two),
            1_704_067_200_000 - 2 * 3600 * 1000
        );
    }

    #[test]
    fn test_parse_timestamp_rfc3339() {
        assert_eq!(
            parse_timestamp("2024-01-01T12:00:00Z", &Utc),
            1_704_067_200_000 + 12 * 3600 * 1000
        );
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        assert_eq!(parse_timestamp("not a date", &Utc), INVALID_TIMESTAMP);
        assert_eq!(parse_timestamp("2024-02-30", &Utc), INVALID_TIMESTAMP);
        assert_eq!(parse_timestamp("", &Utc), INVALID_TIMESTAMP);
    }

    fn week(date: &str) -> WeekKey {
        let dt = parse_date(date, &Utc).unwrap();
        WeekKey::of(&dt)
    }

    #[test]
    fn test_week_boundaries() {
        assert_eq!(week("2024-01-01"), WeekKey::Week { year: 2024, week: 1 });
        assert_eq!(week("2024-01-07"), WeekKey::Week { year: 2024, week: 1 });
        assert_eq!(week("2024-01-08"), WeekKey::Week { year: 2024, week: 2 });
        assert_eq!(week("2024-12-31"), WeekKey::Week { year: 2024, week: 53 });
    }

    #[test]
    fn test_week_resets_on_january_first() {
        // 2020-12-31 and 2021-01-01 share an ISO week but not a bucket here.
        assert_eq!(week("2020-12-31"), WeekKey::Week { year: 2020, week: 53 });
        assert_eq!(week("2021-01-01"), WeekKey::Week { year: 2021, week: 1 });
    }

    #[test]
    fn test_week_key_and_label_format() {
        let key = week("2024-01-10");
        assert_eq!(key.to_string(), "2024-W02");
        assert_eq!(key.label(), "Week 2 2024");

        let late = week("2024-03-20");
        assert_eq!(late.to_string(), "2024-W12");
        assert_eq!(late.label(), "Week 12 2024");

        assert_eq!(WeekKey::Invalid.label(), "Unknown week");
    }

    fn week_in_new_york(date: &str) -> WeekKey {
        let dt = parse_date(date, &New_York).unwrap();
        WeekKey::of(&dt)
    }

    #[test]
    fn test_week_follows_calendar_days_across_dst() {
        // Daylight saving starts in New York on 2024-03-10.
        assert_eq!(week_in_new_york("2024-03-10"), WeekKey::Week { year: 2024, week: 10 });
        assert_eq!(week_in_new_york("2024-03-11"), WeekKey::Week { year: 2024, week: 11 });
        assert_eq!(week_in_new_york("2024-03-18"), WeekKey::Week { year: 2024, week: 12 });
        assert_eq!(week_in_new_york("2024-10-28"), WeekKey::Week { year: 2024, week: 44 });
        assert_eq!(week_in_new_york("2024-11-04"), WeekKey::Week { year: 2024, week: 45 });
        assert_eq!(week_in_new_york("2024-03-11").label(), "Week 11 2024");
    }
}
