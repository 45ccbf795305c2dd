use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::schedule::IntervalUnit;

/// Hour of day (UTC) that computed billing dates are anchored to.
pub const BILLING_HOUR: u32 = 13;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl std::str::FromStr for WeekStart {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monday" => Ok(Self::Monday),
            "sunday" => Ok(Self::Sunday),
            other => Err(format!("unsupported week start `{other}` (expected monday|sunday)")),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("date arithmetic out of range while computing {operation}")]
    OutOfRange { operation: &'static str },
}

fn out_of_range(operation: &'static str) -> DateError {
    DateError::OutOfRange { operation }
}

fn at_time(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    date.and_time(time).and_utc()
}

pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at_time(at.date_naive(), NaiveTime::MIN)
}

pub fn end_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
    at_time(at.date_naive(), last)
}

/// Moves `at` to [`BILLING_HOUR`] on the same calendar day.
pub fn at_billing_hour(at: DateTime<Utc>) -> DateTime<Utc> {
    let midday = NaiveTime::from_hms_opt(BILLING_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
    at_time(at.date_naive(), midday)
}

pub fn add_days(at: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, DateError> {
    TimeDelta::try_days(days)
        .and_then(|delta| at.checked_add_signed(delta))
        .ok_or_else(|| out_of_range("add_days"))
}

pub fn add_weeks(at: DateTime<Utc>, weeks: i64) -> Result<DateTime<Utc>, DateError> {
    let days = weeks.checked_mul(7).ok_or_else(|| out_of_range("add_weeks"))?;
    add_days(at, days)
}

/// Calendar month addition; the day is clamped to the end of shorter months.
pub fn add_months(at: DateTime<Utc>, months: i64) -> Result<DateTime<Utc>, DateError> {
    let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| out_of_range("add_months"))?;
    let shifted = if months >= 0 {
        at.checked_add_months(Months::new(magnitude))
    } else {
        at.checked_sub_months(Months::new(magnitude))
    };
    shifted.ok_or_else(|| out_of_range("add_months"))
}

pub fn add_intervals(
    at: DateTime<Utc>,
    unit: IntervalUnit,
    count: i64,
) -> Result<DateTime<Utc>, DateError> {
    match unit {
        IntervalUnit::Week => add_weeks(at, count),
        IntervalUnit::Month => add_months(at, count),
    }
}

pub fn start_of_week(at: DateTime<Utc>, week_start: WeekStart) -> Result<DateTime<Utc>, DateError> {
    let offset = match week_start {
        WeekStart::Monday => at.weekday().num_days_from_monday(),
        WeekStart::Sunday => at.weekday().num_days_from_sunday(),
    };
    add_days(start_of_day(at), -i64::from(offset))
}

pub fn end_of_week(at: DateTime<Utc>, week_start: WeekStart) -> Result<DateTime<Utc>, DateError> {
    let last_day = add_days(start_of_week(at, week_start)?, 6)?;
    Ok(end_of_day(last_day))
}

pub fn start_of_month(at: DateTime<Utc>) -> Result<DateTime<Utc>, DateError> {
    let first = at.date_naive().with_day(1).ok_or_else(|| out_of_range("start_of_month"))?;
    Ok(at_time(first, NaiveTime::MIN))
}

pub fn end_of_month(at: DateTime<Utc>) -> Result<DateTime<Utc>, DateError> {
    let next_month = add_months(start_of_month(at)?, 1)?;
    let last_day = add_days(next_month, -1)?;
    Ok(end_of_day(last_day))
}

/// Whole calendar days from `from` to `to`; negative when `to` lies before `from`.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to.date_naive() - from.date_naive()).num_days()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

    use super::*;

    fn at(raw: &str) -> DateTime<Utc> {
        raw.parse().expect("valid timestamp")
    }

    #[test]
    fn billing_hour_anchor_keeps_calendar_day() {
        let anchored = at_billing_hour(at("2024-03-10T23:45:00Z"));
        assert_eq!(anchored, at("2024-03-10T13:00:00Z"));
    }

    #[test]
    fn month_addition_clamps_to_shorter_months() {
        let shifted = add_months(at("2024-01-31T13:00:00Z"), 1).expect("in range");
        assert_eq!(shifted, at("2024-02-29T13:00:00Z"));

        let back = add_months(at("2024-03-31T13:00:00Z"), -1).expect("in range");
        assert_eq!(back, at("2024-02-29T13:00:00Z"));
    }

    #[test]
    fn week_boundaries_follow_configured_week_start() {
        // 2024-05-15 is a Wednesday
        let now = at("2024-05-15T08:30:00Z");

        let monday = start_of_week(now, WeekStart::Monday).expect("in range");
        assert_eq!(monday, at("2024-05-13T00:00:00Z"));
        assert_eq!(monday.weekday(), Weekday::Mon);

        let sunday = start_of_week(now, WeekStart::Sunday).expect("in range");
        assert_eq!(sunday, at("2024-05-12T00:00:00Z"));

        let end = end_of_week(now, WeekStart::Monday).expect("in range");
        assert_eq!(end.date_naive(), at("2024-05-19T00:00:00Z").date_naive());
        assert_eq!(end.hour(), 23);
    }

    #[test]
    fn month_boundaries_cover_leap_february() {
        let now = at("2024-02-10T10:00:00Z");
        assert_eq!(start_of_month(now).expect("in range"), at("2024-02-01T00:00:00Z"));

        let end = end_of_month(now).expect("in range");
        assert_eq!(end.date_naive(), at("2024-02-29T00:00:00Z").date_naive());
        assert_eq!((end.hour(), end.minute(), end.second()), (23, 59, 59));
    }

    #[test]
    fn days_between_counts_calendar_days_and_may_be_negative() {
        let today = start_of_day(at("2024-01-15T18:00:00Z"));
        assert_eq!(days_between(today, at("2024-02-01T13:00:00Z")), 17);
        assert_eq!(days_between(today, at("2024-01-15T13:00:00Z")), 0);
        assert_eq!(days_between(today, at("2024-01-10T13:00:00Z")), -5);
    }

    #[test]
    fn interval_addition_dispatches_on_unit() {
        let start = at("2024-01-01T13:00:00Z");
        assert_eq!(
            add_intervals(start, IntervalUnit::Week, 2).expect("in range"),
            at("2024-01-15T13:00:00Z")
        );
        assert_eq!(
            add_intervals(start, IntervalUnit::Month, 6).expect("in range"),
            at("2024-07-01T13:00:00Z")
        );
    }

    #[test]
    fn week_start_parses_case_insensitively() {
        assert_eq!("Sunday".parse::<WeekStart>(), Ok(WeekStart::Sunday));
        assert!("friday".parse::<WeekStart>().is_err());
    }
}
