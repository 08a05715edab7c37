//! Forecast calendars and response assembly.
//!
//! Forecast values come back from a model as a bare sequence; this module
//! attaches a calendar date to each value according to the requested cadence.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// Time-step granularity of a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cadence {
    #[default]
    Daily,
    /// Sunday-anchored, 7 days apart.
    Weekly,
    /// Sunday-anchored, 14 days apart.
    Biweekly,
    /// First day of each month.
    Monthly,
}

impl Cadence {
    pub const ALL: [Cadence; 4] = [
        Cadence::Daily,
        Cadence::Weekly,
        Cadence::Biweekly,
        Cadence::Monthly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
            Cadence::Biweekly => "biweekly",
            Cadence::Monthly => "monthly",
        }
    }

    /// Parse a cadence name, falling back to [`Cadence::Daily`] for anything
    /// unrecognised.
    pub fn parse_or_daily(s: &str) -> Self {
        s.parse().unwrap_or(Cadence::Daily)
    }
}

impl FromStr for Cadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Cadence::Daily),
            "weekly" => Ok(Cadence::Weekly),
            "biweekly" => Ok(Cadence::Biweekly),
            "monthly" => Ok(Cadence::Monthly),
            other => Err(format!("Unknown forecast type: {}", other)),
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single dated forecast value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_quantity: f64,
    /// 1-based position within the forecast horizon.
    pub step: usize,
}

/// Parse a forecast start date.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYYMMDD`, RFC 3339 timestamps and
/// naive `YYYY-MM-DD[T ]HH:MM:SS` timestamps; only the calendar date is kept.
pub fn parse_date(s: &str) -> ServiceResult<NaiveDate> {
    let s = s.trim();
    if let Some(date) = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
        .ok_or_else(|| ServiceError::validation(format!("Invalid start_date '{}': expected YYYY-MM-DD", s)))
}

/// Build `steps` forecast dates starting at `start`.
///
/// Weekly and biweekly calendars begin on the first Sunday on or after
/// `start`; monthly calendars begin on the first month start on or after it.
pub fn build_calendar(start: NaiveDate, steps: usize, cadence: Cadence) -> ServiceResult<Vec<NaiveDate>> {
    let out_of_range = || ServiceError::validation(format!("Forecast calendar from {} overflows the supported date range", start));

    let mut dates = Vec::with_capacity(steps);
    match cadence {
        Cadence::Daily => {
            for i in 0..steps {
                dates.push(start.checked_add_days(Days::new(i as u64)).ok_or_else(out_of_range)?);
            }
        }
        Cadence::Weekly | Cadence::Biweekly => {
            let stride = if cadence == Cadence::Weekly { 7 } else { 14 };
            let to_sunday = (7 - start.weekday().num_days_from_sunday()) % 7;
            let anchor = start
                .checked_add_days(Days::new(u64::from(to_sunday)))
                .ok_or_else(out_of_range)?;
            for i in 0..steps {
                dates.push(anchor.checked_add_days(Days::new(i as u64 * stride)).ok_or_else(out_of_range)?);
            }
        }
        Cadence::Monthly => {
            let first_of_month = start.with_day(1).ok_or_else(out_of_range)?;
            let anchor = if start.day() == 1 {
                first_of_month
            } else {
                first_of_month.checked_add_months(Months::new(1)).ok_or_else(out_of_range)?
            };
            for i in 0..steps {
                let months = u32::try_from(i).map_err(|_| out_of_range())?;
                dates.push(anchor.checked_add_months(Months::new(months)).ok_or_else(out_of_range)?);
            }
        }
    }
    Ok(dates)
}

/// Pair dates with predictions positionally.
///
/// The result is as long as the shorter of the two inputs.
pub fn assemble(dates: &[NaiveDate], predictions: &[f64]) -> Vec<ForecastPoint> {
    dates
        .iter()
        .zip(predictions)
        .enumerate()
        .map(|(i, (date, value))| ForecastPoint {
            date: *date,
            predicted_quantity: *value,
            step: i + 1,
        })
        .collect()
}
