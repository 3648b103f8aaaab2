//! In-game calendar: validated dates, a linear hour count for ordering and
//! replay, and the four seasons.
//!
//! Dates follow the proleptic Gregorian calendar. The linear hour count is
//! measured from 1970-01-01T00:00 and may be negative.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

pub const HOURS_PER_DAY: i64 = 24;

/// A normalized calendar hour. Field order makes the derived `Ord`
/// chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameDate {
    pub year: i32,
    /// 1-12
    pub month: u32,
    /// 1-31, bounded by the month length
    pub day: u32,
    /// 0-23
    pub hour: u32,
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Days since 1970-01-01 for a civil date (Howard Hinnant's algorithm).
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (i64::from(month) + 9) % 12;
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

impl GameDate {
    pub fn new(year: i32, month: u32, day: u32, hour: u32) -> Result<Self, WeatherError> {
        let date = Self {
            year,
            month,
            day,
            hour,
        };
        date.validate()?;
        Ok(date)
    }

    /// Fails fast on any out-of-range component; never clamps.
    pub fn validate(&self) -> Result<(), WeatherError> {
        if !(1..=12).contains(&self.month) {
            return Err(WeatherError::InvalidDate {
                field: "month",
                value: i64::from(self.month),
            });
        }
        if self.day < 1 || self.day > days_in_month(self.year, self.month) {
            return Err(WeatherError::InvalidDate {
                field: "day",
                value: i64::from(self.day),
            });
        }
        if self.hour > 23 {
            return Err(WeatherError::InvalidDate {
                field: "hour",
                value: i64::from(self.hour),
            });
        }
        Ok(())
    }

    pub fn to_linear_hour(&self) -> i64 {
        days_from_civil(i64::from(self.year), self.month, self.day) * HOURS_PER_DAY
            + i64::from(self.hour)
    }

    pub fn from_linear_hour(hour: i64) -> Self {
        let (year, month, day) = civil_from_days(hour.div_euclid(HOURS_PER_DAY));
        Self {
            year: year as i32,
            month,
            day,
            hour: hour.rem_euclid(HOURS_PER_DAY) as u32,
        }
    }

    /// Day index since 1970-01-01.
    pub fn day_number(&self) -> i64 {
        days_from_civil(i64::from(self.year), self.month, self.day)
    }

    pub fn add_hours(&self, hours: i64) -> Self {
        Self::from_linear_hour(self.to_linear_hour() + hours)
    }

    pub fn start_of_day(&self) -> Self {
        Self { hour: 0, ..*self }
    }

    /// 1-based ordinal day.
    pub fn day_of_year(&self) -> u32 {
        (self.day_number() - days_from_civil(i64::from(self.year), 1, 1)) as u32 + 1
    }

    /// Position in the year as a fraction of a 365-day cycle, in `[0, 365)`.
    /// Leap years are compressed so the seasonal curve stays aligned with
    /// the calendar.
    pub fn year_position(&self) -> f32 {
        let elapsed = (self.day_of_year() - 1) as f32 + self.hour as f32 / 24.0;
        elapsed * 365.0 / days_in_year(self.year) as f32
    }

    pub fn season(&self) -> Season {
        Season::from_month(self.month)
    }
}

impl fmt::Display for GameDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:00",
            self.year, self.month, self.day, self.hour
        )
    }
}

impl FromStr for GameDate {
    type Err = WeatherError;

    /// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH`, `YYYY-MM-DDTHH:MM` and
    /// `YYYY-MM-DDTHH:MM:SS`. Minutes and seconds are truncated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || WeatherError::DateParse(s.to_string());
        let s = s.trim().trim_end_matches('Z');
        let (date_part, time_part) = match s.split_once('T') {
            Some((d, t)) => (d, Some(t)),
            None => (s, None),
        };

        let mut fields = date_part.splitn(3, '-');
        let year: i32 = fields
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(parse_err)?;
        let month: u32 = fields
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(parse_err)?;
        let day: u32 = fields
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(parse_err)?;

        let hour: u32 = match time_part {
            Some(t) => t
                .split(':')
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or_else(parse_err)?,
            None => 0,
        };

        GameDate::new(year, month, day, hour)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
        }
    }
}
