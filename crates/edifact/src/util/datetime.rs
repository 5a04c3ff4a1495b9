//! EDIFACT date/time formatting and parsing.
//!
//! Covers the representations the service and sample segments use:
//! - UNB preparation date/time: `YYMMDD` and `HHMM` (UTC)
//! - DTM format code 102: `CCYYMMDD`, converted to days since Unix epoch

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// DTM date/time/period format qualifier for `CCYYMMDD`.
pub const DATE_FORMAT_102: &str = "102";

/// Error type for EDIFACT date parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeParseError {
    pub message: String,
}

impl std::fmt::Display for DateTimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DateTimeParseError {}

/// Returns true if the given year is a leap year.
fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Returns the number of days in a given month (1-indexed).
fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Calculates days since Unix epoch for a given date (Howard Hinnant's algorithm).
fn date_to_days(year: i32, month: u32, day: u32) -> i32 {
    let y = if month <= 2 { year - 1 } else { year } as i64;
    let m = if month <= 2 { month as i64 + 9 } else { month as i64 - 3 };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u32; // year of era
    let doy = (153 * m as u32 + 2) / 5 + day - 1; // day of year
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // day of era

    (era * 146097 + doe as i64 - 719468) as i32
}

/// Converts days since Unix epoch to (year, month, day).
fn days_to_date(days: i32) -> (i32, u32, u32) {
    let z = days as i64 + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };

    let year = if m <= 2 { y + 1 } else { y } as i32;
    (year, m, d)
}

// =====================
// UNB
// =====================

/// Formats Unix seconds as the UNB preparation date (`YYMMDD`) and time (`HHMM`), UTC.
pub fn format_unb_datetime(epoch_secs: i64) -> (String, String) {
    let days = epoch_secs.div_euclid(SECONDS_PER_DAY);
    let secs_of_day = epoch_secs.rem_euclid(SECONDS_PER_DAY);
    let (year, month, day) = days_to_date(days as i32);

    let date = format!("{:02}{:02}{:02}", year.rem_euclid(100), month, day);
    let time = format!(
        "{:02}{:02}",
        secs_of_day / SECONDS_PER_HOUR,
        (secs_of_day % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE
    );
    (date, time)
}

// =====================
// DTM 102
// =====================

/// Formats days since Unix epoch as `CCYYMMDD`.
pub fn format_date_102(days: i32) -> String {
    let (year, month, day) = days_to_date(days);
    format!("{:04}{:02}{:02}", year, month, day)
}

/// Parses a `CCYYMMDD` date and returns days since Unix epoch.
pub fn parse_date_102(date_str: &str) -> Result<i32, DateTimeParseError> {
    if date_str.len() != 8 || !date_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateTimeParseError {
            message: format!("Invalid CCYYMMDD date: {}", date_str),
        });
    }

    let year: i32 = date_str[..4].parse().map_err(|_| DateTimeParseError {
        message: format!("Invalid year in date: {}", date_str),
    })?;
    let month: u32 = date_str[4..6].parse().map_err(|_| DateTimeParseError {
        message: format!("Invalid month in date: {}", date_str),
    })?;
    let day: u32 = date_str[6..8].parse().map_err(|_| DateTimeParseError {
        message: format!("Invalid day in date: {}", date_str),
    })?;

    if !(1..=12).contains(&month) {
        return Err(DateTimeParseError {
            message: format!("Invalid month {} in date: {}", month, date_str),
        });
    }
    if day < 1 || day > days_in_month(year, month) {
        return Err(DateTimeParseError {
            message: format!("Invalid day {} for month {} in date: {}", day, month, date_str),
        });
    }

    Ok(date_to_days(year, month, day))
}
