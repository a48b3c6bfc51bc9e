use time::{OffsetDateTime, Time};

use crate::constants::MS_PER_DAY;

/// Current instant in milliseconds since the epoch.
pub fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

fn datetime_from_ms(ms: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(ms.div_euclid(1000)).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// Midnight (UTC) of the calendar day containing `ms`, in milliseconds.
pub fn start_of_day_ms(ms: i64) -> i64 {
    let midnight = datetime_from_ms(ms).replace_time(Time::MIDNIGHT);
    midnight.unix_timestamp() * 1000
}

/// Midnight (UTC) of the first day of the month containing `ms`.
pub fn start_of_month_ms(ms: i64) -> i64 {
    let dt = datetime_from_ms(ms);
    let first = dt
        .replace_day(1)
        .unwrap_or(dt)
        .replace_time(Time::MIDNIGHT);
    first.unix_timestamp() * 1000
}

/// `YYYY-MM-DD` for the calendar day containing `ms`.
pub fn date_string(ms: i64) -> String {
    let dt = datetime_from_ms(ms);
    format!("{:04}-{:02}-{:02}", dt.year(), dt.month() as u8, dt.day())
}

/// `HH:MM:SS` within the calendar day containing `ms`.
pub fn time_string(ms: i64) -> String {
    let dt = datetime_from_ms(ms);
    format!("{:02}:{:02}:{:02}", dt.hour(), dt.minute(), dt.second())
}

/// Whole days between `from_ms` and `to_ms`, rounded up and floored at 1.
/// Used as the denominator of the naive daily average.
pub fn days_between_floored(from_ms: i64, to_ms: i64) -> i64 {
    let span = (to_ms - from_ms).max(0);
    let days = (span + MS_PER_DAY - 1) / MS_PER_DAY;
    days.max(1)
}

/// Amounts must be positive and finite before any mutation is applied.
pub fn validate_amount(amount: f64) -> Result<(), String> {
    if !amount.is_finite() {
        return Err("Amount must be a finite number".to_string());
    }
    if amount <= 0.0 {
        return Err("Amount must be greater than zero".to_string());
    }
    Ok(())
}

pub fn validate_label(value: &str, field_name: &str, max_length: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} cannot be empty", field_name));
    }
    if value.len() > max_length {
        return Err(format!(
            "{} must be less than {} characters",
            field_name, max_length
        ));
    }
    Ok(())
}
