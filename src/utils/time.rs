//! Time utilities: shift arithmetic across midnight, timestamp text format,
//! human readable durations.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};

/// Seconds in a wall-clock day.
pub const DAY_SECONDS: i64 = 24 * 60 * 60;

/// Storage format for timestamps: fixed width, so text order is time order.
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Shift start/end format as stored in `users`.
pub const SHIFT_FORMAT: &str = "%H:%M:%S";

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format(TS_FORMAT).to_string()
}

/// Parse a stored timestamp. Fractional seconds are optional so rows written
/// by other tools (`YYYY-MM-DD HH:MM:SS`) still load.
pub fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc())
}

/// Parse a shift time given as `HH:MM:SS` or `HH:MM`.
pub fn parse_shift_time(t: &str) -> AppResult<NaiveTime> {
    let t = t.trim();
    NaiveTime::parse_from_str(t, SHIFT_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
        .map_err(|_| AppError::InvalidTime(t.to_string()))
}

pub fn format_shift_time(t: NaiveTime) -> String {
    t.format(SHIFT_FORMAT).to_string()
}

/// Length of a shift in seconds on a 24h wall clock.
///
/// When `end <= start` the shift ends on the following day, so `22:00 → 06:00`
/// is eight hours and `09:00 → 09:00` is a full day.
pub fn shift_duration_seconds(start: NaiveTime, end: NaiveTime) -> i64 {
    let span = (end - start).num_seconds();
    if span <= 0 { span + DAY_SECONDS } else { span }
}

/// Overtime contribution for a day: active time beyond the shift length, never negative.
pub fn overtime_beyond_shift(active_seconds: i64, shift_seconds: i64) -> i64 {
    (active_seconds - shift_seconds).max(0)
}

/// `3725` → `01h 02m 05s`
pub fn secs2readable(secs: i64) -> String {
    let sign = if secs < 0 { "-" } else { "" };
    let s = secs.abs();
    format!(
        "{}{:02}h {:02}m {:02}s",
        sign,
        s / 3600,
        (s % 3600) / 60,
        s % 60
    )
}
