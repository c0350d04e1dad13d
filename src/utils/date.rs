use crate::errors::{AppError, AppResult};
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

pub fn parse_date(s: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| AppError::InvalidDate(s.to_string()))
}

pub fn format_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

/// Validate an inclusive `[start, end]` range.
pub fn check_range(start: NaiveDate, end: NaiveDate) -> AppResult<()> {
    if start > end {
        return Err(AppError::InvalidArgument(format!(
            "date range start {} is after end {}",
            start, end
        )));
    }
    Ok(())
}
