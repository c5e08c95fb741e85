use chrono::{NaiveDate, NaiveTime};

use crate::error::{AppError, Result};
use crate::models::movie::{self, DEFAULT_MOVIE};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Validates a seat label such as `C12`.
///
/// One or two letters followed by one to three digits; the result is upper-cased.
pub fn validate_seat(seat: &str) -> Result<String> {
    let seat = seat.trim().to_ascii_uppercase();
    let letters = seat.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    let digits = seat.len() - letters;

    let well_formed = (1..=2).contains(&letters)
        && (1..=3).contains(&digits)
        && seat[letters..].chars().all(|c| c.is_ascii_digit());

    if !well_formed {
        return Err(AppError::Validation(
            "Seat must be a row letter followed by a number, e.g. C12".to_string(),
        ));
    }
    Ok(seat)
}

/// Validates a `YYYY-MM-DD` date.
pub fn validate_date(date: &str) -> Result<String> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map(|d| d.format(DATE_FORMAT).to_string())
        .map_err(|_| AppError::Validation("Date must be in YYYY-MM-DD format".to_string()))
}

/// Validates an `HH:MM` showtime.
pub fn validate_time(time: &str) -> Result<String> {
    NaiveTime::parse_from_str(time.trim(), TIME_FORMAT)
        .map(|t| t.format(TIME_FORMAT).to_string())
        .map_err(|_| AppError::Validation("Time must be in HH:MM format".to_string()))
}

/// Resolves the movie named by the form; blank means the default title.
pub fn resolve_movie(title: Option<&str>) -> Result<String> {
    match title.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(DEFAULT_MOVIE.to_string()),
        Some(title) if title == DEFAULT_MOVIE => Ok(DEFAULT_MOVIE.to_string()),
        Some(title) => movie::find(title)
            .map(|m| m.title.to_string())
            .ok_or_else(|| AppError::Validation(format!("'{}' is not showing", title))),
    }
}
