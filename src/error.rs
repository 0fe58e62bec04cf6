//! Error types.
//!
//! Two layers:
//!
//! - library errors (`RateUnavailable`, `ForecastError`) are typed enums so
//!   callers can match on the failure kind
//! - `AppError` is what the `fx` binary reports: a message plus the process
//!   exit code

use chrono::NaiveDate;
use thiserror::Error;

/// Exit code for usage, configuration and local I/O problems.
pub const EXIT_USAGE: u8 = 2;
/// Exit code when the data cannot support a forecast.
pub const EXIT_NO_FORECAST: u8 = 3;
/// Exit code for rate source failures that abort a command.
pub const EXIT_SOURCE: u8 = 4;

/// A single rate lookup failed.
///
/// The series builder downgrades every variant to a missing value; only
/// single-shot lookups (e.g. `fx latest`) surface it to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateUnavailable {
    #[error("network error: {0}")]
    Network(String),

    #[error("rate source returned HTTP {code}")]
    Status { code: u16 },

    #[error("rate limited by source")]
    RateLimited,

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("no quote for {date}")]
    NoQuote { date: NaiveDate },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Structural failures of the series/forecast core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("no forecast available: moving average is undefined at {}", fmt_last_date(.last_date))]
    NoForecastAvailable { last_date: Option<NaiveDate> },

    #[error("invalid series: {0}")]
    InvalidSeries(String),
}

impl ForecastError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ForecastError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

fn fmt_last_date(date: &Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.to_string(),
        None => "an empty series".to_string(),
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        let code = match err {
            ForecastError::NoForecastAvailable { .. } => EXIT_NO_FORECAST,
            _ => EXIT_USAGE,
        };
        AppError::new(code, err.to_string())
    }
}

impl From<RateUnavailable> for AppError {
    fn from(err: RateUnavailable) -> Self {
        AppError::new(EXIT_SOURCE, format!("Rate lookup failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_errors_map_to_exit_codes() {
        let none = ForecastError::NoForecastAvailable { last_date: None };
        assert_eq!(AppError::from(none).exit_code(), EXIT_NO_FORECAST);

        let bad = ForecastError::invalid("window", "must be >= 1");
        let app = AppError::from(bad);
        assert_eq!(app.exit_code(), EXIT_USAGE);
        assert_eq!(app.to_string(), "invalid parameter `window`: must be >= 1");
    }

    #[test]
    fn no_forecast_message_names_the_date() {
        let d = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let err = ForecastError::NoForecastAvailable { last_date: Some(d) };
        assert!(err.to_string().contains("2023-01-01"));
    }
}
