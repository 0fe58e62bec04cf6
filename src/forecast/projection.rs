//! Flat forecast from the final moving-average value.

use crate::domain::types::add_days;
use crate::domain::{Forecast, SmoothedSeries};
use crate::error::ForecastError;

/// Repeat the final SMA value for `horizon_days` days after the series end.
///
/// Reads the SMA at the last index only. If that value is missing (series
/// shorter than the window, or trailing gaps) there is no forecast; an
/// earlier defined value is not substituted.
pub fn project_forecast(smoothed: &SmoothedSeries, horizon_days: usize) -> Result<Forecast, ForecastError> {
    if horizon_days == 0 {
        return Err(ForecastError::invalid("horizon_days", "must be >= 1"));
    }

    let last = smoothed
        .last()
        .ok_or(ForecastError::NoForecastAvailable { last_date: None })?;
    let basis = last.sma.ok_or(ForecastError::NoForecastAvailable {
        last_date: Some(last.date),
    })?;

    let dates = (1..=horizon_days as u64)
        .map(|offset| add_days(last.date, offset))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| {
            ForecastError::invalid(
                "horizon_days",
                format!("{horizon_days} days after {} is past the end of the calendar", last.date),
            )
        })?;

    Ok(Forecast {
        horizon_days,
        basis_date: last.date,
        basis,
        dates,
        values: vec![basis; horizon_days],
    })
}
