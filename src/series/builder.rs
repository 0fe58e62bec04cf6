//! Daily series assembly.
//!
//! One lookup per calendar day, ascending. A failed or nonsensical lookup
//! becomes a missing value for that day only; the rest of the range is
//! unaffected.

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::data::RateSource;
use crate::domain::{RateDate, RateSeries, Symbol, date_range};
use crate::error::{ForecastError, RateUnavailable};

/// Build the daily series for `base`/`target` over `[start, end]`.
///
/// `rate_fn` is called exactly once per day, in date order.
pub fn build_series<F>(
    base: &Symbol,
    target: &Symbol,
    start: NaiveDate,
    end: NaiveDate,
    mut rate_fn: F,
) -> Result<RateSeries, ForecastError>
where
    F: FnMut(&Symbol, &Symbol, NaiveDate) -> Result<f64, RateUnavailable>,
{
    check_range(start, end)?;

    let values = date_range(start, end)
        .into_iter()
        .map(|date| accept(base, target, date, rate_fn(base, target, date)))
        .collect();

    finish(base, target, start, values)
}

/// `build_series` driven by a `RateSource`.
pub fn build_series_from_source(
    source: &dyn RateSource,
    base: &Symbol,
    target: &Symbol,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<RateSeries, ForecastError> {
    log::debug!("{}: fetching {base}/{target} {start}..{end}", source.name());
    build_series(base, target, start, end, |b, t, d| source.get_rate(b, t, RateDate::On(d)))
}

/// Same output as `build_series_from_source`, with lookups spread over `jobs`
/// worker threads. `jobs == 1` runs sequentially on the calling thread.
pub fn build_series_parallel(
    source: &dyn RateSource,
    base: &Symbol,
    target: &Symbol,
    start: NaiveDate,
    end: NaiveDate,
    jobs: usize,
) -> Result<RateSeries, ForecastError> {
    if jobs == 0 {
        return Err(ForecastError::invalid("jobs", "must be >= 1"));
    }
    if jobs == 1 {
        return build_series_from_source(source, base, target, start, end);
    }
    check_range(start, end)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| ForecastError::invalid("jobs", format!("failed to start worker pool: {e}")))?;

    log::debug!("{}: fetching {base}/{target} {start}..{end} on {jobs} workers", source.name());
    let dates = date_range(start, end);
    // Indexed parallel collect keeps the input order.
    let values: Vec<Option<f64>> = pool.install(|| {
        dates
            .par_iter()
            .map(|&date| accept(base, target, date, source.get_rate(base, target, RateDate::On(date))))
            .collect()
    });

    finish(base, target, start, values)
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), ForecastError> {
    if start > end {
        return Err(ForecastError::InvalidRange { start, end });
    }
    Ok(())
}

fn accept(base: &Symbol, target: &Symbol, date: NaiveDate, result: Result<f64, RateUnavailable>) -> Option<f64> {
    match result {
        Ok(rate) if rate.is_finite() && rate > 0.0 => Some(rate),
        Ok(rate) => {
            log::warn!("{base}/{target} {date}: discarding non-positive rate {rate}");
            None
        }
        Err(err) => {
            log::debug!("{base}/{target} {date}: {err}");
            None
        }
    }
}

fn finish(base: &Symbol, target: &Symbol, start: NaiveDate, values: Vec<Option<f64>>) -> Result<RateSeries, ForecastError> {
    let series = RateSeries::new(start, values)?;
    log::info!(
        "{base}/{target} {}..{}: {}/{} days quoted",
        series.start(),
        series.end(),
        series.present_count(),
        series.len()
    );
    Ok(series)
}
