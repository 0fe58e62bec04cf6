//! Multi-target history tables.

use chrono::NaiveDate;

use crate::data::RateSource;
use crate::domain::{RateTable, Symbol};
use crate::error::ForecastError;
use crate::series::builder::build_series_parallel;

/// Build one series per target over the same range and join them by date.
pub fn build_table(
    source: &dyn RateSource,
    base: &Symbol,
    targets: &[Symbol],
    start: NaiveDate,
    end: NaiveDate,
    jobs: usize,
) -> Result<RateTable, ForecastError> {
    if targets.is_empty() {
        return Err(ForecastError::invalid("targets", "at least one target is required"));
    }

    let mut columns = Vec::with_capacity(targets.len());
    for target in targets {
        let series = build_series_parallel(source, base, target, start, end, jobs)?;
        columns.push((target.clone(), series));
    }

    RateTable::from_series(base.clone(), columns)
}
