//! Reporting utilities: history rows, table maxima, and formatted terminal output.

use chrono::NaiveDate;

use crate::domain::{CompleteRow, RateSeries, SmoothedSeries};

pub mod format;

pub use format::*;

/// One day of history joined with its moving average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub rate: Option<f64>,
    pub sma: Option<f64>,
}

/// The most recent `limit` days of `series` joined with `smoothed`, oldest first.
pub fn recent_history(series: &RateSeries, smoothed: &SmoothedSeries, limit: usize) -> Vec<HistoryRow> {
    let skip = series.len().saturating_sub(limit);
    series
        .points()
        .iter()
        .zip(smoothed.points())
        .skip(skip)
        .map(|(p, s)| HistoryRow {
            date: p.date,
            rate: p.value,
            sma: s.sma,
        })
        .collect()
}

/// Index of the row holding each column's maximum (first one on ties).
pub fn column_max_rows(rows: &[CompleteRow]) -> Vec<Option<usize>> {
    let width = rows.first().map(|r| r.values.len()).unwrap_or(0);
    (0..width)
        .map(|col| {
            let mut best: Option<(usize, f64)> = None;
            for (i, row) in rows.iter().enumerate() {
                let v = row.values[col];
                if best.is_none_or(|(_, b)| v > b) {
                    best = Some((i, v));
                }
            }
            best.map(|(i, _)| i)
        })
        .collect()
}
