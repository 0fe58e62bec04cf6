//! Export a run's series, moving average and forecast to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts:
//! one row per day, history first, then forecast days. Missing cells are empty.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{Forecast, RateSeries, SmoothedSeries};
use crate::error::{AppError, EXIT_USAGE};

/// Write the run to a CSV file.
pub fn write_series_csv(
    path: &Path,
    series: &RateSeries,
    smoothed: &SmoothedSeries,
    forecast: Option<&Forecast>,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    write_rows(&mut out, series, smoothed, forecast)
        .and_then(|()| out.flush())
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to write export CSV: {e}")))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn write_rows(
    out: &mut impl Write,
    series: &RateSeries,
    smoothed: &SmoothedSeries,
    forecast: Option<&Forecast>,
) -> std::io::Result<()> {
    writeln!(out, "date,rate,sma,forecast")?;
    for (p, s) in series.points().iter().zip(smoothed.points()) {
        writeln!(out, "{},{},{},", p.date, cell(p.value), cell(s.sma))?;
    }
    if let Some(f) = forecast {
        for (date, value) in f.rows() {
            writeln!(out, "{date},,,{value:.10}")?;
        }
    }
    Ok(())
}

fn cell(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.10}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::forecast::{compute_sma, project_forecast};

    #[test]
    fn csv_has_history_then_forecast() {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let s = RateSeries::new(start, vec![Some(1.0), None, Some(2.0), Some(4.0)]).unwrap();
        let sm = compute_sma(&s, 2).unwrap();
        let f = project_forecast(&sm, 2).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");
        write_series_csv(&path, &s, &sm, Some(&f)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 4 + 2);
        assert_eq!(lines[0], "date,rate,sma,forecast");
        assert_eq!(lines[2], "2021-01-02,,,");
        assert_eq!(lines[4], "2021-01-04,4.0000000000,3.0000000000,");
        assert_eq!(lines[5], "2021-01-05,,,3.0000000000");
    }

    #[test]
    fn unwritable_path_is_a_usage_error() {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let s = RateSeries::new(start, vec![Some(1.0)]).unwrap();
        let sm = compute_sma(&s, 1).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = write_series_csv(&dir.path().join("missing/run.csv"), &s, &sm, None).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }
}
