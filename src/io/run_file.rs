//! Read/write run JSON files.
//!
//! Run JSON is the "portable" representation of a forecast run:
//! - source and pair
//! - the daily series and its moving average
//! - the forecast, when one was available
//!
//! The schema is defined by `domain::ForecastFile`. Reading re-validates the
//! series ordering invariants.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::domain::ForecastFile;
use crate::domain::types::add_days;
use crate::error::{AppError, EXIT_USAGE};

/// Write a run JSON file.
pub fn write_run_json(path: &Path, run: &ForecastFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to create run JSON '{}': {e}", path.display())))?;

    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, run)
        .map_err(std::io::Error::from)
        .and_then(|()| out.flush())
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to write run JSON: {e}")))?;

    log::info!("wrote {}", path.display());
    Ok(())
}

/// Read a run JSON file.
pub fn read_run_json(path: &Path) -> Result<ForecastFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to open run JSON '{}': {e}", path.display())))?;
    let run: ForecastFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Invalid run JSON: {e}")))?;

    check_alignment(&run).map_err(|msg| AppError::new(EXIT_USAGE, format!("Invalid run JSON: {msg}")))?;
    Ok(run)
}

/// The moving average and forecast must line up with the series they came from.
fn check_alignment(run: &ForecastFile) -> Result<(), String> {
    if run.series.len() != run.smoothed.len() {
        return Err(format!(
            "series has {} days but moving average has {}",
            run.series.len(),
            run.smoothed.len()
        ));
    }
    let smoothed_start = run.smoothed.points().first().map(|p| p.date);
    if smoothed_start != Some(run.series.start()) {
        return Err(format!(
            "moving average does not start on the series start {}",
            run.series.start()
        ));
    }
    if run.window != run.smoothed.window() {
        return Err(format!(
            "window {} does not match moving-average window {}",
            run.window,
            run.smoothed.window()
        ));
    }
    if let Some(forecast) = &run.forecast {
        let expected = add_days(run.series.end(), 1);
        if forecast.dates.first().copied() != expected {
            return Err(format!("forecast does not start the day after {}", run.series.end()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{RateSeries, SourceKind, Symbol};
    use crate::forecast::{compute_sma, project_forecast};

    fn sample_run() -> ForecastFile {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let series = RateSeries::new(start, vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)]).unwrap();
        let smoothed = compute_sma(&series, 2).unwrap();
        let forecast = project_forecast(&smoothed, 3).ok();
        ForecastFile {
            tool: "fx".to_string(),
            source: SourceKind::Sample,
            base: Symbol::new("USD").unwrap(),
            target: Symbol::new("EUR").unwrap(),
            window: 2,
            series,
            smoothed,
            forecast,
        }
    }

    #[test]
    fn write_then_read_preserves_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let run = sample_run();

        write_run_json(&path, &run).unwrap();
        let back = read_run_json(&path).unwrap();
        assert_eq!(back, run);
    }

    #[test]
    fn tampered_dates_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        write_run_json(&path, &sample_run()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let tampered = text.replacen("2021-01-02", "2021-01-09", 1);
        std::fs::write(&path, tampered).unwrap();

        let err = read_run_json(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid run JSON"));
    }

    #[test]
    fn misaligned_moving_average_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        write_run_json(&path, &sample_run()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        // Shift the moving-average dates a year; they stay contiguous.
        let (head, tail) = text.split_at(text.find("\"smoothed\"").unwrap());
        let shifted = tail.replacen("2021-01-0", "2022-01-0", 4);
        std::fs::write(&path, format!("{head}{shifted}")).unwrap();
        let err = read_run_json(&path).unwrap_err();
        assert!(err.to_string().contains("moving average does not start"));

        // Top-level window disagreeing with the moving average.
        let text = text.replacen("\"window\": 2", "\"window\": 9", 1);
        std::fs::write(&path, text).unwrap();
        let err = read_run_json(&path).unwrap_err();
        assert!(err.to_string().contains("window 9"));
    }

    #[test]
    fn forecast_must_follow_series_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let mut run = sample_run();
        if let Some(f) = run.forecast.as_mut() {
            f.dates = vec![
                NaiveDate::from_ymd_opt(2021, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2021, 2, 2).unwrap(),
                NaiveDate::from_ymd_opt(2021, 2, 3).unwrap(),
            ];
        }
        write_run_json(&path, &run).unwrap();
        let err = read_run_json(&path).unwrap_err();
        assert!(err.to_string().contains("forecast does not start"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn full_device_write_fails() {
        let err = write_run_json(Path::new("/dev/full"), &sample_run()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);
        assert!(err.to_string().contains("Failed to write run JSON"));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_run_json(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }
}
