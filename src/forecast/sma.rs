//! Trailing simple moving average.

use crate::domain::{RateSeries, SmoothedPoint, SmoothedSeries};
use crate::error::ForecastError;

/// Trailing SMA over `window` days.
///
/// `sma[i]` is defined only when `i >= window - 1` and every value in
/// `value[i+1-window..=i]` is present. Missing inputs are never interpolated.
pub fn compute_sma(series: &RateSeries, window: usize) -> Result<SmoothedSeries, ForecastError> {
    if window == 0 {
        return Err(ForecastError::invalid("window", "must be >= 1"));
    }

    let values = series.values();
    let points = series
        .points()
        .iter()
        .enumerate()
        .map(|(i, p)| SmoothedPoint {
            date: p.date,
            sma: window_mean(&values, i, window),
        })
        .collect();

    Ok(SmoothedSeries::from_parts(window, points))
}

/// Mean of the `window` values ending at `i`, summed fresh from the slice so
/// the result does not depend on evaluation history.
fn window_mean(values: &[Option<f64>], i: usize, window: usize) -> Option<f64> {
    if i + 1 < window {
        return None;
    }
    let mut sum = 0.0;
    for v in &values[i + 1 - window..=i] {
        sum += (*v)?;
    }
    Some(sum / window as f64)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    use super::*;

    fn series(values: Vec<Option<f64>>) -> RateSeries {
        RateSeries::new(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(), values).unwrap()
    }

    #[test]
    fn window_of_two_over_full_data() {
        let s = series(vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)]);
        let sma = compute_sma(&s, 2).unwrap();
        assert_eq!(sma.values(), vec![None, Some(15.0), Some(25.0), Some(35.0)]);
        assert_eq!(sma.window(), 2);
    }

    #[test]
    fn missing_value_blanks_every_window_it_touches() {
        let s = series(vec![Some(10.0), None, Some(30.0), Some(40.0)]);
        let sma = compute_sma(&s, 2).unwrap();
        assert_eq!(sma.values(), vec![None, None, None, Some(35.0)]);
    }

    #[test]
    fn window_one_echoes_present_values() {
        let s = series(vec![Some(1.5), None, Some(2.5)]);
        let sma = compute_sma(&s, 1).unwrap();
        assert_eq!(sma.values(), s.values());
    }

    #[test]
    fn window_longer_than_series_is_all_missing() {
        let s = series(vec![Some(1.0), Some(2.0), Some(3.0)]);
        let sma = compute_sma(&s, 4).unwrap();
        assert!(sma.values().iter().all(Option::is_none));
        assert_eq!(sma.len(), 3);
    }

    #[test]
    fn dates_align_with_input() {
        let s = series(vec![Some(1.0), Some(2.0), Some(3.0)]);
        let sma = compute_sma(&s, 3).unwrap();
        let in_dates: Vec<_> = s.points().iter().map(|p| p.date).collect();
        let out_dates: Vec<_> = sma.points().iter().map(|p| p.date).collect();
        assert_eq!(in_dates, out_dates);
        assert_relative_eq!(sma.values()[2].unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_window_is_invalid() {
        let s = series(vec![Some(1.0)]);
        assert!(matches!(
            compute_sma(&s, 0),
            Err(ForecastError::InvalidParameter { name: "window", .. })
        ));
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let values: Vec<Option<f64>> = (0..200)
            .map(|i| if i % 17 == 0 { None } else { Some(1.0 + (i as f64 * 0.37).sin() * 0.1) })
            .collect();
        let s = series(values);
        let a = compute_sma(&s, 7).unwrap();
        let b = compute_sma(&s, 7).unwrap();
        let bits = |x: &SmoothedSeries| x.values().iter().map(|v| v.map(f64::to_bits)).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }
}
