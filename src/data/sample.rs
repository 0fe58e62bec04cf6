//! Deterministic offline rate source.
//!
//! Rates are anchored at approximate USD cross levels for the forex symbol
//! list, with a slow seasonal swing plus per-day noise. Every value is a pure
//! function of `(seed, base, target, date)`, so repeated lookups agree and the
//! source can back tests and demos without a network.

use std::collections::hash_map::DefaultHasher;
use std::f64::consts::TAU;
use std::hash::{Hash, Hasher};

use chrono::{Datelike, Local, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::RateSource;
use crate::domain::{RateDate, Symbol};
use crate::error::RateUnavailable;

/// Units of each currency per 1 USD (rough 2024 levels).
const USD_ANCHORS: [(&str, f64); 10] = [
    ("USD", 1.0),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("INR", 83.0),
    ("AUD", 1.52),
    ("CAD", 1.36),
    ("JPY", 150.0),
    ("CHF", 0.88),
    ("CNY", 7.2),
    ("PKR", 278.0),
];

/// Amplitude of the yearly swing in log space.
const SEASONAL_AMPLITUDE: f64 = 0.04;
/// Daily noise in log space.
const DAILY_VOL: f64 = 0.004;
/// How far back `latest` looks for a quoted day.
const LATEST_LOOKBACK_DAYS: u64 = 7;

#[derive(Debug, Clone)]
pub struct SampleRateSource {
    seed: u64,
    today: NaiveDate,
    weekend_gaps: bool,
    gap_probability: f64,
}

impl SampleRateSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            today: Local::now().date_naive(),
            weekend_gaps: true,
            gap_probability: 0.02,
        }
    }

    /// Skip Saturdays and Sundays the way forex fixings do.
    pub fn with_weekend_gaps(mut self, enabled: bool) -> Self {
        self.weekend_gaps = enabled;
        self
    }

    /// Chance that any weekday has no quote.
    pub fn with_gap_probability(mut self, p: f64) -> Self {
        self.gap_probability = p.clamp(0.0, 1.0);
        self
    }

    /// Day answered for `RateDate::Latest`.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    fn quote(&self, base: &str, target: &str, date: NaiveDate) -> Result<f64, RateUnavailable> {
        let base_anchor = anchor(base)?;
        let target_anchor = anchor(target)?;
        if base == target {
            return Ok(1.0);
        }

        if self.weekend_gaps && matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return Err(RateUnavailable::NoQuote { date });
        }

        let mut rng = StdRng::seed_from_u64(day_seed(self.seed, base, target, date));
        if self.gap_probability > 0.0 && rng.gen_bool(self.gap_probability) {
            return Err(RateUnavailable::NoQuote { date });
        }

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| RateUnavailable::InvalidResponse(format!("Noise distribution error: {e}")))?;
        let z: f64 = normal.sample(&mut rng);

        let phase = (pair_seed(self.seed, base, target) % 365) as f64 / 365.0;
        let t = f64::from(date.ordinal0()) / 365.0;
        let swing = SEASONAL_AMPLITUDE * (TAU * (t + phase)).sin();

        Ok(target_anchor / base_anchor * (swing + DAILY_VOL * z).exp())
    }
}

impl RateSource for SampleRateSource {
    fn name(&self) -> &str {
        "sample"
    }

    fn get_rate(&self, base: &Symbol, target: &Symbol, at: RateDate) -> Result<f64, RateUnavailable> {
        let base = base.as_str().to_ascii_uppercase();
        let target = target.as_str().to_ascii_uppercase();

        match at {
            RateDate::On(date) => self.quote(&base, &target, date),
            RateDate::Latest => {
                let mut last_err = RateUnavailable::NoQuote { date: self.today };
                for back in 0..=LATEST_LOOKBACK_DAYS {
                    let Some(date) = self.today.checked_sub_days(chrono::Days::new(back)) else {
                        break;
                    };
                    match self.quote(&base, &target, date) {
                        Ok(rate) => return Ok(rate),
                        Err(RateUnavailable::NoQuote { .. }) => {}
                        Err(e) => return Err(e),
                    }
                    last_err = RateUnavailable::NoQuote { date };
                }
                Err(last_err)
            }
        }
    }
}

fn anchor(symbol: &str) -> Result<f64, RateUnavailable> {
    USD_ANCHORS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, v)| *v)
        .ok_or_else(|| RateUnavailable::UnknownSymbol(symbol.to_string()))
}

fn pair_seed(seed: u64, base: &str, target: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    base.hash(&mut hasher);
    target.hash(&mut hasher);
    hasher.finish()
}

fn day_seed(seed: u64, base: &str, target: &str, date: NaiveDate) -> u64 {
    let mut hasher = DefaultHasher::new();
    pair_seed(seed, base, target).hash(&mut hasher);
    date.hash(&mut hasher);
    hasher.finish()
}
