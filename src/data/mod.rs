//! Rate sources.
//!
//! Every source answers one question: the rate of `base` in `target` at a
//! given day (or the latest available). Failures come back as
//! `RateUnavailable`; deciding what a failure means is left to the caller.
//!
//! - `frankfurter`: ECB forex reference rates over HTTP
//! - `coingecko`: crypto prices over HTTP
//! - `sample`: deterministic offline rates
//! - `cache`: TTL cache in front of any source

use std::time::Duration;

use reqwest::blocking::Client;

use crate::domain::{RateDate, SourceKind, Symbol};
use crate::error::{AppError, EXIT_USAGE, RateUnavailable};

pub mod cache;
pub mod coingecko;
pub mod frankfurter;
pub mod sample;

pub use cache::{CachedRateSource, Clock, SystemClock};
pub use coingecko::CoinGeckoClient;
pub use frankfurter::FrankfurterClient;
pub use sample::SampleRateSource;

pub const DEFAULT_FRANKFURTER_URL: &str = "https://api.frankfurter.app";
pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// A provider of point-in-time or latest rates for a pair.
pub trait RateSource: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    /// Rate of one unit of `base` expressed in `target`.
    fn get_rate(&self, base: &Symbol, target: &Symbol, at: RateDate) -> Result<f64, RateUnavailable>;
}

impl<S: RateSource + ?Sized> RateSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get_rate(&self, base: &Symbol, target: &Symbol, at: RateDate) -> Result<f64, RateUnavailable> {
        (**self).get_rate(base, target, at)
    }
}

/// Environment-driven settings for the rate sources.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub frankfurter_url: String,
    pub coingecko_url: String,
    pub coingecko_api_key: Option<String>,
    pub timeout: Duration,
    pub cache_ttl: Duration,
    /// Treat a quote dated differently from the requested day as missing.
    pub strict_dates: bool,
    pub sample_seed: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            frankfurter_url: DEFAULT_FRANKFURTER_URL.to_string(),
            coingecko_url: DEFAULT_COINGECKO_URL.to_string(),
            coingecko_api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            strict_dates: false,
            sample_seed: 42,
        }
    }
}

impl SourceSettings {
    /// Load settings from the process environment (and a `.env` file, if any).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup; missing keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut settings = Self::default();

        if let Some(url) = lookup("FX_FRANKFURTER_URL") {
            settings.frankfurter_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("FX_COINGECKO_URL") {
            settings.coingecko_url = url.trim_end_matches('/').to_string();
        }
        settings.coingecko_api_key = lookup("COINGECKO_API_KEY").filter(|k| !k.trim().is_empty());

        if let Some(raw) = lookup("FX_HTTP_TIMEOUT_SECS") {
            settings.timeout = Duration::from_secs(parse_env_u64("FX_HTTP_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = lookup("FX_CACHE_TTL_SECS") {
            settings.cache_ttl = Duration::from_secs(parse_env_u64("FX_CACHE_TTL_SECS", &raw)?);
        }
        if let Some(raw) = lookup("FX_STRICT_DATES") {
            settings.strict_dates = parse_env_bool("FX_STRICT_DATES", &raw)?;
        }
        if let Some(raw) = lookup("FX_SAMPLE_SEED") {
            settings.sample_seed = parse_env_u64("FX_SAMPLE_SEED", &raw)?;
        }

        Ok(settings)
    }
}

/// Open the requested source wrapped in a TTL cache.
pub fn open_source(kind: SourceKind, settings: &SourceSettings) -> Result<Box<dyn RateSource>, AppError> {
    let inner: Box<dyn RateSource> = match kind {
        SourceKind::Frankfurter => Box::new(FrankfurterClient::new(settings)?),
        SourceKind::Coingecko => Box::new(CoinGeckoClient::new(settings)?),
        SourceKind::Sample => Box::new(SampleRateSource::new(settings.sample_seed)),
    };
    Ok(Box::new(CachedRateSource::new(inner, settings.cache_ttl)))
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client, AppError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("fx-forecast/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to create HTTP client: {e}")))
}

/// Map a non-success HTTP status to the failure it represents.
pub(crate) fn status_failure(code: u16) -> RateUnavailable {
    match code {
        429 => RateUnavailable::RateLimited,
        _ => RateUnavailable::Status { code },
    }
}

fn parse_env_u64(key: &str, raw: &str) -> Result<u64, AppError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Invalid {key}='{raw}': {e}")))
}

fn parse_env_bool(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(AppError::new(EXIT_USAGE, format!("Invalid {key}='{raw}': expected true/false"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn settings_default_when_env_is_empty() {
        let s = SourceSettings::from_lookup(|_| None).unwrap();
        assert_eq!(s.frankfurter_url, DEFAULT_FRANKFURTER_URL);
        assert_eq!(s.timeout, Duration::from_secs(10));
        assert_eq!(s.cache_ttl, Duration::from_secs(3600));
        assert!(!s.strict_dates);
        assert!(s.coingecko_api_key.is_none());
    }

    #[test]
    fn settings_read_overrides() {
        let s = SourceSettings::from_lookup(lookup_from(&[
            ("FX_FRANKFURTER_URL", "http://localhost:8080/"),
            ("FX_HTTP_TIMEOUT_SECS", "3"),
            ("FX_CACHE_TTL_SECS", "0"),
            ("FX_STRICT_DATES", "yes"),
            ("COINGECKO_API_KEY", "  "),
        ]))
        .unwrap();
        assert_eq!(s.frankfurter_url, "http://localhost:8080");
        assert_eq!(s.timeout, Duration::from_secs(3));
        assert_eq!(s.cache_ttl, Duration::ZERO);
        assert!(s.strict_dates);
        assert!(s.coingecko_api_key.is_none());
    }

    #[test]
    fn settings_reject_garbage_numbers() {
        let err = SourceSettings::from_lookup(lookup_from(&[("FX_CACHE_TTL_SECS", "soon")])).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);
        assert!(err.to_string().contains("FX_CACHE_TTL_SECS"));
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        assert_eq!(status_failure(429), RateUnavailable::RateLimited);
        assert_eq!(status_failure(500), RateUnavailable::Status { code: 500 });
    }
}
