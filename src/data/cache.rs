//! Time-boxed memoization in front of a rate source.
//!
//! Successful lookups are kept for `ttl`; failures always go back to the
//! inner source on the next call. Time comes from a `Clock` so expiry can be
//! driven explicitly in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::data::RateSource;
use crate::domain::{RateDate, Symbol};
use crate::error::RateUnavailable;

/// Source of "now" for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

type CacheKey = (Symbol, Symbol, RateDate);

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    rate: f64,
    stored_at: Instant,
}

pub struct CachedRateSource<S, C = SystemClock> {
    inner: S,
    ttl: Duration,
    clock: C,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: RateSource> CachedRateSource<S, SystemClock> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self::with_clock(inner, ttl, SystemClock)
    }
}

impl<S: RateSource, C: Clock> CachedRateSource<S, C> {
    pub fn with_clock(inner: S, ttl: Duration, clock: C) -> Self {
        Self {
            inner,
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of entries currently stored (expired ones included until purged).
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry older than the TTL. Also runs on every stored miss.
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, e| self.is_fresh(e, now));
    }

    fn store(&self, key: CacheKey, rate: f64) {
        if self.ttl.is_zero() {
            return;
        }
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, e| self.is_fresh(e, now));
        entries.insert(key, CacheEntry { rate, stored_at: now });
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) < self.ttl
    }

    fn lookup(&self, key: &CacheKey) -> Option<f64> {
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|e| self.is_fresh(e, now))
            .map(|e| e.rate)
    }
}

impl<S, C> Drop for CachedRateSource<S, C> {
    fn drop(&mut self) {
        let (hits, misses) = (*self.hits.get_mut(), *self.misses.get_mut());
        if hits + misses > 0 {
            log::info!("rate cache: {hits} hits, {misses} misses");
        }
    }
}

impl<S: RateSource, C: Clock> RateSource for CachedRateSource<S, C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn get_rate(&self, base: &Symbol, target: &Symbol, at: RateDate) -> Result<f64, RateUnavailable> {
        let key = (base.clone(), target.clone(), at);
        if let Some(rate) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(rate);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        // The lock is not held while the inner source does I/O.
        let rate = self.inner.get_rate(base, target, at)?;
        self.store(key, rate);
        Ok(rate)
    }
}
