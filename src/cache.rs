//! Time-to-live cache for the loaded dataset.

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default lifetime of a cached load.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Whether a lookup was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
        }
    }
}

#[derive(Debug)]
struct CacheEntry<T> {
    data: Arc<T>,
    loaded_at: Instant,
}

/// Single-entry cache with expiry and explicit invalidation.
#[derive(Debug)]
pub struct TtlCache<T> {
    entry: Option<CacheEntry<T>>,
    ttl: Duration,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { entry: None, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Check if cache holds an unexpired entry
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Instant::now())
    }

    pub fn is_fresh_at(&self, now: Instant) -> bool {
        match &self.entry {
            None => false,
            Some(entry) => now.saturating_duration_since(entry.loaded_at) < self.ttl,
        }
    }

    /// Age of the cached entry, if any.
    pub fn age(&self) -> Option<Duration> {
        self.entry.as_ref().map(|e| e.loaded_at.elapsed())
    }

    /// Return the cached value, loading it when missing or expired.
    pub fn get_or_try_load<E, F>(&mut self, load: F) -> Result<(Arc<T>, CacheStatus), E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.get_or_try_load_at(Instant::now(), load)
    }

    /// Same as [`get_or_try_load`](Self::get_or_try_load) with an explicit clock.
    ///
    /// A failed load leaves the cache empty.
    pub fn get_or_try_load_at<E, F>(
        &mut self,
        now: Instant,
        load: F,
    ) -> Result<(Arc<T>, CacheStatus), E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if self.is_fresh_at(now) {
            if let Some(entry) = &self.entry {
                return Ok((Arc::clone(&entry.data), CacheStatus::Hit));
            }
        }

        self.entry = None;
        let data = Arc::new(load()?);
        self.entry = Some(CacheEntry {
            data: Arc::clone(&data),
            loaded_at: now,
        });
        Ok((data, CacheStatus::Miss))
    }

    /// Drop the cached entry so the next lookup reloads.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

impl<T> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
