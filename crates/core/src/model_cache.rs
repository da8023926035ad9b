//! Time-boxed cache for the headphone model-name list.
//!
//! The classifier consults the `headphone_models` setting for every line
//! item of a sync. [`ModelNameCache`] holds the last list read and reports it
//! stale after its TTL. It is a plain value: the owner decides how to share
//! it (the API keeps one behind a `tokio::sync::RwLock` in app state) and
//! passes `now` explicitly so expiry is testable.

use std::time::{Duration, Instant};

/// How long a fetched model list stays fresh.
pub const DEFAULT_MODEL_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct Entry {
    models: Vec<String>,
    fetched_at: Instant,
}

/// Cached model-name list with a fixed time-to-live.
#[derive(Debug, Clone)]
pub struct ModelNameCache {
    ttl: Duration,
    entry: Option<Entry>,
}

impl ModelNameCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// Return the cached list if it was stored less than `ttl` before `now`.
    pub fn get(&self, now: Instant) -> Option<&[String]> {
        self.entry
            .as_ref()
            .filter(|e| now.saturating_duration_since(e.fetched_at) < self.ttl)
            .map(|e| e.models.as_slice())
    }

    /// Replace the cached list.
    pub fn store(&mut self, models: Vec<String>, now: Instant) {
        self.entry = Some(Entry {
            models,
            fetched_at: now,
        });
    }

    /// Drop the cached list so the next read goes to the settings table.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for ModelNameCache {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cache_misses() {
        let cache = ModelNameCache::default();
        assert!(cache.get(Instant::now()).is_none());
    }

    #[test]
    fn fresh_entry_hits() {
        let mut cache = ModelNameCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.store(vec!["Auteur".into()], t0);

        let hit = cache.get(t0 + Duration::from_secs(59)).unwrap();
        assert_eq!(hit, ["Auteur".to_string()]);
    }

    #[test]
    fn entry_expires_after_ttl() {
        let mut cache = ModelNameCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.store(vec!["Auteur".into()], t0);

        assert!(cache.get(t0 + Duration::from_secs(60)).is_none());
    }

    #[test]
    fn invalidate_clears_entry() {
        let mut cache = ModelNameCache::default();
        let t0 = Instant::now();
        cache.store(vec!["Verite".into()], t0);
        cache.invalidate();
        assert!(cache.get(t0).is_none());
    }
}
