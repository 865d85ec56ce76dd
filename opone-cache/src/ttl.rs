//! The TTL cache.
//!
//! One explicitly-constructed instance per process, shared via `Arc` and
//! handed to consumers through dependency injection. The cache stores opaque
//! values against string keys and never errors: absence is `None`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::clock::{CacheClock, SystemClock};
use crate::entry::CacheEntry;

/// Diagnostic snapshot of cache state.
///
/// `total`/`valid`/`expired` come from a full non-mutating scan and are
/// consistent with each other only at the moment of the scan. This is an
/// O(n) operation intended for diagnostics, not hot paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently held, expired or not.
    pub total: usize,
    /// Entries that would be served by `get` right now.
    pub valid: usize,
    /// Entries held but past their TTL (awaiting lazy eviction or a sweep).
    pub expired: usize,
    /// Reads served from the cache since construction.
    pub hits: u64,
    /// Reads that found nothing servable since construction.
    pub misses: u64,
}

impl CacheStats {
    /// Estimated hit rate (0.0 to 1.0) over the cache's lifetime.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// Outcome of a single key lookup, resolved while the map guard is held.
enum Lookup<V> {
    Hit(V),
    Stale,
    Absent,
}

/// Best-effort TTL cache keyed by arbitrary strings.
///
/// # Contract
///
/// - `get` returns a value only while its entry is within TTL; an expired
///   entry is removed as a side effect of the read (lazy eviction).
/// - `set` overwrites unconditionally and starts a fresh expiry window.
/// - `clear_matching` removes exactly the keys containing the pattern as a
///   plain substring.
/// - No operation errors or blocks on I/O.
///
/// The only bound on size is the eviction of expired entries (lazily on
/// read, or in bulk via [`cleanup`](Self::cleanup) / the periodic sweep).
/// A workload that keeps writing long-lived keys that are never read can
/// grow the map between sweeps; that is accepted behavior.
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    clock: Arc<dyn CacheClock>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    sweep_started: AtomicBool,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache with the given default TTL, timed by a monotonic
    /// system clock.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock::new()))
    }

    /// Create a cache with an injected clock (tests pass a
    /// [`ManualClock`](crate::ManualClock)).
    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn CacheClock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sweep_started: AtomicBool::new(false),
        }
    }

    /// Default TTL applied by [`set`](Self::set).
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Look up `key`, returning its value only if the entry is within TTL.
    ///
    /// An expired entry is removed before returning `None`, so a subsequent
    /// `set` for the same key starts a completely fresh expiry window.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();

        // Resolve under the shard guard, then drop it before any removal:
        // removing while a reference into the same shard is live would
        // deadlock the map.
        let lookup = match self.entries.get(key) {
            None => Lookup::Absent,
            Some(entry) if entry.is_expired(now) => Lookup::Stale,
            Some(entry) => Lookup::Hit(entry.value.clone()),
        };

        match lookup {
            Lookup::Hit(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Lookup::Stale => {
                self.entries.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Lookup::Absent => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store `value` under `key` with the cache's default TTL, overwriting
    /// any existing entry.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store `value` under `key` with an explicit TTL.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry::new(value, self.clock.now(), ttl);
        self.entries.insert(key.into(), entry);
    }

    /// Remove `key` if present. Removing an absent key is a no-op.
    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Remove every entry whose key contains `pattern` as a plain substring
    /// (not a regex, not anchored). Returns the number of entries removed.
    ///
    /// This is the invalidation primitive: mutations clear by entity tag for
    /// broad invalidation and by record id for targeted invalidation.
    pub fn clear_matching(&self, pattern: &str) -> usize {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            if key.contains(pattern) {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    /// Snapshot diagnostic counters. Scans every entry against the current
    /// tick without mutating anything.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let mut valid = 0;
        let mut expired = 0;
        for entry in self.entries.iter() {
            if entry.is_expired(now) {
                expired += 1;
            } else {
                valid += 1;
            }
        }
        CacheStats {
            total: valid + expired,
            valid,
            expired,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Evict every expired entry, returning how many were removed.
    ///
    /// Bounds memory between reads for a long-lived process; `get` already
    /// evicts lazily, so this never changes what a read observes.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let mut evicted = 0;
        self.entries.retain(|_, entry| {
            if entry.is_expired(now) {
                evicted += 1;
                false
            } else {
                true
            }
        });
        evicted
    }

    /// Spawn a periodic [`cleanup`](Self::cleanup) task for the remaining
    /// lifetime of the process.
    ///
    /// Idempotent: only the first call spawns a sweeper; later calls return
    /// `false` and do nothing. Must be called from within a tokio runtime.
    pub fn start_auto_cleanup(self: Arc<Self>, period: Duration) -> bool {
        if self.sweep_started.swap(true, Ordering::SeqCst) {
            return false;
        }

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so the first
            // real sweep happens one full period after startup.
            interval.tick().await;
            loop {
                interval.tick().await;
                let evicted = self.cleanup();
                if evicted > 0 {
                    tracing::debug!(evicted, "cache sweep evicted expired entries");
                }
            }
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn manual_cache(default_ttl_ms: u64) -> (Arc<ManualClock>, TtlCache<String>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::with_clock(
            Duration::from_millis(default_ttl_ms),
            clock.clone() as Arc<dyn CacheClock>,
        );
        (clock, cache)
    }

    #[test]
    fn test_get_within_ttl_returns_value() {
        let (clock, cache) = manual_cache(1000);
        cache.set("k", "v".to_string());

        clock.advance(Duration::from_millis(999));
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        // The boundary itself is still valid.
        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_get_past_ttl_returns_none_and_evicts() {
        let (clock, cache) = manual_cache(1000);
        cache.set("k", "v".to_string());

        clock.advance(Duration::from_millis(1001));
        assert!(cache.get("k").is_none());

        // The expired read removed the entry eagerly.
        assert_eq!(cache.stats().total, 0);
    }

    #[test]
    fn test_lazy_eviction_resets_expiry_window() {
        let (clock, cache) = manual_cache(1000);
        cache.set("k", "old".to_string());

        clock.advance(Duration::from_millis(2000));
        assert!(cache.get("k").is_none());

        // Re-set after eviction: the fresh window is unaffected by the
        // prior entry's write tick.
        cache.set_with_ttl("k", "new".to_string(), Duration::from_millis(5000));
        clock.advance(Duration::from_millis(4000));
        assert_eq!(cache.get("k").as_deref(), Some("new"));
    }

    #[test]
    fn test_set_overwrites_existing_entry() {
        let (clock, cache) = manual_cache(1000);
        cache.set("k", "first".to_string());
        clock.advance(Duration::from_millis(900));

        // Overwrite restarts the window from the new write tick.
        cache.set("k", "second".to_string());
        clock.advance(Duration::from_millis(900));
        assert_eq!(cache.get("k").as_deref(), Some("second"));
    }

    #[test]
    fn test_clear_matching_removes_exact_substring_subset() {
        let (_clock, cache) = manual_cache(60_000);
        cache.set("a:1", "1".to_string());
        cache.set("a:2", "2".to_string());
        cache.set("b:1", "3".to_string());

        let removed = cache.clear_matching("a:");
        assert_eq!(removed, 2);

        assert!(cache.get("a:1").is_none());
        assert!(cache.get("a:2").is_none());
        assert_eq!(cache.get("b:1").as_deref(), Some("3"));
    }

    #[test]
    fn test_clear_matching_mid_key_substring() {
        let (_clock, cache) = manual_cache(60_000);
        let id = "0193b1c2-aaaa-7bbb-8ccc-1234567890ab";
        cache.set(format!("projects_id={}", id), "p".to_string());
        cache.set(format!("transactions_project_id={}", id), "t".to_string());
        cache.set("projects_status=Active", "list".to_string());

        // Targeted invalidation by record id hits every key space the id
        // appears in, regardless of entity tag.
        let removed = cache.clear_matching(id);
        assert_eq!(removed, 2);
        assert_eq!(cache.get("projects_status=Active").as_deref(), Some("list"));
    }

    #[test]
    fn test_clear_removes_everything() {
        let (_clock, cache) = manual_cache(60_000);
        cache.set("x", "1".to_string());
        cache.set("y", "2".to_string());
        cache.clear();
        assert!(cache.get("x").is_none());
        assert!(cache.get("y").is_none());
        assert_eq!(cache.stats().total, 0);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (_clock, cache) = manual_cache(60_000);
        cache.set("k", "v".to_string());
        cache.delete("k");
        // Deleting an already-absent key neither errors nor disturbs state.
        cache.delete("k");
        cache.delete("never-existed");
        assert_eq!(cache.stats().total, 0);
    }

    #[test]
    fn test_stats_counts_valid_and_expired() {
        let (clock, cache) = manual_cache(1000);
        cache.set("fresh-1", "v".to_string());
        cache.set("fresh-2", "v".to_string());
        cache.set_with_ttl("short", "v".to_string(), Duration::from_millis(100));

        let stats = cache.stats();
        assert_eq!(stats.valid, 3);
        assert_eq!(stats.expired, 0);

        clock.advance(Duration::from_millis(500));
        let stats = cache.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.valid, 2);
        assert_eq!(stats.expired, 1);

        // stats() does not mutate: the expired entry is still held.
        assert_eq!(cache.stats().total, 3);
    }

    #[test]
    fn test_hit_rate_estimate() {
        let (_clock, cache) = manual_cache(60_000);
        cache.set("k", "v".to_string());

        assert!(cache.get("k").is_some());
        assert!(cache.get("k").is_some());
        assert!(cache.get("k").is_some());
        assert!(cache.get("missing").is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_rate_with_no_lookups_is_zero() {
        let (_clock, cache) = manual_cache(60_000);
        assert_eq!(cache.stats().hit_rate(), 0.0);
    }

    #[test]
    fn test_cleanup_evicts_only_expired() {
        let (clock, cache) = manual_cache(60_000);
        cache.set_with_ttl("short-1", "v".to_string(), Duration::from_millis(100));
        cache.set_with_ttl("short-2", "v".to_string(), Duration::from_millis(100));
        cache.set("long", "v".to_string());

        clock.advance(Duration::from_millis(200));
        let evicted = cache.cleanup();
        assert_eq!(evicted, 2);

        let stats = cache.stats();
        assert_eq!(stats.total, 1);
        assert_eq!(cache.get("long").as_deref(), Some("v"));
    }

    #[test]
    fn test_end_to_end_ttl_scenario() {
        // set("k", "v", 1000) at t=0; get at t=500 -> "v"; get at t=1500 ->
        // absent and evicted.
        let (clock, cache) = manual_cache(60_000);
        cache.set_with_ttl("k", "v".to_string(), Duration::from_millis(1000));

        clock.set(Duration::from_millis(500));
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        clock.set(Duration::from_millis(1500));
        assert!(cache.get("k").is_none());
        assert_eq!(cache.stats().total, 0);
    }

    #[test]
    fn test_default_ttl_is_pluggable() {
        let clock = Arc::new(ManualClock::new());
        let queries: TtlCache<String> = TtlCache::with_clock(
            Duration::from_secs(300),
            clock.clone() as Arc<dyn CacheClock>,
        );
        let metrics: TtlCache<String> =
            TtlCache::with_clock(Duration::from_secs(60), clock as Arc<dyn CacheClock>);

        assert_eq!(queries.default_ttl(), Duration::from_secs(300));
        assert_eq!(metrics.default_ttl(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_start_auto_cleanup_is_idempotent() {
        let cache = Arc::new(TtlCache::<String>::new(Duration::from_secs(60)));
        assert!(cache.clone().start_auto_cleanup(Duration::from_secs(60)));
        assert!(!cache.clone().start_auto_cleanup(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_auto_cleanup_sweeps_expired_entries() {
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(TtlCache::<String>::with_clock(
            Duration::from_millis(10),
            clock.clone() as Arc<dyn CacheClock>,
        ));
        cache.set("k", "v".to_string());
        clock.advance(Duration::from_millis(50));

        assert!(cache.clone().start_auto_cleanup(Duration::from_millis(5)));

        // Give the sweeper a few periods to run; no read ever touches "k",
        // so only the sweep can remove it.
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if cache.stats().total == 0 {
                break;
            }
        }
        assert_eq!(cache.stats().total, 0);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::clock::ManualClock;
    use proptest::prelude::*;

    proptest! {
        /// Property: clear_matching removes exactly the keys containing the
        /// pattern and leaves every other key untouched.
        #[test]
        fn prop_clear_matching_is_exact(
            keys in proptest::collection::hash_set("[a-z0-9:_=]{1,16}", 0..24),
            pattern in "[a-z0-9:]{1,4}",
        ) {
            let clock = Arc::new(ManualClock::new());
            let cache: TtlCache<u32> = TtlCache::with_clock(
                Duration::from_secs(60),
                clock as Arc<dyn CacheClock>,
            );
            for key in &keys {
                cache.set(key.clone(), 0);
            }

            let expected: usize = keys.iter().filter(|k| k.contains(&pattern)).count();
            let removed = cache.clear_matching(&pattern);
            prop_assert_eq!(removed, expected);

            for key in &keys {
                if key.contains(&pattern) {
                    prop_assert!(cache.get(key).is_none());
                } else {
                    prop_assert!(cache.get(key).is_some());
                }
            }
        }

        /// Property: for any ttl and elapsed time, get serves the value iff
        /// elapsed <= ttl.
        #[test]
        fn prop_ttl_boundary(ttl_ms in 1u64..10_000, elapsed_ms in 0u64..20_000) {
            let clock = Arc::new(ManualClock::new());
            let cache: TtlCache<u32> = TtlCache::with_clock(
                Duration::from_secs(60),
                clock.clone() as Arc<dyn CacheClock>,
            );
            cache.set_with_ttl("k", 7, Duration::from_millis(ttl_ms));
            clock.advance(Duration::from_millis(elapsed_ms));

            if elapsed_ms <= ttl_ms {
                prop_assert_eq!(cache.get("k"), Some(7));
            } else {
                prop_assert_eq!(cache.get("k"), None);
            }
        }
    }
}
