use std::time::{Duration, Instant};

use dashmap::DashMap;

use seatlens_core_types::SeatStats;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Strip the query string (and fragment) from a URL, yielding the stable
/// cache key for one seat-layout page.
pub fn canonical_key(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    without_fragment
        .split('?')
        .next()
        .unwrap_or(without_fragment)
        .to_string()
}

/// Memoizes seat stats by canonical URL with a freshness TTL.
///
/// Entries are only evicted by the TTL check at read time; growth is
/// bounded by the number of distinct showtimes visited during the owning
/// process's lifetime.
pub struct StatsCache {
    entries: DashMap<String, (SeatStats, Instant)>,
    ttl: Duration,
}

impl StatsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Store stats under the canonicalized form of `url`.
    pub fn store(&self, url: &str, stats: SeatStats) {
        self.entries
            .insert(canonical_key(url), (stats, Instant::now()));
    }

    /// Fresh stats for `url`, or `None` on miss or stale entry.
    ///
    /// The freshness check happens under the map guard, atomically with
    /// the read.
    pub fn lookup(&self, url: &str) -> Option<SeatStats> {
        self.lookup_at(url, Instant::now())
    }

    fn lookup_at(&self, url: &str, now: Instant) -> Option<SeatStats> {
        let key = canonical_key(url);
        let entry = self.entries.get(&key)?;
        let (stats, captured_at) = *entry;
        if now.duration_since(captured_at) <= self.ttl {
            Some(stats)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    fn store_at(&self, url: &str, stats: SeatStats, captured_at: Instant) {
        self.entries
            .insert(canonical_key(url), (stats, captured_at));
    }
}

impl Default for StatsCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
