use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for snapshot history activity.
#[derive(Debug, Default)]
pub struct HistoryStats {
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    rejected: AtomicU64,
    evictions: AtomicU64,
}

impl HistoryStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store(&self) {
        self.stores.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        StatsSnapshot {
            hits,
            misses,
            stores: self.stores.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}

/// Point-in-time view of [`HistoryStats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub rejected: u64,
    pub evictions: u64,
    pub hit_rate: f64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits: {}, misses: {}, stores: {}, rejected: {}, evictions: {}, hit rate: {:.1}%",
            self.hits,
            self.misses,
            self.stores,
            self.rejected,
            self.evictions,
            self.hit_rate * 100.0
        )
    }
}
