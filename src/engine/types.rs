//! Engine types
//!
//! Configuration and statistics for the pagination engine.

use crate::pagination::Source;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Configuration for a pagination engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Remaining-item count below which the next page is requested.
    /// `None` uses half the active source's page size.
    pub prefetch_distance: Option<usize>,
    /// Buffer size of the transition broadcast channel
    pub history_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefetch_distance: None,
            history_capacity: 64,
        }
    }
}

impl EngineConfig {
    /// Create a new engine config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fixed look-ahead distance
    #[must_use]
    pub fn with_prefetch_distance(mut self, distance: usize) -> Self {
        self.prefetch_distance = Some(distance);
        self
    }

    /// Set the transition buffer size
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Look-ahead threshold for `source`.
    ///
    /// The remaining count includes the item being rendered, so the threshold
    /// is never below two; reaching the last item always triggers a load.
    pub fn prefetch_threshold(&self, source: &Source) -> usize {
        self.prefetch_distance
            .unwrap_or(source.page_size as usize / 2)
            .max(2)
    }
}

/// Counters kept by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Fetches handed to the request factory
    pub requests_issued: usize,
    /// Non-empty pages folded into content
    pub pages_loaded: usize,
    /// Fetches folded as errors
    pub failures: usize,
    /// Completed fetches dropped because a newer one superseded them
    pub stale_results: usize,
    /// Source checkouts performed
    pub checkouts: usize,
}

/// Lock-free counters behind [`EngineStats`]
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub requests_issued: AtomicUsize,
    pub pages_loaded: AtomicUsize,
    pub failures: AtomicUsize,
    pub stale_results: AtomicUsize,
    pub checkouts: AtomicUsize,
}

impl StatsCounters {
    pub fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EngineStats {
        EngineStats {
            requests_issued: self.requests_issued.load(Ordering::Relaxed),
            pages_loaded: self.pages_loaded.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            stale_results: self.stale_results.load(Ordering::Relaxed),
            checkouts: self.checkouts.load(Ordering::Relaxed),
        }
    }
}
