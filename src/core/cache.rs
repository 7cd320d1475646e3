use crate::fetcher::SourceQuery;
use crate::models::TimeSeries;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

struct Entry {
    stored_at: Instant,
    series: TimeSeries,
}

/// Time-boxed in-memory cache of fetched series, keyed by the full source query.
pub struct SeriesCache {
    ttl: Duration,
    entries: Mutex<HashMap<SourceQuery, Entry>>,
}

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a clone of the cached series if it is younger than the TTL.
    /// Expired entries are evicted on lookup.
    pub fn get(&self, query: &SourceQuery) -> Option<TimeSeries> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        match entries.get(query) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                debug!(%query, "cache hit");
                Some(entry.series.clone())
            }
            Some(_) => {
                debug!(%query, "cache entry expired");
                entries.remove(query);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, query: SourceQuery, series: TimeSeries) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            query,
            Entry {
                stored_at: Instant::now(),
                series,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
