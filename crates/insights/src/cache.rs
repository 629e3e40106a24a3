//! In-process TTL cache for computed insight payloads.
//!
//! Insights are a pure function of stored state, so a short memo per
//! restaurant is safe. The cache is a decorator around the engine, keyed by
//! restaurant id; staleness is checked on every read and stale entries are
//! evicted right there rather than by a background sweeper.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

use crate::insights::{InsightsError, InsightsService, MarketInsights};

/// How long a computed payload stays fresh.
pub const DEFAULT_INSIGHT_TTL: Duration = Duration::from_secs(300);

struct CachedEntry {
    value: MarketInsights,
    computed_at: Instant,
}

/// Keyed payload store with eviction-on-read.
pub struct InsightCache {
    entries: DashMap<Uuid, CachedEntry>,
    ttl: Duration,
}

impl InsightCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Return the cached payload if it is still fresh. A stale entry is
    /// removed and reported as a miss.
    pub fn get(&self, id: Uuid) -> Option<MarketInsights> {
        if let Some(entry) = self.entries.get(&id) {
            if entry.computed_at.elapsed() < self.ttl {
                debug!(restaurant_id = %id, "Insight cache hit");
                return Some(entry.value.clone());
            }
        } else {
            return None;
        }

        debug!(restaurant_id = %id, "Evicting stale insight entry");
        self.entries.remove(&id);
        None
    }

    pub fn insert(&self, id: Uuid, value: MarketInsights) {
        self.entries.insert(
            id,
            CachedEntry {
                value,
                computed_at: Instant::now(),
            },
        );
    }

    /// Drop one restaurant's cached payload, e.g. after a content edit.
    pub fn invalidate(&self, id: Uuid) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The insights engine behind a per-restaurant memo.
pub struct CachedInsights {
    service: InsightsService,
    cache: InsightCache,
}

impl CachedInsights {
    pub fn new(service: InsightsService, ttl: Duration) -> Self {
        Self {
            service,
            cache: InsightCache::new(ttl),
        }
    }

    pub fn service(&self) -> &InsightsService {
        &self.service
    }

    /// Serve from cache when fresh, otherwise compute and remember.
    pub async fn market_insights(&self, id: Uuid) -> Result<MarketInsights, InsightsError> {
        if let Some(cached) = self.cache.get(id) {
            return Ok(cached);
        }

        let fresh = self.service.market_insights(id).await?;
        self.cache.insert(id, fresh.clone());
        Ok(fresh)
    }

    pub fn invalidate(&self, id: Uuid) -> bool {
        self.cache.invalidate(id)
    }
}
