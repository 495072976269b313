use dashmap::DashMap;
use std::time::{Duration, Instant};

use super::types::{Candle, PriceQuote};

/// The two shapes the fetcher caches. Quotes and candle sequences never share
/// a key prefix.
#[derive(Clone, Debug)]
pub enum CachedValue {
    Quote(PriceQuote),
    Candles(Vec<Candle>),
}

#[derive(Clone, Debug)]
struct CacheEntry {
    value: CachedValue,
    stored_at: Instant,
}

/// TTL cache for fetch results. Expired entries are treated as misses on
/// read and overwritten on the next put; nothing is purged proactively and
/// there is no capacity bound.
#[derive(Debug)]
pub struct ResultCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<CachedValue> {
        let entry = self.entries.get(key)?;
        if entry.stored_at.elapsed() < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub fn put(&self, key: String, value: CachedValue) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Keys are deterministic per operation + normalized arguments, so
    /// identical requests collide and distinct ones never do.
    pub fn price_key(symbol: &str) -> String {
        format!("price:{}", symbol)
    }

    pub fn history_key(symbol: &str, timeframe: &str, limit: u32) -> String {
        format!("history:{}:{}:{}", symbol, timeframe, limit)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
