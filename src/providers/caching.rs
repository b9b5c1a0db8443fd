use crate::core::cache::Cache;
use crate::core::price::{DateRange, PriceHistoryProvider, PriceSeries};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Memoizes successful price histories per symbol and date range.
pub struct CachingHistoryProvider<T: PriceHistoryProvider> {
    inner: T,
    cache: Arc<dyn Cache<String, PriceSeries>>,
    ttl: Option<Duration>,
}

impl<T: PriceHistoryProvider> CachingHistoryProvider<T> {
    pub fn new(inner: T, cache: Arc<dyn Cache<String, PriceSeries>>, ttl: Option<Duration>) -> Self {
        Self { inner, cache, ttl }
    }
}

fn cache_key(symbol: &str, range: DateRange) -> String {
    format!("{symbol}:{}:{}", range.from, range.to)
}

#[async_trait]
impl<T: PriceHistoryProvider> PriceHistoryProvider for CachingHistoryProvider<T> {
    async fn fetch_history(&self, symbol: &str, range: DateRange) -> Result<PriceSeries> {
        let key = cache_key(symbol, range);
        if let Some(cached) = self.cache.get(&key).await {
            debug!("Cache hit for price history: {}", key);
            return Ok(cached);
        }
        debug!("Cache miss for price history: {}", key);
        let series = self.inner.fetch_history(symbol, range).await?;
        self.cache.put(key, series.clone(), self.ttl).await;
        Ok(series)
    }
}
