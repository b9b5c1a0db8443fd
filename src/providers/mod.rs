pub mod caching;
pub mod fmp;
pub mod yahoo_finance;

use crate::core::config::{AppConfig, PriceSource};
use crate::core::price::{DateRange, PriceHistoryProvider, PriceSeries};
use crate::store::MemoryCache;
use anyhow::{Context, Result};
use caching::CachingHistoryProvider;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds the configured price source wrapped in a memoizing cache.
pub fn build_provider(config: &AppConfig) -> Result<Box<dyn PriceHistoryProvider + Send + Sync>> {
    let cache = Arc::new(MemoryCache::<String, PriceSeries>::new());
    let ttl = Some(config.cache_ttl());
    let defaults = crate::core::config::ProvidersConfig::default();

    let provider: Box<dyn PriceHistoryProvider + Send + Sync> = match config.source {
        PriceSource::Yahoo => {
            let yahoo = config
                .providers
                .yahoo
                .as_ref()
                .or(defaults.yahoo.as_ref())
                .context("Yahoo provider is not configured")?;
            debug!("Using Yahoo Finance at {}", yahoo.base_url);
            Box::new(CachingHistoryProvider::new(
                yahoo_finance::YahooHistoryProvider::new(&yahoo.base_url),
                cache,
                ttl,
            ))
        }
        PriceSource::Fmp => {
            let fmp = config
                .providers
                .fmp
                .as_ref()
                .or(defaults.fmp.as_ref())
                .context("FMP provider is not configured")?;
            debug!("Using Financial Modeling Prep at {}", fmp.base_url);
            Box::new(CachingHistoryProvider::new(
                fmp::FmpProvider::new(&fmp.base_url, &fmp.resolve_api_key()?),
                cache,
                ttl,
            ))
        }
    };
    Ok(provider)
}

/// Fetches every symbol concurrently. A symbol whose fetch fails is logged and
/// left out of the map; the engine reports it as missing.
pub async fn fetch_all(
    provider: &(dyn PriceHistoryProvider + Send + Sync),
    symbols: &[String],
    range: DateRange,
    on_progress: &(dyn Fn() + Send + Sync),
) -> HashMap<String, PriceSeries> {
    let futures = symbols.iter().map(|symbol| async move {
        let result = provider.fetch_history(symbol, range).await;
        on_progress();
        (symbol, result)
    });

    join_all(futures)
        .await
        .into_iter()
        .filter_map(|(symbol, result)| match result {
            Ok(series) => {
                if series.is_empty() {
                    warn!("{symbol} returned no data for {range}");
                }
                Some((symbol.clone(), series))
            }
            Err(e) => {
                warn!("{symbol} failed: {e:#}");
                None
            }
        })
        .collect()
}
