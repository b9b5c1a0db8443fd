pub mod history;
pub mod returns;
pub mod setup;
pub mod summary;
pub mod ui;

use crate::core::config::TrackerConfig;
use crate::core::engine::Tracker;
use crate::core::price::{DateRange, PriceHistoryProvider, PriceSeries};
use crate::providers::fetch_all;
use anyhow::Result;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::info;

/// A tracker with the price data fetched for its date range.
pub struct LoadedTracker<'a> {
    pub config: &'a TrackerConfig,
    pub tracker: Tracker,
    pub range: DateRange,
    pub prices: HashMap<String, PriceSeries>,
}

impl LoadedTracker<'_> {
    /// Symbols that were requested but came back with nothing usable.
    pub fn missing_symbols(&self) -> Vec<String> {
        self.tracker
            .portfolio_symbols()
            .into_iter()
            .chain(std::iter::once(self.tracker.benchmark.clone()))
            .filter(|s| self.prices.get(s).is_none_or(|series| series.is_empty()))
            .collect()
    }
}

/// Fetches the portfolio symbols and the benchmark of `config`.
pub async fn load_tracker<'a>(
    config: &'a TrackerConfig,
    provider: &(dyn PriceHistoryProvider + Send + Sync),
    today: NaiveDate,
) -> Result<LoadedTracker<'a>> {
    let tracker = config.to_tracker()?;
    let range = config.date_range(today)?;

    let mut symbols = tracker.portfolio_symbols();
    symbols.push(tracker.benchmark.clone());
    info!(
        "Fetching {} symbols for {} ({range})",
        symbols.len(),
        config.name
    );

    let pb = ui::new_progress_bar(symbols.len() as u64, true);
    pb.set_message(format!("Fetching {} prices...", config.name));
    let prices = fetch_all(provider, &symbols, range, &|| pb.inc(1)).await;
    pb.finish_and_clear();

    Ok(LoadedTracker {
        config,
        tracker,
        range,
        prices,
    })
}

/// Loads each tracker in turn and hands it to `render`, separating outputs.
pub async fn for_each_tracker(
    configs: &[&TrackerConfig],
    provider: &(dyn PriceHistoryProvider + Send + Sync),
    today: NaiveDate,
    render: impl Fn(&LoadedTracker<'_>) -> String,
) -> Result<()> {
    let count = configs.len();
    for (i, config) in configs.iter().enumerate() {
        let loaded = load_tracker(config, provider, today).await?;
        println!("{}", render(&loaded));
        if i + 1 < count {
            ui::print_separator();
        }
    }
    Ok(())
}

/// Heading shared by every per-tracker view.
pub fn tracker_heading(loaded: &LoadedTracker<'_>) -> String {
    let mut output = format!(
        "Tracker: {}\n{}\n",
        ui::style_text(&loaded.config.name, ui::StyleType::Title),
        ui::style_text(
            &format!(
                "Tracking returns from {} to {} against {}",
                loaded.range.from, loaded.range.to, loaded.tracker.benchmark
            ),
            ui::StyleType::Subtle
        )
    );
    let missing = loaded.missing_symbols();
    if !missing.is_empty() {
        output.push_str(&ui::style_text(
            &format!("Failed tickers: {}\n", missing.join(", ")),
            ui::StyleType::Error,
        ));
    }
    output
}
