use super::{load_tracker, ui};
use crate::core::config::TrackerConfig;
use crate::core::engine::{InvestmentSummary, evaluate};
use crate::core::price::{DateRange, PriceHistoryProvider};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::{Attribute, Cell};

/// One summary line per tracker.
pub struct TrackerSummary {
    pub name: String,
    pub range: DateRange,
    pub benchmark: String,
    pub summary: Option<InvestmentSummary>,
}

pub async fn run(
    configs: &[&TrackerConfig],
    provider: &(dyn PriceHistoryProvider + Send + Sync),
    today: NaiveDate,
) -> Result<()> {
    let mut summaries = Vec::with_capacity(configs.len());
    for config in configs {
        let loaded = load_tracker(config, provider, today).await?;
        let report = evaluate(&loaded.prices, &loaded.tracker);
        summaries.push(TrackerSummary {
            name: config.name.clone(),
            range: loaded.range,
            benchmark: loaded.tracker.benchmark.clone(),
            summary: InvestmentSummary::from_report(&report, loaded.tracker.investment),
        });
    }
    println!("{}", display_summaries(&summaries));
    Ok(())
}

pub fn display_summaries(summaries: &[TrackerSummary]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Tracker"),
        ui::header_cell("Period"),
        ui::header_cell("Initial Investment"),
        ui::header_cell("Final Value"),
        ui::header_cell("Return"),
        ui::header_cell("Annualized"),
        ui::header_cell("Benchmark"),
        ui::header_cell("vs Benchmark"),
    ]);

    for entry in summaries {
        let s = entry.summary.as_ref();
        let benchmark_return = s.and_then(|s| s.benchmark_return_pct);
        let excess = s.and_then(|s| benchmark_return.map(|b| s.return_pct - b));
        table.add_row(vec![
            Cell::new(&entry.name).add_attribute(Attribute::Bold),
            Cell::new(format!("{} ({} days)", entry.range, entry.range.num_days())),
            ui::format_optional_cell(s.map(|s| s.initial_investment), ui::format_money),
            ui::format_optional_cell(s.map(|s| s.final_value), ui::format_money),
            ui::optional_change_cell(s.map(|s| s.return_pct), s.is_none()),
            ui::optional_change_cell(s.and_then(|s| s.annualized_pct), false),
            Cell::new(format!(
                "{} {}",
                entry.benchmark,
                benchmark_return.map_or("N/A".to_string(), ui::format_percentage)
            )),
            ui::optional_change_cell(excess, false),
        ]);
    }

    table.to_string()
}
