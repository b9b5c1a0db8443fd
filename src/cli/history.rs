use super::{LoadedTracker, tracker_heading, ui};
use crate::core::history::{ValuePoint, value_history};
use comfy_table::Cell;

/// Daily portfolio value next to the benchmark, optionally only the last `last` days.
pub fn render(loaded: &LoadedTracker<'_>, last: Option<usize>) -> String {
    let history = value_history(
        &loaded.prices,
        &loaded.tracker.portfolio_symbols(),
        &loaded.tracker.benchmark,
        loaded.tracker.investment,
    );
    format!(
        "{}\n{}",
        tracker_heading(loaded),
        display_history(&history, &loaded.tracker.benchmark, last)
    )
}

pub fn display_history(history: &[ValuePoint], benchmark: &str, last: Option<usize>) -> String {
    if history.is_empty() {
        return ui::style_text("Not enough data to display the value history.", ui::StyleType::Error);
    }

    let skip = last.map_or(0, |n| history.len().saturating_sub(n));
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Portfolio"),
        ui::header_cell(benchmark),
        ui::header_cell("Difference"),
    ]);
    for point in &history[skip..] {
        table.add_row(vec![
            Cell::new(point.date),
            ui::format_optional_cell(Some(point.portfolio), ui::format_money),
            ui::format_optional_cell(point.benchmark, ui::format_money),
            ui::format_optional_cell(point.benchmark.map(|b| point.portfolio - b), ui::format_money),
        ]);
    }
    table.to_string()
}
