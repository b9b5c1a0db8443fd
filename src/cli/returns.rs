use super::{LoadedTracker, tracker_heading, ui};
use crate::core::engine::{ReturnReport, evaluate};
use comfy_table::{Attribute, Cell, CellAlignment, Color};

/// Returns table and bucket averages for one tracker.
pub fn render(loaded: &LoadedTracker<'_>) -> String {
    let report = evaluate(&loaded.prices, &loaded.tracker);
    format!(
        "{}\n{}",
        tracker_heading(loaded),
        display_report(&report, loaded.tracker.investment)
    )
}

pub fn display_report(report: &ReturnReport, investment: f64) -> String {
    let mut output = String::new();

    let mut aggregates = ui::new_styled_table();
    aggregates.set_header(vec![
        ui::header_cell("Portfolio"),
        ui::header_cell("Return"),
        ui::header_cell("Symbols"),
    ]);
    for aggregate in report.group_aggregates() {
        let counted = match aggregate.nominal_size {
            Some(size) => format!("{}/{}", aggregate.contributors, size),
            None => aggregate.contributors.to_string(),
        };
        aggregates.add_row(vec![
            Cell::new(format!("Portfolio: {} Avg.", aggregate.label)).add_attribute(Attribute::Bold),
            ui::optional_change_cell(aggregate.value, aggregate.error.is_some()),
            Cell::new(counted).set_alignment(CellAlignment::Right),
        ]);
    }
    let benchmark = &report.benchmark;
    aggregates.add_row(vec![
        Cell::new(format!("Benchmark: {}", benchmark.symbol)).add_attribute(Attribute::Bold),
        ui::optional_change_cell(
            benchmark.result.as_ref().ok().map(|r| r.return_pct),
            benchmark.result.is_err(),
        ),
        Cell::new(benchmark.result.as_ref().err().map_or(String::new(), |e| e.to_string()))
            .fg(Color::Red),
    ]);
    output.push_str(&aggregates.to_string());
    output.push('\n');

    let with_forecasts = report.rows.iter().any(|r| r.predicted_return_pct.is_some());
    let mut header = vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Portfolio"),
        ui::header_cell("Prediction Rank"),
    ];
    if with_forecasts {
        header.push(ui::header_cell("Predicted"));
    }
    header.extend([
        ui::header_cell("Buy Price"),
        ui::header_cell("Final Price"),
        ui::header_cell("Days Held"),
        ui::header_cell("Return"),
        ui::header_cell(&format!("Value of {}", ui::format_money(investment))),
        ui::header_cell("Note"),
    ]);

    let mut table = ui::new_styled_table();
    table.set_header(header);
    for row in &report.rows {
        let mut cells = vec![
            Cell::new(&row.symbol),
            Cell::new(row.portfolio_label.as_deref().unwrap_or("-")),
            ui::format_optional_cell(row.prediction_rank, |r| r.to_string()),
        ];
        if with_forecasts {
            cells.push(ui::format_optional_cell(
                row.predicted_return_pct,
                ui::format_percentage,
            ));
        }
        cells.extend([
            ui::format_optional_cell(row.buy_price, ui::format_money),
            ui::format_optional_cell(row.final_price, ui::format_money),
            ui::format_optional_cell(row.days_held, |d| d.to_string()),
            ui::optional_change_cell(row.return_pct, row.error.is_some()),
            ui::format_optional_cell(row.final_value, ui::format_money),
            Cell::new(row.error.as_ref().map(|e| e.to_string()).unwrap_or_default())
                .fg(Color::Red),
        ]);
        table.add_row(cells);
    }
    output.push_str(&table.to_string());
    output
}
