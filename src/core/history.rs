//! Daily value of an equal-amount portfolio next to the same capital held in
//! the benchmark.
use crate::core::price::PriceSeries;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct ValuePoint {
    pub date: NaiveDate,
    pub portfolio: f64,
    pub benchmark: Option<f64>,
}

/// A position bought at the first close of its series.
struct Holding<'a> {
    series: &'a PriceSeries,
    shares: f64,
    cost: f64,
}

impl Holding<'_> {
    fn open(series: &PriceSeries, investment: f64) -> Option<Holding<'_>> {
        let buy = series.first()?.close;
        if !buy.is_finite() || buy <= 0.0 {
            return None;
        }
        Some(Holding {
            series,
            shares: investment / buy,
            cost: investment,
        })
    }

    /// Value on `date`, or the uninvested cost before the first close.
    fn value_on(&self, date: NaiveDate) -> f64 {
        self.series
            .close_on_or_before(date)
            .filter(|close| close.is_finite())
            .map_or(self.cost, |close| self.shares * close)
    }
}

/// Values `investment` per symbol over every date any portfolio symbol traded.
/// Symbols without a usable series are left out, and the benchmark receives
/// the capital actually deployed.
pub fn value_history(
    prices: &HashMap<String, PriceSeries>,
    symbols: &[String],
    benchmark: &str,
    investment: f64,
) -> Vec<ValuePoint> {
    let holdings: Vec<Holding<'_>> = symbols
        .iter()
        .filter(|s| s.as_str() != benchmark)
        .filter_map(|s| prices.get(s))
        .filter_map(|series| Holding::open(series, investment))
        .collect();

    if holdings.is_empty() {
        debug!("No holdings to value");
        return Vec::new();
    }

    let capital = investment * holdings.len() as f64;
    let benchmark = prices
        .get(benchmark)
        .and_then(|series| Holding::open(series, capital));

    let dates: BTreeSet<NaiveDate> = holdings
        .iter()
        .flat_map(|h| h.series.points().iter().map(|p| p.date))
        .collect();

    dates
        .into_iter()
        .map(|date| ValuePoint {
            date,
            portfolio: holdings.iter().map(|h| h.value_on(date)).sum(),
            benchmark: benchmark.as_ref().map(|b| b.value_on(date)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::price::PricePoint;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series(points: &[(&str, f64)]) -> PriceSeries {
        points
            .iter()
            .map(|(d, close)| PricePoint::new(date(d), *close))
            .collect()
    }

    #[test]
    fn values_portfolio_and_benchmark_over_time() {
        let prices = HashMap::from([
            ("A".to_string(), series(&[("2025-05-07", 10.0), ("2025-05-08", 20.0)])),
            ("B".to_string(), series(&[("2025-05-07", 50.0), ("2025-05-08", 25.0)])),
            ("SPY".to_string(), series(&[("2025-05-07", 400.0), ("2025-05-08", 440.0)])),
        ]);
        let symbols = vec!["A".to_string(), "B".to_string()];

        let history = value_history(&prices, &symbols, "SPY", 50.0);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].portfolio, 100.0);
        assert_eq!(history[0].benchmark, Some(100.0));
        assert_eq!(history[1].portfolio, 125.0);
        assert!((history[1].benchmark.unwrap() - 110.0).abs() < 1e-9);
    }

    #[test]
    fn late_starting_symbol_counts_at_cost_and_gaps_carry_forward() {
        let prices = HashMap::from([
            (
                "A".to_string(),
                series(&[("2025-05-07", 10.0), ("2025-05-09", 15.0)]),
            ),
            (
                "B".to_string(),
                series(&[("2025-05-08", 20.0), ("2025-05-09", 10.0)]),
            ),
        ]);
        let symbols = vec!["A".to_string(), "B".to_string()];

        let history = value_history(&prices, &symbols, "SPY", 100.0);

        let values: Vec<_> = history.iter().map(|p| p.portfolio).collect();
        assert_eq!(values, vec![200.0, 200.0, 200.0]);
        assert!(history.iter().all(|p| p.benchmark.is_none()));
    }

    #[test]
    fn unusable_series_are_skipped() {
        let prices = HashMap::from([
            ("A".to_string(), PriceSeries::default()),
            ("B".to_string(), series(&[("2025-05-07", 0.0)])),
        ]);
        let symbols = vec!["A".to_string(), "B".to_string(), "C".to_string()];

        assert!(value_history(&prices, &symbols, "SPY", 100.0).is_empty());
    }
}
