//! Return aggregation over fetched price histories.
//!
//! Everything in here is pure: callers hand in a snapshot of price series and
//! get back per-symbol returns, bucket averages and a benchmark return. Nothing
//! is rounded; formatting belongs to the display layer.
use crate::core::price::PriceSeries;
use anyhow::{Result, bail};
use chrono::NaiveDate;
use rust_decimal::{Decimal, prelude::*};
use rust_finprim::rate::cagr;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// Why a symbol or group has no value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReturnError {
    #[error("no price data")]
    MissingData,
    #[error("invalid price: {0}")]
    InvalidPrice(f64),
    #[error("no members of {0} have a return")]
    EmptyGroup(String),
}

/// Return of a fixed investment between the first and last close of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnResult {
    pub buy_date: NaiveDate,
    pub buy_price: f64,
    pub final_date: NaiveDate,
    pub final_price: f64,
    pub return_pct: f64,
    pub final_value: f64,
}

/// A named list of symbols whose returns are averaged together.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolGroup {
    label: String,
    symbols: Vec<String>,
}

impl SymbolGroup {
    pub fn new(label: impl Into<String>, symbols: Vec<String>) -> Result<Self> {
        let label = label.into();
        let mut seen = HashSet::new();
        for symbol in &symbols {
            if !seen.insert(symbol.as_str()) {
                bail!("Duplicate symbol {symbol} in group {label}");
            }
        }
        Ok(Self { label, symbols })
    }

    /// Builds `Top N` groups as prefixes of a ranked list, smallest first.
    /// A group larger than the list holds the whole list but keeps its label.
    pub fn top_n(ranked: &[String], sizes: &[usize]) -> Result<Vec<Self>> {
        let mut sizes: Vec<usize> = sizes.iter().copied().filter(|size| *size > 0).collect();
        sizes.sort_unstable();
        sizes.dedup();
        sizes
            .into_iter()
            .map(|size| {
                let members = ranked[..size.min(ranked.len())].to_vec();
                Self::new(format!("Top {size}"), members)
            })
            .collect()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }
}

/// Unweighted mean return of the group members that have a result.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioAggregate {
    pub label: String,
    pub return_pct: f64,
    pub contributors: usize,
    pub nominal_size: usize,
}

/// One line of the per-symbol results table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnRow {
    pub symbol: String,
    pub return_pct: Option<f64>,
    pub final_value: Option<f64>,
    pub buy_price: Option<f64>,
    pub final_price: Option<f64>,
    /// Calendar days between the buy close and the final close.
    pub days_held: Option<i64>,
    /// Forecast return in percent, when the tracker carries one for the symbol.
    pub predicted_return_pct: Option<f64>,
    pub portfolio_label: Option<String>,
    pub prediction_rank: Option<usize>,
    pub error: Option<ReturnError>,
}

/// A labelled value for the aggregates list. `value` is `None` when nothing
/// could be computed, in which case `error` says why.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedAggregate {
    pub label: String,
    pub value: Option<f64>,
    pub contributors: usize,
    /// Member count of the group; `None` for the benchmark.
    pub nominal_size: Option<usize>,
    pub error: Option<ReturnError>,
}

/// The benchmark return, kept apart from the portfolio symbols.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkResult {
    pub symbol: String,
    pub result: Result<ReturnResult, ReturnError>,
}

/// What to compute: a ranked list, the buckets over it, a benchmark and the
/// notional amount invested in each symbol.
#[derive(Debug, Clone)]
pub struct Tracker {
    pub ranked: Vec<String>,
    pub groups: Vec<SymbolGroup>,
    pub benchmark: String,
    pub investment: f64,
    /// Forecast return in percent per symbol, shown next to the realized one.
    pub predictions: HashMap<String, f64>,
}

impl Tracker {
    /// Ranked symbols followed by any group members missing from the ranking,
    /// without the benchmark.
    pub fn portfolio_symbols(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.ranked
            .iter()
            .chain(self.groups.iter().flat_map(|g| g.symbols().iter()))
            .filter(|s| **s != self.benchmark)
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ReturnReport {
    pub returns: BTreeMap<String, Result<ReturnResult, ReturnError>>,
    pub rows: Vec<ReturnRow>,
    pub aggregates: Vec<NamedAggregate>,
    pub benchmark: BenchmarkResult,
}

impl ReturnReport {
    /// Successful per-symbol results only.
    pub fn successful(&self) -> HashMap<String, ReturnResult> {
        successful_returns(&self.returns)
    }

    /// Aggregates of the symbol groups, without the benchmark entry.
    pub fn group_aggregates(&self) -> impl Iterator<Item = &NamedAggregate> {
        self.aggregates.iter().filter(|a| a.nominal_size.is_some())
    }
}

/// Computes the return of `investment` bought at the first close and held
/// until the last close of `series`.
pub fn compute_return(series: &PriceSeries, investment: f64) -> Result<ReturnResult, ReturnError> {
    let (first, last) = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(ReturnError::MissingData),
    };

    let buy_price = first.close;
    if !buy_price.is_finite() || buy_price <= 0.0 {
        return Err(ReturnError::InvalidPrice(buy_price));
    }
    let final_price = last.close;
    if !final_price.is_finite() || final_price < 0.0 {
        return Err(ReturnError::InvalidPrice(final_price));
    }

    Ok(ReturnResult {
        buy_date: first.date,
        buy_price,
        final_date: last.date,
        final_price,
        return_pct: (final_price - buy_price) / buy_price * 100.0,
        final_value: investment * final_price / buy_price,
    })
}

/// Averages `return_pct` over the members of `group` present in `returns`.
/// Returns `None` when no member has a result.
pub fn aggregate_group(
    group: &SymbolGroup,
    returns: &HashMap<String, ReturnResult>,
) -> Option<PortfolioAggregate> {
    let values: Vec<f64> = group
        .symbols()
        .iter()
        .filter_map(|symbol| returns.get(symbol))
        .map(|r| r.return_pct)
        .collect();

    if values.is_empty() {
        debug!("No returns available for {}", group.label());
        return None;
    }

    Some(PortfolioAggregate {
        label: group.label().to_string(),
        return_pct: values.iter().sum::<f64>() / values.len() as f64,
        contributors: values.len(),
        nominal_size: group.len(),
    })
}

/// Builds table rows labelled with the smallest containing group and the
/// symbol's position in `ranked`, sorted by return descending.
pub fn rank_and_label(
    results: &BTreeMap<String, Result<ReturnResult, ReturnError>>,
    groups: &[SymbolGroup],
    ranked: &[String],
) -> Vec<ReturnRow> {
    let positions: HashMap<&str, usize> = ranked
        .iter()
        .enumerate()
        .rev()
        .map(|(i, s)| (s.as_str(), i + 1))
        .collect();

    let mut seen = HashSet::new();
    let symbols = ranked
        .iter()
        .chain(results.keys())
        .filter(|s| seen.insert(s.as_str()));

    let mut rows: Vec<ReturnRow> = symbols
        .map(|symbol| {
            let result = results
                .get(symbol)
                .cloned()
                .unwrap_or(Err(ReturnError::MissingData));
            let portfolio_label = groups
                .iter()
                .filter(|g| g.contains(symbol))
                .min_by_key(|g| g.len())
                .map(|g| g.label().to_string());
            let (held, error) = match result {
                Ok(r) => (Some(r), None),
                Err(e) => (None, Some(e)),
            };
            ReturnRow {
                symbol: symbol.clone(),
                return_pct: held.as_ref().map(|r| r.return_pct),
                final_value: held.as_ref().map(|r| r.final_value),
                buy_price: held.as_ref().map(|r| r.buy_price),
                final_price: held.as_ref().map(|r| r.final_price),
                days_held: held.as_ref().map(|r| (r.final_date - r.buy_date).num_days()),
                predicted_return_pct: None,
                portfolio_label,
                prediction_rank: positions.get(symbol.as_str()).copied(),
                error,
            }
        })
        .collect();

    rows.sort_by(compare_rows);
    rows
}

fn compare_rows(a: &ReturnRow, b: &ReturnRow) -> Ordering {
    let by_return = match (a.return_pct, b.return_pct) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_return
        .then_with(|| match (a.prediction_rank, b.prediction_rank) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.symbol.cmp(&b.symbol))
}

fn successful_returns(
    results: &BTreeMap<String, Result<ReturnResult, ReturnError>>,
) -> HashMap<String, ReturnResult> {
    results
        .iter()
        .filter_map(|(symbol, r)| r.as_ref().ok().map(|r| (symbol.clone(), r.clone())))
        .collect()
}

/// Runs the whole computation for one tracker. A symbol missing from `prices`
/// is treated as having no data.
pub fn evaluate(prices: &HashMap<String, PriceSeries>, tracker: &Tracker) -> ReturnReport {
    let returns: BTreeMap<String, Result<ReturnResult, ReturnError>> = tracker
        .portfolio_symbols()
        .into_iter()
        .map(|symbol| {
            let result = prices
                .get(&symbol)
                .map_or(Err(ReturnError::MissingData), |series| {
                    compute_return(series, tracker.investment)
                });
            if let Err(e) = &result {
                debug!("No return for {symbol}: {e}");
            }
            (symbol, result)
        })
        .collect();

    let successful = successful_returns(&returns);
    let mut aggregates: Vec<NamedAggregate> = tracker
        .groups
        .iter()
        .map(|group| match aggregate_group(group, &successful) {
            Some(agg) => NamedAggregate {
                label: agg.label,
                value: Some(agg.return_pct),
                contributors: agg.contributors,
                nominal_size: Some(agg.nominal_size),
                error: None,
            },
            None => NamedAggregate {
                label: group.label().to_string(),
                value: None,
                contributors: 0,
                nominal_size: Some(group.len()),
                error: Some(ReturnError::EmptyGroup(group.label().to_string())),
            },
        })
        .collect();

    let benchmark_result = prices
        .get(&tracker.benchmark)
        .map_or(Err(ReturnError::MissingData), |series| {
            compute_return(series, tracker.investment)
        });
    aggregates.push(NamedAggregate {
        label: tracker.benchmark.clone(),
        value: benchmark_result.as_ref().ok().map(|r| r.return_pct),
        contributors: usize::from(benchmark_result.is_ok()),
        nominal_size: None,
        error: benchmark_result.as_ref().err().cloned(),
    });

    let mut rows = rank_and_label(&returns, &tracker.groups, &tracker.ranked);
    for row in &mut rows {
        row.predicted_return_pct = tracker.predictions.get(&row.symbol).copied();
    }

    ReturnReport {
        returns,
        rows,
        aggregates,
        benchmark: BenchmarkResult {
            symbol: tracker.benchmark.clone(),
            result: benchmark_result,
        },
    }
}

/// Totals for an equal-amount investment in every symbol that has a return.
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentSummary {
    pub initial_investment: f64,
    pub final_value: f64,
    pub return_pct: f64,
    pub annualized_pct: Option<f64>,
    pub benchmark_return_pct: Option<f64>,
    pub contributors: usize,
}

impl InvestmentSummary {
    /// Returns `None` when no symbol has a return.
    pub fn from_report(report: &ReturnReport, investment: f64) -> Option<Self> {
        let successful = report.successful();
        if successful.is_empty() || investment <= 0.0 {
            return None;
        }

        let contributors = successful.len();
        let initial_investment = investment * contributors as f64;
        let final_value: f64 = successful.values().map(|r| r.final_value).sum();
        let return_pct = (final_value - initial_investment) / initial_investment * 100.0;

        let start = successful.values().map(|r| r.buy_date).min();
        let end = successful.values().map(|r| r.final_date).max();
        let annualized_pct = match (start, end) {
            (Some(start), Some(end)) => {
                annualized_return(initial_investment, final_value, (end - start).num_days())
            }
            _ => None,
        };

        Some(Self {
            initial_investment,
            final_value,
            return_pct,
            annualized_pct,
            benchmark_return_pct: report.benchmark.result.as_ref().ok().map(|r| r.return_pct),
            contributors,
        })
    }
}

/// Compound annual growth rate in percent over `days` calendar days.
fn annualized_return(begin: f64, end: f64, days: i64) -> Option<f64> {
    if days < 1 || begin <= 0.0 || end <= 0.0 {
        return None;
    }
    // Short spans raise the ratio to a large power in either direction; keep
    // the result between 1e-12 and 1e12 so Decimal can hold it.
    let exponent = (end / begin).ln() * 365.0 / days as f64;
    if !exponent.is_finite() || exponent.abs() > 12.0 * std::f64::consts::LN_10 {
        return None;
    }
    let begin_bal = Decimal::from_f64(begin)?;
    let end_bal = Decimal::from_f64(end)?;
    let n_years = Decimal::from_f64(days as f64 / 365.0)?;
    if n_years.is_zero() {
        return None;
    }
    let rate = cagr(begin_bal, end_bal, n_years);
    let percentage = (rate * Decimal::from(100)).to_f64()?;
    debug!("cagr: {begin_bal}, {end_bal}, {n_years} = {rate}, {percentage}");
    Some(percentage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::price::PricePoint;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series(buy: f64, end: f64) -> PriceSeries {
        PriceSeries::new(vec![
            PricePoint::new(date("2025-05-07"), buy),
            PricePoint::new(date("2025-05-08"), (buy + end) / 2.0),
            PricePoint::new(date("2025-06-06"), end),
        ])
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn returns_of(pairs: &[(&str, f64, f64)]) -> HashMap<String, ReturnResult> {
        pairs
            .iter()
            .map(|(s, buy, end)| (s.to_string(), compute_return(&series(*buy, *end), 100.0).unwrap()))
            .collect()
    }

    #[test]
    fn computes_return_and_final_value() {
        let result = compute_return(&series(100.0, 150.0), 100.0).unwrap();
        assert_eq!(result.return_pct, 50.0);
        assert_eq!(result.final_value, 150.0);
        assert_eq!(result.buy_date, date("2025-05-07"));
        assert_eq!(result.final_date, date("2025-06-06"));
    }

    #[test]
    fn unchanged_price_is_zero_return() {
        let result = compute_return(&series(42.5, 42.5), 100.0).unwrap();
        assert_eq!(result.return_pct, 0.0);
        assert_eq!(result.final_value, 100.0);
    }

    #[test]
    fn single_point_series_is_zero_return() {
        let single = PriceSeries::new(vec![PricePoint::new(date("2025-05-07"), 17.0)]);
        assert_eq!(compute_return(&single, 100.0).unwrap().return_pct, 0.0);
    }

    #[test]
    fn return_is_scale_invariant() {
        let base = series(37.0, 51.0);
        let scaled: PriceSeries = base
            .points()
            .iter()
            .map(|p| PricePoint::new(p.date, p.close * 8.0))
            .collect();

        let a = compute_return(&base, 100.0).unwrap().return_pct;
        let b = compute_return(&scaled, 100.0).unwrap().return_pct;
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn buy_is_earliest_date_regardless_of_input_order() {
        let descending = PriceSeries::new(vec![
            PricePoint::new(date("2025-06-06"), 200.0),
            PricePoint::new(date("2025-05-07"), 100.0),
        ]);
        assert_eq!(compute_return(&descending, 100.0).unwrap().return_pct, 100.0);
    }

    #[test]
    fn empty_series_is_missing_data() {
        assert_eq!(
            compute_return(&PriceSeries::default(), 100.0),
            Err(ReturnError::MissingData)
        );
    }

    #[test]
    fn non_positive_buy_price_is_invalid() {
        assert_eq!(
            compute_return(&series(0.0, 10.0), 100.0),
            Err(ReturnError::InvalidPrice(0.0))
        );
        assert_eq!(
            compute_return(&series(-1.0, 10.0), 100.0),
            Err(ReturnError::InvalidPrice(-1.0))
        );
        assert!(matches!(
            compute_return(&series(f64::NAN, 10.0), 100.0),
            Err(ReturnError::InvalidPrice(_))
        ));
        assert!(matches!(
            compute_return(&series(10.0, f64::INFINITY), 100.0),
            Err(ReturnError::InvalidPrice(_))
        ));
    }

    #[test]
    fn aggregate_averages_only_available_members() {
        let group = SymbolGroup::new("Top 5", symbols(&["A", "B", "C", "D", "E"])).unwrap();
        let returns = returns_of(&[("B", 100.0, 110.0), ("D", 100.0, 130.0)]);

        let agg = aggregate_group(&group, &returns).unwrap();
        assert!((agg.return_pct - 20.0).abs() < 1e-9);
        assert_eq!(agg.contributors, 2);
        assert_eq!(agg.nominal_size, 5);
    }

    #[test]
    fn aggregate_of_unresolvable_group_is_none() {
        let group = SymbolGroup::new("Top 2", symbols(&["X", "Y"])).unwrap();
        let returns = returns_of(&[("A", 100.0, 110.0)]);
        assert!(aggregate_group(&group, &returns).is_none());
    }

    #[test]
    fn group_rejects_duplicates() {
        let err = SymbolGroup::new("Top 3", symbols(&["A", "B", "A"])).unwrap_err();
        assert!(err.to_string().contains("Duplicate symbol A"));
    }

    #[test]
    fn top_n_groups_are_sorted_prefixes() {
        let ranked = symbols(&["A", "B", "C", "D"]);
        let groups = SymbolGroup::top_n(&ranked, &[3, 1, 10, 4, 0]).unwrap();

        let labels: Vec<_> = groups.iter().map(|g| g.label().to_string()).collect();
        assert_eq!(labels, vec!["Top 1", "Top 3", "Top 4", "Top 10"]);
        assert_eq!(groups[1].symbols(), &symbols(&["A", "B", "C"])[..]);
        assert_eq!(groups[3].len(), 4);
    }

    #[test]
    fn nested_symbol_gets_smallest_group_label() {
        let ranked: Vec<String> = (1..=99).map(|i| format!("S{i}")).collect();
        let groups = SymbolGroup::top_n(&ranked, &[10, 30, 99]).unwrap();
        let results: BTreeMap<_, _> = ranked
            .iter()
            .map(|s| (s.clone(), compute_return(&series(10.0, 11.0), 100.0)))
            .collect();

        let rows = rank_and_label(&results, &groups, &ranked);
        let label_of = |sym: &str| {
            rows.iter()
                .find(|r| r.symbol == sym)
                .and_then(|r| r.portfolio_label.clone())
        };
        assert_eq!(label_of("S1").as_deref(), Some("Top 10"));
        assert_eq!(label_of("S10").as_deref(), Some("Top 10"));
        assert_eq!(label_of("S11").as_deref(), Some("Top 30"));
        assert_eq!(label_of("S99").as_deref(), Some("Top 99"));
    }

    #[test]
    fn rows_sorted_by_return_keep_prediction_rank() {
        let ranked = symbols(&["A", "B", "C", "D"]);
        let groups = SymbolGroup::top_n(&ranked, &[2, 4]).unwrap();
        let mut results = BTreeMap::new();
        results.insert("A".to_string(), compute_return(&series(100.0, 90.0), 100.0));
        results.insert("B".to_string(), compute_return(&series(100.0, 120.0), 100.0));
        results.insert("C".to_string(), Err(ReturnError::MissingData));
        results.insert("D".to_string(), compute_return(&series(100.0, 105.0), 100.0));

        let rows = rank_and_label(&results, &groups, &ranked);
        let order: Vec<_> = rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["B", "D", "A", "C"]);

        let ranks: Vec<_> = rows.iter().map(|r| r.prediction_rank).collect();
        assert_eq!(ranks, vec![Some(2), Some(4), Some(1), Some(3)]);
        assert_eq!(rows[3].return_pct, None);
        assert_eq!(rows[3].error, Some(ReturnError::MissingData));
        assert_eq!(rows[3].portfolio_label.as_deref(), Some("Top 4"));
    }

    #[test]
    fn symbol_outside_ranking_has_no_rank_or_label() {
        let ranked = symbols(&["A"]);
        let groups = SymbolGroup::top_n(&ranked, &[1]).unwrap();
        let mut results = BTreeMap::new();
        results.insert("A".to_string(), compute_return(&series(100.0, 101.0), 100.0));
        results.insert("Z".to_string(), compute_return(&series(100.0, 150.0), 100.0));

        let rows = rank_and_label(&results, &groups, &ranked);
        assert_eq!(rows[0].symbol, "Z");
        assert_eq!(rows[0].prediction_rank, None);
        assert_eq!(rows[0].portfolio_label, None);
    }

    fn tracker(ranked: &[&str], sizes: &[usize]) -> Tracker {
        let ranked = symbols(ranked);
        Tracker {
            groups: SymbolGroup::top_n(&ranked, sizes).unwrap(),
            ranked,
            benchmark: "SPY".to_string(),
            investment: 100.0,
            predictions: HashMap::new(),
        }
    }

    #[test]
    fn end_to_end_scenario() {
        let prices = HashMap::from([
            ("A".to_string(), series(100.0, 150.0)),
            ("B".to_string(), series(50.0, 40.0)),
            ("SPY".to_string(), series(400.0, 440.0)),
        ]);
        let tracker = tracker(&["A", "B"], &[10]);
        let report = evaluate(&prices, &tracker);

        let successful = report.successful();
        assert_eq!(successful["A"].return_pct, 50.0);
        assert!((successful["B"].return_pct - -20.0).abs() < 1e-9);
        assert!(!report.returns.contains_key("SPY"));

        assert_eq!(report.aggregates.len(), 2);
        assert_eq!(report.aggregates[0].label, "Top 10");
        assert!((report.aggregates[0].value.unwrap() - 15.0).abs() < 1e-9);
        assert_eq!(report.aggregates[1].label, "SPY");
        assert!((report.aggregates[1].value.unwrap() - 10.0).abs() < 1e-9);
        assert!((report.benchmark.result.as_ref().unwrap().return_pct - 10.0).abs() < 1e-9);

        let order: Vec<_> = report.rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["A", "B"]);
    }

    #[test]
    fn group_aggregates_leave_out_the_benchmark() {
        let prices = HashMap::from([
            ("A".to_string(), series(100.0, 150.0)),
            ("SPY".to_string(), series(400.0, 440.0)),
        ]);
        let report = evaluate(&prices, &tracker(&["A", "B", "C"], &[2, 3]));

        let groups: Vec<_> = report
            .group_aggregates()
            .map(|a| (a.label.as_str(), a.contributors, a.nominal_size))
            .collect();
        assert_eq!(groups, vec![("Top 2", 1, Some(2)), ("Top 3", 1, Some(3))]);
        assert!(report.aggregates.iter().any(|a| a.label == "SPY" && a.nominal_size.is_none()));
    }

    #[test]
    fn rows_carry_prices_holding_period_and_forecast() {
        let prices = HashMap::from([("A".to_string(), series(100.0, 150.0))]);
        let mut tracker = tracker(&["A", "B"], &[1]);
        tracker.predictions = HashMap::from([("A".to_string(), 25.0), ("B".to_string(), 12.0)]);
        let report = evaluate(&prices, &tracker);

        let a = &report.rows[0];
        assert_eq!(a.symbol, "A");
        assert_eq!(a.buy_price, Some(100.0));
        assert_eq!(a.final_price, Some(150.0));
        assert_eq!(a.days_held, Some(30));
        assert_eq!(a.predicted_return_pct, Some(25.0));

        let b = &report.rows[1];
        assert_eq!(b.symbol, "B");
        assert_eq!((b.buy_price, b.final_price, b.days_held), (None, None, None));
        assert_eq!(b.predicted_return_pct, Some(12.0));
    }

    #[test]
    fn missing_symbol_is_excluded_from_aggregate() {
        let prices = HashMap::from([("A".to_string(), series(100.0, 200.0))]);
        let tracker = tracker(&["A", "C"], &[2]);
        let report = evaluate(&prices, &tracker);

        assert_eq!(report.aggregates[0].value, Some(100.0));
        assert_eq!(report.aggregates[0].contributors, 1);
        assert_eq!(report.returns["C"], Err(ReturnError::MissingData));
        assert_eq!(report.benchmark.result, Err(ReturnError::MissingData));
        assert_eq!(report.aggregates[1].value, None);
    }

    #[test]
    fn every_symbol_failing_yields_absent_values() {
        let prices = HashMap::from([
            ("A".to_string(), PriceSeries::default()),
            ("B".to_string(), series(0.0, 5.0)),
        ]);
        let tracker = tracker(&["A", "B"], &[1, 2]);
        let report = evaluate(&prices, &tracker);

        assert!(report.rows.iter().all(|r| r.return_pct.is_none()));
        assert_eq!(
            report.aggregates[0].error,
            Some(ReturnError::EmptyGroup("Top 1".to_string()))
        );
        assert!(report.aggregates.iter().all(|a| a.value.is_none()));
        assert_eq!(report.returns["B"], Err(ReturnError::InvalidPrice(0.0)));
    }

    #[test]
    fn benchmark_is_never_averaged() {
        let prices = HashMap::from([
            ("A".to_string(), series(100.0, 110.0)),
            ("SPY".to_string(), series(100.0, 300.0)),
        ]);
        let tracker = tracker(&["A", "SPY"], &[2]);
        let report = evaluate(&prices, &tracker);

        assert!((report.aggregates[0].value.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(report.aggregates[0].contributors, 1);
        assert!(report.rows.iter().all(|r| r.symbol != "SPY" || r.return_pct.is_none()));
    }

    #[test]
    fn summary_totals_equal_investments() {
        let prices = HashMap::from([
            ("A".to_string(), series(100.0, 150.0)),
            ("B".to_string(), series(50.0, 40.0)),
            ("SPY".to_string(), series(400.0, 440.0)),
        ]);
        let tracker = tracker(&["A", "B"], &[2]);
        let report = evaluate(&prices, &tracker);
        let summary = InvestmentSummary::from_report(&report, 100.0).unwrap();

        assert_eq!(summary.initial_investment, 200.0);
        assert!((summary.final_value - 230.0).abs() < 1e-9);
        assert!((summary.return_pct - 15.0).abs() < 1e-9);
        assert_eq!(summary.contributors, 2);
        assert!((summary.benchmark_return_pct.unwrap() - 10.0).abs() < 1e-9);
        // Held for 30 days, so the annualized figure exceeds the raw return.
        assert!(summary.annualized_pct.unwrap() > summary.return_pct);
    }

    #[test]
    fn summary_is_none_without_returns() {
        let tracker = tracker(&["A"], &[1]);
        let report = evaluate(&HashMap::new(), &tracker);
        assert!(InvestmentSummary::from_report(&report, 100.0).is_none());
    }

    #[test]
    fn annualized_return_over_one_year_matches_simple_return() {
        let pct = annualized_return(100.0, 125.0, 365).unwrap();
        assert!((pct - 25.0).abs() < 0.01);
        assert!(annualized_return(100.0, 125.0, 0).is_none());
    }

    #[test]
    fn annualized_return_skips_total_loss_and_runaway_growth() {
        assert!(annualized_return(100.0, 0.0, 30).is_none());
        assert!(annualized_return(100.0, 300.0, 2).is_none());
    }

    #[test]
    fn annualized_return_skips_steep_short_losses() {
        assert!(annualized_return(100.0, 50.0, 1).is_none());
        assert!(annualized_return(100.0, 58.0, 3).is_none());
        // A mild loss over a month still annualizes.
        let pct = annualized_return(100.0, 95.0, 30).unwrap();
        assert!(pct < -5.0 && pct > -100.0);
    }
}
