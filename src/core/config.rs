use crate::core::engine::{SymbolGroup, Tracker};
use crate::core::price::{DateRange, previous_business_day};
use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

fn default_benchmark() -> String {
    "SPY".to_string()
}

fn default_investment() -> f64 {
    100.0
}

fn default_groups() -> Vec<usize> {
    vec![10, 30]
}

/// A ranked list of picks bought on `purchase_date` and tracked against a benchmark.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TrackerConfig {
    pub name: String,
    pub purchase_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_benchmark")]
    pub benchmark: String,
    #[serde(default = "default_investment")]
    pub investment: f64,
    /// Sizes of the `Top N` buckets. A bucket holding the whole list is always added.
    #[serde(default = "default_groups")]
    pub groups: Vec<usize>,
    pub tickers: Vec<String>,
    /// Forecast return in percent per ticker, e.g. `NVDA: 45.0`.
    #[serde(default)]
    pub predictions: HashMap<String, f64>,
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tickers.is_empty() {
            bail!("Tracker {} has no tickers", self.name);
        }
        let mut seen = HashSet::new();
        for ticker in &self.tickers {
            if !seen.insert(ticker.as_str()) {
                bail!("Tracker {} lists {} more than once", self.name, ticker);
            }
        }
        if seen.contains(self.benchmark.as_str()) {
            bail!(
                "Tracker {} uses benchmark {} as a pick",
                self.name,
                self.benchmark
            );
        }
        if !self.investment.is_finite() || self.investment <= 0.0 {
            bail!(
                "Tracker {} has a non-positive investment: {}",
                self.name,
                self.investment
            );
        }
        if self.groups.contains(&0) {
            bail!("Tracker {} has an empty group size", self.name);
        }
        for (ticker, predicted) in &self.predictions {
            if !seen.contains(ticker.as_str()) {
                bail!(
                    "Tracker {} has a prediction for {} which is not one of its tickers",
                    self.name,
                    ticker
                );
            }
            if !predicted.is_finite() {
                bail!(
                    "Tracker {} has an invalid prediction for {}: {}",
                    self.name,
                    ticker,
                    predicted
                );
            }
        }
        if let Some(end) = self.end_date {
            if end < self.purchase_date {
                bail!(
                    "Tracker {} ends on {} before its purchase date {}",
                    self.name,
                    end,
                    self.purchase_date
                );
            }
        }
        Ok(())
    }

    /// Inclusive range from the purchase date to the configured end date, or
    /// to the last business day before `today`.
    pub fn date_range(&self, today: NaiveDate) -> Result<DateRange> {
        let to = self
            .end_date
            .unwrap_or_else(|| previous_business_day(today))
            .max(self.purchase_date);
        DateRange::new(self.purchase_date, to)
            .with_context(|| format!("Invalid date range for tracker {}", self.name))
    }

    pub fn to_tracker(&self) -> Result<Tracker> {
        let mut sizes = self.groups.clone();
        sizes.push(self.tickers.len());
        let groups = SymbolGroup::top_n(&self.tickers, &sizes)
            .with_context(|| format!("Failed to build groups for tracker {}", self.name))?;
        Ok(Tracker {
            ranked: self.tickers.clone(),
            groups,
            benchmark: self.benchmark.clone(),
            investment: self.investment,
            predictions: self.predictions.clone(),
        })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    #[default]
    Yahoo,
    Fmp,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FmpProviderConfig {
    pub base_url: String,
    /// Falls back to the `FMP_API_KEY` environment variable.
    pub api_key: Option<String>,
}

impl FmpProviderConfig {
    pub fn resolve_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var("FMP_API_KEY").ok().filter(|key| !key.is_empty()))
            .ok_or_else(|| anyhow!("No FMP API key: set providers.fmp.api_key or FMP_API_KEY"))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
    pub fmp: Option<FmpProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
            fmp: Some(FmpProviderConfig {
                base_url: "https://financialmodelingprep.com".to_string(),
                api_key: None,
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub trackers: Vec<TrackerConfig>,
    #[serde(default)]
    pub source: PriceSource,
    pub cache_ttl_secs: Option<u64>,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "retrack", "retrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config = Self::from_yaml(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trackers.is_empty() {
            bail!("No trackers configured");
        }
        let mut names = HashSet::new();
        for tracker in &self.trackers {
            if !names.insert(tracker.name.to_lowercase()) {
                bail!("Tracker {} is defined more than once", tracker.name);
            }
            tracker.validate()?;
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS))
    }

    /// All trackers, or only the one called `name` (case-insensitive).
    pub fn select_trackers(&self, name: Option<&str>) -> Result<Vec<&TrackerConfig>> {
        match name {
            None => Ok(self.trackers.iter().collect()),
            Some(name) => self
                .trackers
                .iter()
                .find(|t| t.name.eq_ignore_ascii_case(name))
                .map(|t| vec![t])
                .ok_or_else(|| anyhow!("No tracker named {name}")),
        }
    }
}
