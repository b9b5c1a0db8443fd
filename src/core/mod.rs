//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod engine;
pub mod history;
pub mod log;
pub mod price;

// Re-export main types for cleaner imports
pub use cache::Cache;
pub use engine::{
    InvestmentSummary, ReturnError, ReturnReport, ReturnResult, SymbolGroup, Tracker, evaluate,
};
pub use price::{DateRange, PriceHistoryProvider, PricePoint, PriceSeries};
