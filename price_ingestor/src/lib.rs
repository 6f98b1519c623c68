//! Upstream side of the stock ticker: the daily price data model, the
//! Alpha Vantage client with its retry machine, and the window sanitizer.

pub mod models;
pub mod providers;
pub mod retry;
pub mod rounding;
pub mod sanitize;
