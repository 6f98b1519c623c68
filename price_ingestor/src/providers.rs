//! Provider abstraction for daily price sources.
//!
//! This module defines the [`DataProvider`] trait, the interface the service
//! uses to fetch daily series from an upstream vendor. The only implementation
//! today is [`alpha_vantage::AlphaVantageClient`]; tests substitute fakes.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use price_ingestor::models::{time_series::DailySeriesEnvelope, window::Window};
//! use price_ingestor::providers::{DataProvider, ProviderError};
//! use tokio_util::sync::CancellationToken;
//!
//! struct EmptyProvider;
//!
//! #[async_trait]
//! impl DataProvider for EmptyProvider {
//!     async fn fetch_window(
//!         &self,
//!         _symbol: &str,
//!         _cancel: &CancellationToken,
//!     ) -> Result<Window, ProviderError> {
//!         Ok(Window::default())
//!     }
//!
//!     async fn fetch_full_history(
//!         &self,
//!         _symbol: &str,
//!         _cancel: &CancellationToken,
//!     ) -> Result<DailySeriesEnvelope, ProviderError> {
//!         Ok(DailySeriesEnvelope::default())
//!     }
//! }
//! ```

pub mod alpha_vantage;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};
use tokio_util::sync::CancellationToken;

use crate::models::{time_series::DailySeriesEnvelope, window::Window};

/// Fetches daily series for a symbol from a market data vendor.
///
/// Implementations are shared across request handlers, so they must be
/// `Send + Sync`. Every call observes `cancel`: once it fires, in-flight
/// requests and retry sleeps are abandoned with [`ProviderError::Cancelled`].
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetches the compact series and reduces it to the most recent N-day window.
    async fn fetch_window(
        &self,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> Result<Window, ProviderError>;

    /// Fetches the full daily history, unfiltered, for cache warming.
    async fn fetch_full_history(
        &self,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> Result<DailySeriesEnvelope, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// The configured endpoint is not an absolute URL.
    #[snafu(display("Invalid base URL {url:?}: {message}"))]
    InvalidBaseUrl {
        url: String,
        message: String,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// Every attempt failed; carries the reason of the last one.
    #[snafu(display("upstream unavailable after {attempts} attempts: {last_failure}"))]
    Exhausted {
        attempts: u32,
        last_failure: String,
        backtrace: Backtrace,
    },

    /// The caller's cancellation token fired.
    #[snafu(display("upstream request cancelled"))]
    Cancelled { backtrace: Backtrace },

    /// The response body was not a JSON document.
    #[snafu(display("Failed to decode upstream payload: {source}"))]
    Decode {
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// The provider's API returned a notice instead of a series (e.g. invalid symbol or key).
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },
}

impl ProviderError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProviderError::Cancelled { .. })
    }
}
