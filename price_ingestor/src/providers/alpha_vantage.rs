//! Client for the Alpha Vantage `TIME_SERIES_DAILY` endpoint.

pub mod params;
pub mod provider;
pub mod response;

pub use params::OutputSize;
pub use provider::{AlphaVantageClient, AlphaVantageOptions, DEFAULT_BASE_URL};
