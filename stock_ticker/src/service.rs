//! Request orchestration: cache first, upstream on a miss.

use std::{num::NonZeroUsize, sync::Arc};

use price_cache::{CacheError, IngestReport, PriceStore};
use price_ingestor::{
    models::window::Window,
    providers::{DataProvider, ProviderError},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] ProviderError),

    #[error("cache write failed: {0}")]
    Cache(#[from] CacheError),
}

/// Serves the N-day window of one symbol.
pub struct PriceService {
    provider: Arc<dyn DataProvider>,
    store: Arc<dyn PriceStore>,
    symbol: String,
    window_days: NonZeroUsize,
}

impl PriceService {
    pub fn new(
        provider: Arc<dyn DataProvider>,
        store: Arc<dyn PriceStore>,
        symbol: impl Into<String>,
        window_days: NonZeroUsize,
    ) -> Self {
        Self {
            provider,
            store,
            symbol: symbol.into(),
            window_days,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the current window.
    ///
    /// A cache read error is logged and treated as a miss. An empty window or
    /// one whose average is zero also counts as a miss. Upstream errors are
    /// returned as is; there is no further fallback.
    pub async fn current_window(&self, cancel: &CancellationToken) -> Result<Window, ServiceError> {
        match self.store.reconstruct_window(self.window_days, cancel).await {
            Ok(window) if !window.is_degenerate() => {
                debug!(symbol = %self.symbol, days = window.observations.len(), "cache hit");
                return Ok(window);
            }
            Ok(_) => debug!(symbol = %self.symbol, "cache miss"),
            Err(e) => warn!(symbol = %self.symbol, error = %e, "cache read failed, falling back to upstream"),
        }

        let window = self.provider.fetch_window(&self.symbol, cancel).await?;
        debug!(symbol = %self.symbol, days = window.observations.len(), "served window from upstream");
        Ok(window)
    }

    /// Loads the full upstream history into the cache.
    pub async fn warm_cache(&self, cancel: &CancellationToken) -> Result<IngestReport, ServiceError> {
        let envelope = self.provider.fetch_full_history(&self.symbol, cancel).await?;
        let report = self.store.ingest(&envelope.time_series).await?;
        info!(
            symbol = %self.symbol,
            written = report.written,
            rejected = report.rejected,
            "cache warmed"
        );
        Ok(report)
    }
}
