//! The cache-aside store: bulk ingestion and window reconstruction.
//!
//! Reconstruction is strict. A stored document that does not decode, or whose
//! close is not a number, fails the whole read with a [`CacheError`]; compare
//! `price_ingestor::sanitize`, which skips such entries when they come from
//! the upstream.

use std::num::{NonZeroUsize, ParseFloatError};

use async_trait::async_trait;
use chrono::{Months, NaiveDate, Utc};
use chrono_tz::Tz;
use price_ingestor::models::{
    price_record::PriceRecord,
    time_series::{DAY_FORMAT, TimeSeries},
    window::{Window, WindowAccumulator},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{ACK_OK, BackendError, DocumentStore, ROOT_PATH};

/// How far back reconstruction probes when no explicit day count is set.
pub const DEFAULT_LOOKBACK_YEARS: u32 = 20;

pub const DEFAULT_MARKET_TZ: Tz = chrono_tz::US::Eastern;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while reading or writing the cache.
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("malformed cache entry for {day}: {source}")]
    MalformedEntry {
        day: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed close {close:?} cached for {day}: {source}")]
    MalformedClose {
        day: String,
        close: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("failed to encode record for {day}: {source}")]
    Encode {
        day: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cache lookup cancelled")]
    Cancelled,
}

/// Outcome of a bulk write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Records acknowledged with `OK`.
    pub written: usize,
    /// Records the backend refused; logged and skipped.
    pub rejected: usize,
}

/// Storage surface the request path depends on.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Writes every record of `series` under its day key.
    async fn ingest(&self, series: &TimeSeries) -> Result<IngestReport, CacheError>;

    /// Rebuilds the `n` most recent cached days, most recent first.
    async fn reconstruct_window(
        &self,
        n: NonZeroUsize,
        cancel: &CancellationToken,
    ) -> Result<Window, CacheError>;
}

/// Per-day JSON documents in a [`DocumentStore`].
pub struct PriceCache<B> {
    backend: B,
    market_tz: Tz,
    lookback_days: Option<u32>,
    today: Option<NaiveDate>,
}

impl<B: DocumentStore> PriceCache<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            market_tz: DEFAULT_MARKET_TZ,
            lookback_days: None,
            today: None,
        }
    }

    /// Time zone "today" is taken in; sessions close on exchange time.
    pub fn with_market_tz(mut self, tz: Tz) -> Self {
        self.market_tz = tz;
        self
    }

    /// Probes exactly `days` calendar days instead of [`DEFAULT_LOOKBACK_YEARS`].
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = Some(days);
        self
    }

    /// Pins "today". The walk starts on the day before `today`.
    pub fn with_anchor_date(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| Utc::now().with_timezone(&self.market_tz).date_naive())
    }

    fn horizon_days(&self, today: NaiveDate) -> u32 {
        if let Some(days) = self.lookback_days {
            return days;
        }
        today
            .checked_sub_months(Months::new(12 * DEFAULT_LOOKBACK_YEARS))
            .map(|start| (today - start).num_days())
            .and_then(|days| u32::try_from(days).ok())
            .unwrap_or(365 * DEFAULT_LOOKBACK_YEARS)
    }

    async fn lookup(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, CacheError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CacheError::Cancelled),
            doc = self.backend.json_get(key) => Ok(doc?),
        }
    }
}

#[async_trait]
impl<B: DocumentStore> PriceStore for PriceCache<B> {
    async fn ingest(&self, series: &TimeSeries) -> Result<IngestReport, CacheError> {
        let mut report = IngestReport::default();

        for (day, record) in series {
            let json = serde_json::to_string(record).map_err(|source| CacheError::Encode {
                day: day.clone(),
                source,
            })?;

            let ack = self.backend.json_set(day, ROOT_PATH, &json).await?;
            if ack == ACK_OK {
                report.written += 1;
            } else {
                warn!(day = %day, ack = %ack, "cache refused record");
                report.rejected += 1;
            }
        }

        info!(
            written = report.written,
            rejected = report.rejected,
            "ingested daily series into cache"
        );
        Ok(report)
    }

    async fn reconstruct_window(
        &self,
        n: NonZeroUsize,
        cancel: &CancellationToken,
    ) -> Result<Window, CacheError> {
        let today = self.today();
        let horizon = self.horizon_days(today);
        let mut window = WindowAccumulator::new(n);
        let mut day = today;

        for _ in 0..horizon {
            if window.is_full() {
                break;
            }
            let Some(previous) = day.pred_opt() else {
                break;
            };
            day = previous;

            let key = day.format(DAY_FORMAT).to_string();
            let Some(doc) = self.lookup(&key, cancel).await? else {
                continue;
            };

            let record: PriceRecord =
                serde_json::from_str(&doc).map_err(|source| CacheError::MalformedEntry {
                    day: key.clone(),
                    source,
                })?;
            let close = record
                .close_value()
                .map_err(|source| CacheError::MalformedClose {
                    day: key.clone(),
                    close: record.close.clone(),
                    source,
                })?;

            window.push(key, record, close);
        }

        debug!(
            requested = n.get(),
            collected = window.len(),
            horizon,
            "reconstructed window from cache"
        );
        Ok(window.finish())
    }
}
