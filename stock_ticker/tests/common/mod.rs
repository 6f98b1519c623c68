#![allow(dead_code)]

use std::{
    future::pending,
    num::NonZeroUsize,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use price_cache::{BackendError, CacheError, IngestReport, PriceStore};
use price_ingestor::{
    models::{
        observation::DailyObservation,
        price_record::PriceRecord,
        time_series::{DailySeriesEnvelope, TimeSeries},
        window::Window,
    },
    providers::{CancelledSnafu, DataProvider, ExhaustedSnafu, ProviderError},
};
use tokio_util::sync::CancellationToken;

pub const MSFT_BODY: &str = r#"{"Daily Price":[{"Day":"2022-04-01","Time Series (Daily)":{"1. open":"309.3700","2. high":"310.1300","3. low":"305.5400","4. close":"309.4200","5. volume":"27110529"}},{"Day":"2022-03-31","Time Series (Daily)":{"1. open":"313.9000","2. high":"315.1400","3. low":"307.8900","4. close":"308.3100","5. volume":"33422070"}},{"Day":"2022-03-30","Time Series (Daily)":{"1. open":"313.7600","2. high":"315.9500","3. low":"311.5800","4. close":"313.8600","5. volume":"28163555"}}],"Average Closing Price":313.21}"#;

pub fn record(open: &str, high: &str, low: &str, close: &str, volume: &str) -> PriceRecord {
    PriceRecord {
        open: open.into(),
        high: high.into(),
        low: low.into(),
        close: close.into(),
        volume: volume.into(),
    }
}

pub fn msft_days() -> Vec<(&'static str, PriceRecord)> {
    vec![
        (
            "2022-04-01",
            record("309.3700", "310.1300", "305.5400", "309.4200", "27110529"),
        ),
        (
            "2022-03-31",
            record("313.9000", "315.1400", "307.8900", "308.3100", "33422070"),
        ),
        (
            "2022-03-30",
            record("313.7600", "315.9500", "311.5800", "313.8600", "28163555"),
        ),
    ]
}

/// The canned window served by the stub store, average included.
pub fn msft_window(average_close: f64) -> Window {
    Window {
        observations: msft_days()
            .into_iter()
            .map(|(day, price)| DailyObservation {
                day: day.to_string(),
                price,
            })
            .collect(),
        average_close,
    }
}

pub fn msft_history() -> DailySeriesEnvelope {
    let time_series: TimeSeries = msft_days()
        .into_iter()
        .map(|(day, price)| (day.to_string(), price))
        .collect();
    DailySeriesEnvelope {
        time_series,
        ..Default::default()
    }
}

/// How a fake answers.
#[derive(Debug, Clone)]
pub enum Answer<T> {
    Ok(T),
    Fail,
    /// Never completes unless the token fires.
    Hang,
}

pub struct FakeProvider {
    pub window: Answer<Window>,
    pub history: Answer<DailySeriesEnvelope>,
    pub window_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new(window: Answer<Window>, history: Answer<DailySeriesEnvelope>) -> Self {
        Self {
            window,
            history,
            window_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
        }
    }

    pub fn window_calls(&self) -> usize {
        self.window_calls.load(Ordering::SeqCst)
    }
}

async fn answer<T: Clone>(answer: &Answer<T>, cancel: &CancellationToken) -> Result<T, ProviderError> {
    match answer {
        Answer::Ok(value) => Ok(value.clone()),
        Answer::Fail => ExhaustedSnafu {
            attempts: 4u32,
            last_failure: "unexpected response status code: 500",
        }
        .fail(),
        Answer::Hang => {
            cancel.cancelled().await;
            CancelledSnafu.fail()
        }
    }
}

#[async_trait]
impl DataProvider for FakeProvider {
    async fn fetch_window(
        &self,
        _symbol: &str,
        cancel: &CancellationToken,
    ) -> Result<Window, ProviderError> {
        self.window_calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.window, cancel).await
    }

    async fn fetch_full_history(
        &self,
        _symbol: &str,
        cancel: &CancellationToken,
    ) -> Result<DailySeriesEnvelope, ProviderError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.history, cancel).await
    }
}

pub struct FakeStore {
    pub window: Answer<Window>,
    pub reads: AtomicUsize,
    pub ingested: AtomicUsize,
}

impl FakeStore {
    pub fn new(window: Answer<Window>) -> Self {
        Self {
            window,
            reads: AtomicUsize::new(0),
            ingested: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceStore for FakeStore {
    async fn ingest(&self, series: &TimeSeries) -> Result<IngestReport, CacheError> {
        self.ingested.fetch_add(series.len(), Ordering::SeqCst);
        Ok(IngestReport {
            written: series.len(),
            rejected: 0,
        })
    }

    async fn reconstruct_window(
        &self,
        _n: NonZeroUsize,
        _cancel: &CancellationToken,
    ) -> Result<Window, CacheError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match &self.window {
            Answer::Ok(window) => Ok(window.clone()),
            Answer::Fail => Err(CacheError::Backend(BackendError::Unavailable(
                "connection refused".into(),
            ))),
            Answer::Hang => pending().await,
        }
    }
}
