mod common;

use std::sync::{Arc, atomic::Ordering};

use chrono::NaiveDate;
use nonzero_ext::nonzero;
use price_cache::{MemoryBackend, PriceCache};
use price_ingestor::models::window::Window;
use stock_ticker::service::{PriceService, ServiceError};
use tokio_util::sync::CancellationToken;

use common::{Answer, FakeProvider, FakeStore, msft_history, msft_window};

fn service(provider: &Arc<FakeProvider>, store: &Arc<FakeStore>) -> PriceService {
    PriceService::new(provider.clone(), store.clone(), "MSFT", nonzero!(3usize))
}

#[tokio::test]
async fn cache_hit_skips_upstream() {
    let provider = Arc::new(FakeProvider::new(Answer::Fail, Answer::Fail));
    let store = Arc::new(FakeStore::new(Answer::Ok(msft_window(313.21))));

    let window = service(&provider, &store)
        .current_window(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(window.average_close, 313.21);
    assert_eq!(store.reads(), 1);
    assert_eq!(provider.window_calls(), 0);
}

#[tokio::test]
async fn empty_cache_falls_back_to_upstream() {
    let provider = Arc::new(FakeProvider::new(Answer::Ok(msft_window(310.53)), Answer::Fail));
    let store = Arc::new(FakeStore::new(Answer::Ok(Window::default())));

    let window = service(&provider, &store)
        .current_window(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(window.average_close, 310.53);
    assert_eq!(store.reads(), 1);
    assert_eq!(provider.window_calls(), 1);
}

#[tokio::test]
async fn zero_average_counts_as_a_miss() {
    let provider = Arc::new(FakeProvider::new(Answer::Ok(msft_window(310.53)), Answer::Fail));
    let store = Arc::new(FakeStore::new(Answer::Ok(msft_window(0.0))));

    let window = service(&provider, &store)
        .current_window(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(window.average_close, 310.53);
    assert_eq!(provider.window_calls(), 1);
}

#[tokio::test]
async fn cache_error_is_treated_as_a_miss() {
    let provider = Arc::new(FakeProvider::new(Answer::Ok(msft_window(310.53)), Answer::Fail));
    let store = Arc::new(FakeStore::new(Answer::Fail));

    let window = service(&provider, &store)
        .current_window(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(window.observations.len(), 3);
    assert_eq!(provider.window_calls(), 1);
}

#[tokio::test]
async fn upstream_error_after_miss_is_returned() {
    let provider = Arc::new(FakeProvider::new(Answer::Fail, Answer::Fail));
    let store = Arc::new(FakeStore::new(Answer::Ok(Window::default())));

    let err = service(&provider, &store)
        .current_window(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Upstream(_)));
    assert_eq!(store.reads(), 1);
    assert_eq!(provider.window_calls(), 1);
}

#[tokio::test]
async fn warm_cache_ingests_full_history() {
    let provider = Arc::new(FakeProvider::new(Answer::Fail, Answer::Ok(msft_history())));
    let store = Arc::new(FakeStore::new(Answer::Ok(Window::default())));

    let report = service(&provider, &store)
        .warm_cache(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.written, 3);
    assert_eq!(store.ingested.load(Ordering::SeqCst), 3);
    assert_eq!(provider.history_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn warm_cache_failure_writes_nothing() {
    let provider = Arc::new(FakeProvider::new(Answer::Fail, Answer::Fail));
    let store = Arc::new(FakeStore::new(Answer::Ok(Window::default())));

    let err = service(&provider, &store)
        .warm_cache(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Upstream(_)));
    assert_eq!(store.ingested.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn warmed_cache_serves_subsequent_requests() {
    let provider = Arc::new(FakeProvider::new(Answer::Fail, Answer::Ok(msft_history())));
    let cache = PriceCache::new(MemoryBackend::new())
        .with_anchor_date(NaiveDate::from_ymd_opt(2022, 4, 2).unwrap())
        .with_lookback_days(10);
    let service = PriceService::new(provider.clone(), Arc::new(cache), "MSFT", nonzero!(3usize));

    let cancel = CancellationToken::new();
    service.warm_cache(&cancel).await.unwrap();
    let window = service.current_window(&cancel).await.unwrap();

    assert_eq!(window.average_close, 310.53);
    assert_eq!(window.observations[0].day, "2022-04-01");
    assert_eq!(provider.window_calls(), 0);
}
