//! Process wiring: builds the components from [`Settings`] and runs the server.

use std::sync::Arc;

use anyhow::Context;
use chrono_tz::Tz;
use price_cache::{
    DocumentStore, MemoryBackend, PriceCache, PriceStore, RedisJsonBackend,
    backend::redis_json::DEFAULT_CONNECT_TIMEOUT,
};
use price_ingestor::{
    providers::alpha_vantage::{AlphaVantageClient, AlphaVantageOptions},
    retry::RetryPolicy,
};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    config::Settings,
    server::{self, AppState, SHUTDOWN_GRACE},
    service::PriceService,
};

/// Runs the service until SIGINT/SIGTERM.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let Settings {
        symbol,
        window_days,
        api_key,
        base_url,
        max_retries,
        timeout,
        redis_url,
        redis_password,
        listen,
        quota_per_minute,
        lookback_days,
        market_tz,
        ..
    } = settings;

    info!(symbol = %symbol, window_days = window_days.get(), %listen, "starting stock ticker");

    let mut options = AlphaVantageOptions::new(api_key, window_days);
    options.base_url = base_url;
    options.timeout = timeout;
    options.retry = RetryPolicy::default().with_max_retries(max_retries);
    options.requests_per_minute = quota_per_minute;
    let provider = AlphaVantageClient::new(options).context("failed to build upstream client")?;

    let store = connect_store(&redis_url, &redis_password, market_tz, lookback_days).await;
    let service = Arc::new(PriceService::new(
        Arc::new(provider),
        store,
        symbol,
        window_days,
    ));

    let shutdown = CancellationToken::new();

    if let Err(e) = service.warm_cache(&shutdown).await {
        error!(error = %e, "failed to warm cache, continuing without it");
    }

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    let app = server::router(AppState::new(service, shutdown.clone()));

    let mut server = tokio::spawn(server::serve(listener, app, shutdown.clone()));

    tokio::select! {
        joined = &mut server => {
            joined.context("server task panicked")?.context("server error")?;
            return Ok(());
        }
        _ = server::shutdown_signal() => {
            info!("shutdown signal received");
            shutdown.cancel();
        }
    }

    match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
        Ok(joined) => joined.context("server task panicked")?.context("server error")?,
        Err(_) => warn!(
            grace_ms = SHUTDOWN_GRACE.as_millis() as u64,
            "in-flight requests did not finish within the grace period"
        ),
    }

    info!("stopped");
    Ok(())
}

/// Connects to Redis, or falls back to an in-process cache if it is unreachable.
async fn connect_store(
    address: &str,
    password: &SecretString,
    market_tz: Tz,
    lookback_days: Option<u32>,
) -> Arc<dyn PriceStore> {
    match RedisJsonBackend::connect(address, password, DEFAULT_CONNECT_TIMEOUT).await {
        Ok(backend) => Arc::new(configure(PriceCache::new(backend), market_tz, lookback_days)),
        Err(e) => {
            warn!(address, error = %e, "redis unreachable, using in-process cache");
            Arc::new(configure(
                PriceCache::new(MemoryBackend::new()),
                market_tz,
                lookback_days,
            ))
        }
    }
}

fn configure<B: DocumentStore>(
    cache: PriceCache<B>,
    market_tz: Tz,
    lookback_days: Option<u32>,
) -> PriceCache<B> {
    let cache = cache.with_market_tz(market_tz);
    match lookback_days {
        Some(days) => cache.with_lookback_days(days),
        None => cache,
    }
}
