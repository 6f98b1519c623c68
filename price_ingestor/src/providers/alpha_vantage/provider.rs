use std::{
    num::{NonZeroU32, NonZeroUsize},
    time::Duration,
};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode, Url, header};
use secrecy::SecretString;
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    models::{time_series::DailySeriesEnvelope, window::Window},
    providers::{
        ClientBuildSnafu, DataProvider, InvalidBaseUrlSnafu, ProviderError, ProviderInitError,
        alpha_vantage::{
            params::{OutputSize, construct_params},
            response::decode_envelope,
        },
    },
    retry::{AttemptFailure, RetryPolicy},
    sanitize::sanitize_window,
};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for [`AlphaVantageClient`].
#[derive(Debug)]
pub struct AlphaVantageOptions {
    pub base_url: String,
    pub api_key: SecretString,
    /// N, the number of most recent days in a served window.
    pub window_days: NonZeroUsize,
    /// Per-attempt HTTP timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Client-side request quota. `None` disables local throttling.
    pub requests_per_minute: Option<NonZeroU32>,
}

impl AlphaVantageOptions {
    pub fn new(api_key: SecretString, window_days: NonZeroUsize) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            window_days,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            requests_per_minute: None,
        }
    }
}

pub struct AlphaVantageClient {
    client: Client,
    base_url: Url,
    api_key: SecretString,
    window_days: NonZeroUsize,
    retry: RetryPolicy,
    quota: Option<DefaultDirectRateLimiter>,
}

impl AlphaVantageClient {
    /// Creates a new client. No request is made until a fetch is issued.
    pub fn new(options: AlphaVantageOptions) -> Result<Self, ProviderInitError> {
        let base_url = Url::parse(options.base_url.trim()).map_err(|e| {
            InvalidBaseUrlSnafu {
                url: options.base_url.clone(),
                message: e.to_string(),
            }
            .build()
        })?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url,
            api_key: options.api_key,
            window_days: options.window_days,
            retry: options.retry,
            quota: options
                .requests_per_minute
                .map(|n| RateLimiter::direct(Quota::per_minute(n))),
        })
    }

    pub fn window_days(&self) -> NonZeroUsize {
        self.window_days
    }

    /// Issues one logical request, retried per [`RetryPolicy`], and returns the raw body.
    async fn fetch_body(
        &self,
        symbol: &str,
        size: OutputSize,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        let params = construct_params(&self.api_key, symbol, size);

        self.retry
            .run(cancel, |attempt| {
                let request = self.client.get(self.base_url.clone()).query(&params);
                async move {
                    if let Some(quota) = &self.quota {
                        quota.until_ready().await;
                    }
                    debug!(symbol, ?size, attempt, "requesting daily series");
                    classify(request.send().await).await
                }
            })
            .await
    }
}

/// Maps one HTTP exchange onto the retry machine's vocabulary.
async fn classify(
    response: Result<reqwest::Response, reqwest::Error>,
) -> Result<String, AttemptFailure> {
    // `without_url` keeps the api key out of logs and errors.
    let response = response.map_err(|e| {
        AttemptFailure::Transient(format!("error performing request: {}", e.without_url()))
    })?;

    match response.status() {
        StatusCode::OK => response.text().await.map_err(|e| {
            AttemptFailure::Transient(format!("error reading response body: {}", e.without_url()))
        }),
        StatusCode::TOO_MANY_REQUESTS => Err(AttemptFailure::RateLimited),
        status => Err(AttemptFailure::Transient(format!(
            "unexpected response status code: {}",
            status.as_u16()
        ))),
    }
}

#[async_trait]
impl DataProvider for AlphaVantageClient {
    async fn fetch_window(
        &self,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> Result<Window, ProviderError> {
        let body = self.fetch_body(symbol, OutputSize::Compact, cancel).await?;
        let envelope = decode_envelope(&body)?;
        Ok(sanitize_window(&envelope.time_series, self.window_days))
    }

    async fn fetch_full_history(
        &self,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> Result<DailySeriesEnvelope, ProviderError> {
        let body = self.fetch_body(symbol, OutputSize::Full, cancel).await?;
        let envelope = decode_envelope(&body)?;
        info!(
            symbol,
            days = envelope.time_series.len(),
            "fetched full daily history"
        );
        Ok(envelope)
    }
}
