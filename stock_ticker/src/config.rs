//! Process settings, layered as defaults < TOML file < environment < flags.

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    path::{Path, PathBuf},
    time::Duration,
};

use chrono_tz::Tz;
use clap::Parser;
use nonzero_ext::nonzero;
use price_ingestor::{providers::alpha_vantage::DEFAULT_BASE_URL, retry::DEFAULT_MAX_RETRIES};
use secrecy::SecretString;
use serde::Deserialize;
use shared_utils::{
    ConfigError,
    env::{get_env_opt, parse_env_opt},
};

use crate::telemetry::LogFormat;

pub const SYMBOL_ENV: &str = "SYMBOL";
pub const NDAYS_ENV: &str = "NDAYS";
pub const API_KEY_ENV: &str = "API_KEY";
pub const REDIS_URL_ENV: &str = "REDIS_URL";
pub const REDIS_PASSWORD_ENV: &str = "REDIS_PASSWORD";
pub const MARKET_TZ_ENV: &str = "MARKET_TZ";

pub const DEFAULT_SYMBOL: &str = "MSFT";
pub const DEFAULT_WINDOW_DAYS: NonZeroUsize = nonzero!(10usize);
pub const DEFAULT_API_KEY: &str = "demo";
pub const DEFAULT_REDIS_URL: &str = "localhost:6379";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";
pub const DEFAULT_MARKET_TZ: Tz = chrono_tz::US::Eastern;

#[derive(Debug, Parser)]
#[command(version, about = "Serves the recent daily closing prices of one stock symbol")]
pub struct Cli {
    /// TOML file with settings; environment and flags override it.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Upstream endpoint.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Retries after the first upstream attempt.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Per-attempt upstream timeout.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Client-side upstream request quota.
    #[arg(long)]
    pub quota_per_minute: Option<NonZeroU32>,

    /// Calendar days the cache walk probes (default: 20 years).
    #[arg(long, value_name = "DAYS")]
    pub lookback_days: Option<u32>,

    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Shape of the optional `--config` file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub symbol: Option<String>,
    pub ndays: Option<NonZeroUsize>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub retries: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub redis_url: Option<String>,
    pub redis_password: Option<String>,
    pub listen: Option<SocketAddr>,
    pub quota_per_minute: Option<NonZeroU32>,
    pub lookback_days: Option<u32>,
    pub market_tz: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let name = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::invalid(&name, e))?;
        toml::from_str(&raw).map_err(|e| ConfigError::invalid(name, e))
    }
}

/// Resolved, immutable settings handed to every component at startup.
#[derive(Debug)]
pub struct Settings {
    pub symbol: String,
    pub window_days: NonZeroUsize,
    pub api_key: SecretString,
    pub base_url: String,
    pub max_retries: u32,
    pub timeout: Duration,
    pub redis_url: String,
    pub redis_password: SecretString,
    pub listen: SocketAddr,
    pub quota_per_minute: Option<NonZeroU32>,
    pub lookback_days: Option<u32>,
    pub market_tz: Tz,
    pub log_format: LogFormat,
}

impl Settings {
    /// Reads the config file named by `cli`, the environment, then `cli` itself.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::from_path(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let symbol = get_env_opt(SYMBOL_ENV)
            .or(file.symbol)
            .unwrap_or_else(|| DEFAULT_SYMBOL.to_string());

        let window_days = parse_env_opt::<NonZeroUsize>(NDAYS_ENV)?
            .or(file.ndays)
            .unwrap_or(DEFAULT_WINDOW_DAYS);

        let api_key = get_env_opt(API_KEY_ENV)
            .or(file.api_key)
            .unwrap_or_else(|| DEFAULT_API_KEY.to_string());

        let redis_url = get_env_opt(REDIS_URL_ENV)
            .or(file.redis_url)
            .unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());

        let redis_password = get_env_opt(REDIS_PASSWORD_ENV)
            .or(file.redis_password)
            .unwrap_or_default();

        let market_tz = match parse_env_opt::<Tz>(MARKET_TZ_ENV)? {
            Some(tz) => tz,
            None => file
                .market_tz
                .map(|raw| {
                    raw.parse::<Tz>()
                        .map_err(|e| ConfigError::invalid("market_tz", format!("{raw:?}: {e}")))
                })
                .transpose()?
                .unwrap_or(DEFAULT_MARKET_TZ),
        };

        let listen = match cli.listen.or(file.listen) {
            Some(addr) => addr,
            None => DEFAULT_LISTEN
                .parse()
                .map_err(|e| ConfigError::invalid("listen", e))?,
        };

        let timeout_secs = cli
            .timeout
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::invalid("timeout", "must be at least one second"));
        }

        Ok(Self {
            symbol,
            window_days,
            api_key: SecretString::from(api_key),
            base_url: cli
                .base_url
                .clone()
                .or(file.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_retries: cli.retries.or(file.retries).unwrap_or(DEFAULT_MAX_RETRIES),
            timeout: Duration::from_secs(timeout_secs),
            redis_url,
            redis_password: SecretString::from(redis_password),
            listen,
            quota_per_minute: cli.quota_per_minute.or(file.quota_per_minute),
            lookback_days: cli.lookback_days.or(file.lookback_days),
            market_tz,
            log_format: cli.log_format.or(file.log_format).unwrap_or_default(),
        })
    }
}
