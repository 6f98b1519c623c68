use secrecy::{ExposeSecret, SecretString};

pub const FUNCTION_TIME_SERIES_DAILY: &str = "TIME_SERIES_DAILY";

/// How much history the upstream returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputSize {
    /// The latest ~100 trading days. Upstream default, so no parameter is sent.
    #[default]
    Compact,
    /// The complete history.
    Full,
}

/// Builds the query string for a daily series request.
pub fn construct_params(
    api_key: &SecretString,
    symbol: &str,
    size: OutputSize,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("apikey", api_key.expose_secret().to_string()),
        ("function", FUNCTION_TIME_SERIES_DAILY.to_string()),
        ("symbol", symbol.to_string()),
    ];

    if size == OutputSize::Full {
        params.push(("datatype", "json".to_string()));
        params.push(("outputsize", "full".to_string()));
    }

    params
}
