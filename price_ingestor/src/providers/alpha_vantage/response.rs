use indexmap::IndexMap;
use serde::Deserialize;
use snafu::ResultExt;
use tracing::warn;

use crate::{
    models::{
        price_record::PriceRecord,
        time_series::{DailySeriesEnvelope, SeriesMetadata, TimeSeries},
    },
    providers::{ApiSnafu, DecodeSnafu, ProviderError},
};

/// Top-level response body.
///
/// When the upstream refuses a request (unknown symbol, bad key, quota) it
/// still answers 200 but replaces the series with one of the notice fields.
#[derive(Debug, Deserialize)]
pub struct RawEnvelope {
    #[serde(rename = "Meta Data", default)]
    pub meta_data: SeriesMetadata,

    #[serde(rename = "Time Series (Daily)")]
    pub time_series: Option<IndexMap<String, serde_json::Value>>,

    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,

    #[serde(rename = "Note")]
    pub note: Option<String>,

    #[serde(rename = "Information")]
    pub information: Option<String>,
}

impl RawEnvelope {
    fn notice(self) -> String {
        self.error_message
            .or(self.note)
            .or(self.information)
            .unwrap_or_else(|| "response carries no daily time series".to_string())
    }
}

/// Decodes a response body into a [`DailySeriesEnvelope`].
///
/// A body that is not JSON is a [`ProviderError::Decode`]; a JSON body without a
/// series is a [`ProviderError::Api`] carrying the upstream's notice. Individual
/// entries that do not look like a price record are dropped with a warning.
pub fn decode_envelope(body: &str) -> Result<DailySeriesEnvelope, ProviderError> {
    let mut raw: RawEnvelope = serde_json::from_str(body).context(DecodeSnafu)?;

    let Some(entries) = raw.time_series.take() else {
        return ApiSnafu {
            message: raw.notice(),
        }
        .fail();
    };

    let mut time_series = TimeSeries::with_capacity(entries.len());
    for (day, value) in entries {
        match serde_json::from_value::<PriceRecord>(value) {
            Ok(record) => {
                time_series.insert(day, record);
            }
            Err(e) => warn!(day = %day, error = %e, "skipping undecodable series entry"),
        }
    }

    Ok(DailySeriesEnvelope {
        meta_data: raw.meta_data,
        time_series,
    })
}
