//! Day-keyed price series as delivered by the upstream.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::price_record::PriceRecord;

/// Wire format of every day key.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Mapping from day string to that day's prices.
///
/// Keys are unique. Upstream order is preserved but carries no meaning, and the
/// series may be sparse (weekends, holidays) or span decades.
pub type TimeSeries = IndexMap<String, PriceRecord>;

/// Descriptive block that accompanies every upstream series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SeriesMetadata {
    #[serde(rename = "1. Information", default, skip_serializing_if = "String::is_empty")]
    pub information: String,
    #[serde(rename = "2. Symbol", default, skip_serializing_if = "String::is_empty")]
    pub symbol: String,
    #[serde(rename = "3. Last Refreshed", default, skip_serializing_if = "String::is_empty")]
    pub last_refreshed: String,
    #[serde(rename = "4. Output Size", default, skip_serializing_if = "String::is_empty")]
    pub output_size: String,
    #[serde(rename = "5. Time Zone", default, skip_serializing_if = "String::is_empty")]
    pub time_zone: String,
}

/// A complete upstream response: metadata plus the daily series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DailySeriesEnvelope {
    #[serde(rename = "Meta Data", default)]
    pub meta_data: SeriesMetadata,

    #[serde(rename = "Time Series (Daily)")]
    pub time_series: TimeSeries,
}
