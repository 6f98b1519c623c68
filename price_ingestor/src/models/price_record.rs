//! Canonical in-memory representation of one trading day's prices.
//!
//! The numeric fields are kept exactly as the upstream delivered them (decimal
//! strings). Only the closing price is ever parsed, and only when a window
//! aggregate is computed; see [`PriceRecord::close_value`].

use std::num::ParseFloatError;

use serde::{Deserialize, Serialize};

/// Open/high/low/close/volume for a single calendar day.
///
/// Field names follow the upstream wire format, so the same shape is used for
/// the upstream payload, the cache documents and the HTTP response body.
/// Empty fields are left out when serializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PriceRecord {
    /// Opening price.
    #[serde(rename = "1. open", default, skip_serializing_if = "String::is_empty")]
    pub open: String,

    /// Highest price of the session.
    #[serde(rename = "2. high", default, skip_serializing_if = "String::is_empty")]
    pub high: String,

    /// Lowest price of the session.
    #[serde(rename = "3. low", default, skip_serializing_if = "String::is_empty")]
    pub low: String,

    /// Closing price.
    #[serde(rename = "4. close", default, skip_serializing_if = "String::is_empty")]
    pub close: String,

    /// Traded volume.
    #[serde(rename = "5. volume", default, skip_serializing_if = "String::is_empty")]
    pub volume: String,
}

impl PriceRecord {
    /// Parses the closing price as a floating value.
    pub fn close_value(&self) -> Result<f64, ParseFloatError> {
        self.close.trim().parse::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_upstream_field_names() {
        let raw = r#"{"1. open":"129.6600","2. high":"130.2700","3. low":"128.0600","4. close":"130.1500","5. volume":"4012373"}"#;
        let record: PriceRecord = serde_json::from_str(raw).unwrap();

        assert_eq!(record.open, "129.6600");
        assert_eq!(record.volume, "4012373");
        assert_eq!(record.close_value().unwrap(), 130.15);
        // Original strings survive a round trip untouched.
        assert_eq!(serde_json::to_string(&record).unwrap(), raw);
    }

    #[test]
    fn empty_fields_are_omitted() {
        let record = PriceRecord {
            close: "130.1500".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"4. close":"130.1500"}"#);
        assert_eq!(serde_json::from_str::<PriceRecord>(&json).unwrap(), record);
    }

    #[test]
    fn non_numeric_close_is_an_error() {
        let record = PriceRecord {
            close: "n/a".into(),
            ..Default::default()
        };
        assert!(record.close_value().is_err());
    }
}
