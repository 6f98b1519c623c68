#![allow(dead_code)]

use chrono::NaiveDate;
use price_ingestor::models::{price_record::PriceRecord, time_series::TimeSeries};

/// "Today" for every fixture; the cache walk starts on 2022-04-01.
pub fn anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 4, 2).unwrap()
}

pub fn record(open: &str, high: &str, low: &str, close: &str, volume: &str) -> PriceRecord {
    PriceRecord {
        open: open.into(),
        high: high.into(),
        low: low.into(),
        close: close.into(),
        volume: volume.into(),
    }
}

/// Three MSFT sessions, inserted out of order, with a weekend before them.
pub fn msft_series() -> TimeSeries {
    let mut series = TimeSeries::new();
    series.insert(
        "2022-03-30".into(),
        record("313.7600", "315.9500", "311.5800", "313.8600", "28163555"),
    );
    series.insert(
        "2022-04-01".into(),
        record("309.3700", "310.1300", "305.5400", "309.4200", "27110529"),
    );
    series.insert(
        "2022-03-31".into(),
        record("313.9000", "315.1400", "307.8900", "308.3100", "33422070"),
    );
    series.insert(
        "2022-03-25".into(),
        record("305.2300", "305.5000", "299.2850", "303.6800", "22566472"),
    );
    series
}
