use serde::{Deserialize, Serialize};

use crate::models::price_record::PriceRecord;

/// One calendar day paired with its prices.
///
/// `day` is always formatted as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyObservation {
    #[serde(rename = "Day")]
    pub day: String,

    #[serde(rename = "Time Series (Daily)")]
    pub price: PriceRecord,
}
