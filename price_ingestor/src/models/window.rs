//! The N-day window served to callers, and the accumulator that builds it.
//!
//! Both the upstream path ([`crate::sanitize`]) and the cache path build their
//! output through [`WindowAccumulator`], so bounds, divisor and rounding cannot
//! drift apart between the two.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::{
    models::{observation::DailyObservation, price_record::PriceRecord},
    rounding::fixed_precision,
};

/// Number of decimal digits kept on the average closing price.
pub const AVERAGE_DIGITS: u32 = 2;

/// Most-recent-first daily observations plus their average close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Window {
    #[serde(rename = "Daily Price")]
    pub observations: Vec<DailyObservation>,

    #[serde(rename = "Average Closing Price")]
    pub average_close: f64,
}

impl Window {
    /// True when the window carries no observations or a zero average.
    ///
    /// Such a window is never served from the cache; the caller falls back to
    /// the upstream instead.
    pub fn is_degenerate(&self) -> bool {
        self.observations.is_empty() || self.average_close == 0.0
    }
}

/// Collects up to `n` observations, fed most-recent-first.
#[derive(Debug)]
pub struct WindowAccumulator {
    requested: NonZeroUsize,
    sum: f64,
    observations: Vec<DailyObservation>,
}

impl WindowAccumulator {
    pub fn new(requested: NonZeroUsize) -> Self {
        Self {
            requested,
            sum: 0.0,
            observations: Vec::with_capacity(requested.get()),
        }
    }

    /// Appends one valid day. Callers must stop once [`is_full`](Self::is_full).
    pub fn push(&mut self, day: String, price: PriceRecord, close: f64) {
        debug_assert!(!self.is_full());
        self.sum += close;
        self.observations.push(DailyObservation { day, price });
    }

    pub fn is_full(&self) -> bool {
        self.observations.len() >= self.requested.get()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Closes the window.
    ///
    /// The sum is divided by the *requested* size, not by the number of days
    /// actually collected, so a short window reports a proportionally lower
    /// average.
    pub fn finish(self) -> Window {
        let average = self.sum / self.requested.get() as f64;
        Window {
            observations: self.observations,
            average_close: fixed_precision(average, AVERAGE_DIGITS),
        }
    }
}
