//! Turns an unordered upstream series into a bounded, most-recent-first window.
//!
//! Upstream data is treated as untrusted: keys that are not calendar days and
//! closes that are not numbers are logged and skipped, never fatal. Cached
//! records get no such leniency; see `price_cache::store`.

use std::num::NonZeroUsize;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::models::{
    time_series::{DAY_FORMAT, TimeSeries},
    window::{Window, WindowAccumulator},
};

/// Selects the `n` most recent valid days of `series` and averages their closes.
///
/// The returned window may be shorter than `n` when the series runs out of
/// valid days; its average is still divided by `n`.
pub fn sanitize_window(series: &TimeSeries, n: NonZeroUsize) -> Window {
    let mut days: Vec<NaiveDate> = series
        .keys()
        .filter_map(|key| match NaiveDate::parse_from_str(key, DAY_FORMAT) {
            // chrono accepts "2022-4-1"; only the zero-padded spelling is a day key.
            Ok(day) if day.format(DAY_FORMAT).to_string() == *key => Some(day),
            Ok(_) => {
                debug!(key = %key, "skipping series entry with non-canonical day");
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "skipping series entry with unparseable day");
                None
            }
        })
        .collect();

    days.sort_unstable_by(|a, b| b.cmp(a));

    let mut window = WindowAccumulator::new(n);
    for day in days {
        if window.is_full() {
            break;
        }

        let key = day.format(DAY_FORMAT).to_string();
        let Some(record) = series.get(&key) else {
            continue;
        };

        let close = match record.close_value() {
            Ok(close) => close,
            Err(e) => {
                warn!(day = %key, close = %record.close, error = %e, "skipping day with unparseable close");
                continue;
            }
        };

        window.push(key, record.clone(), close);
    }

    debug!(requested = n.get(), collected = window.len(), "sanitized upstream series");
    window.finish()
}
