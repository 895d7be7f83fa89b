//! HTTP request instrumentation.
//!
//! Every instrumented request updates five series of one `HttpMetricSet`:
//! count, 4xx count, 5xx count, running average latency and max latency
//! (milliseconds). The whole update happens inside one buffer critical
//! section.

pub mod middleware;

use std::collections::HashMap;

use rrdpulse_core::HttpMetricSet;

pub use middleware::{track, HttpInstrumentation};

/// Fold one finished request into `values`.
///
/// The average uses the count from before this request:
/// `avg' = (avg * n + latency) / (n + 1)`. The max compares against this
/// request's latency, not the stored average.
pub fn apply_request(
    values: &mut HashMap<String, f64>,
    set: &HttpMetricSet,
    latency_ms: f64,
    status: u16,
) {
    let count = values.get(&set.cnt).copied().unwrap_or(0.0);
    let avg = values.get(&set.lat).copied().unwrap_or(0.0);

    values.insert(set.lat.clone(), (avg * count + latency_ms) / (count + 1.0));

    let max = values.entry(set.mlat.clone()).or_insert(latency_ms);
    if latency_ms > *max {
        *max = latency_ms;
    }

    values.insert(set.cnt.clone(), count + 1.0);

    match status / 100 {
        4 => *values.entry(set.cerr.clone()).or_insert(0.0) += 1.0,
        5 => *values.entry(set.serr.clone()).or_insert(0.0) += 1.0,
        _ => {}
    }
}
