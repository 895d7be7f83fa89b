//! rrdpulse collector library entry.
//!
//! Wires the accumulation buffer, schema reconciliation, the step-aligned
//! flush loop and HTTP instrumentation into a `MetricsCollector`. Intended to
//! be embedded by applications and consumed by the demo binary (`main.rs`)
//! and integration tests.

pub mod buffer;
pub mod collector;
pub mod config;
pub mod http;
pub mod reconcile;
pub mod scheduler;
pub mod signal;
pub mod store;

pub use buffer::MetricBuffer;
pub use collector::{CollectorConfig, CollectorHandle, MetricsCollector};
pub use http::HttpInstrumentation;
pub use reconcile::{ReconcileAction, SchemaReconciler};
pub use scheduler::{FlushScheduler, FlushTarget, SchedulerState};
