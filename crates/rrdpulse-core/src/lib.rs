//! rrdpulse core: metric descriptors, identifier rules, error types and the
//! round-robin store seam.
//!
//! This crate holds the data model shared by the collector runtime and any
//! store backend. It carries no runtime or HTTP dependencies so a backend can
//! be written against it alone.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! All fallible paths surface as `RrdPulseError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod archive;
pub mod descriptor;
pub mod error;
pub mod naming;
pub mod store;

pub use archive::{default_archives, Archive, Consolidation};
pub use descriptor::{HttpMetricSet, MetricDescriptor, MetricKind, MetricOptions};
/// Shared result type.
pub use error::{ErrorCode, Result, RrdPulseError, StoreError};
pub use naming::{normalize_base, normalize_ds_name, route_metric, UNKNOWN_ROUTE};
pub use store::{CreateRequest, DataSource, RoundRobinStore, UpdateTime};
