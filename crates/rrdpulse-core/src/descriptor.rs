//! Metric descriptors: one immutable description per tracked series.

use serde::Deserialize;

use crate::naming::{normalize_base, normalize_ds_name};

/// Data-source kind understood by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Absence of a sample is meaningful (stored as unknown, not zero).
    Gauge,
    Counter,
    Derive,
    Absolute,
}

impl MetricKind {
    /// Keyword used in store definitions.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Gauge => "GAUGE",
            MetricKind::Counter => "COUNTER",
            MetricKind::Derive => "DERIVE",
            MetricKind::Absolute => "ABSOLUTE",
        }
    }

    /// Gauges are removed from the buffer on reset; every other kind is zeroed.
    pub fn is_gauge(self) -> bool {
        matches!(self, MetricKind::Gauge)
    }
}

/// Per-metric options. Defaults: heartbeat 900s, min 0, max unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricOptions {
    #[serde(default = "default_heartbeat_seconds")]
    pub heartbeat_seconds: u32,
    #[serde(default)]
    pub min_value: i64,
    #[serde(default)]
    pub max_value: Option<i64>,
}

impl Default for MetricOptions {
    fn default() -> Self {
        Self {
            heartbeat_seconds: default_heartbeat_seconds(),
            min_value: 0,
            max_value: None,
        }
    }
}

fn default_heartbeat_seconds() -> u32 {
    900
}

/// One tracked series. Created at registration time, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    name: String,
    kind: MetricKind,
    options: MetricOptions,
}

impl MetricDescriptor {
    /// Build a descriptor, normalizing `name` into a valid identifier.
    pub fn new(name: &str, kind: MetricKind, options: MetricOptions) -> Self {
        Self {
            name: normalize_ds_name(name),
            kind,
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn heartbeat_seconds(&self) -> u32 {
        self.options.heartbeat_seconds
    }

    pub fn min_value(&self) -> i64 {
        self.options.min_value
    }

    pub fn max_value(&self) -> Option<i64> {
        self.options.max_value
    }
}

/// The five series derived from one HTTP base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMetricSet {
    pub base: String,
    /// Request count.
    pub cnt: String,
    /// 4xx responses.
    pub cerr: String,
    /// 5xx responses.
    pub serr: String,
    /// Running average latency (ms).
    pub lat: String,
    /// Max latency (ms).
    pub mlat: String,
}

impl HttpMetricSet {
    pub fn new(base: &str) -> Self {
        let base = normalize_base(base);
        Self {
            cnt: format!("{base}_cnt"),
            cerr: format!("{base}_cerr"),
            serr: format!("{base}_serr"),
            lat: format!("{base}_lat"),
            mlat: format!("{base}_mlat"),
            base,
        }
    }

    /// Descriptors in store-creation order.
    pub fn descriptors(&self, options: MetricOptions) -> [MetricDescriptor; 5] {
        [
            MetricDescriptor::new(&self.cnt, MetricKind::Absolute, options),
            MetricDescriptor::new(&self.cerr, MetricKind::Absolute, options),
            MetricDescriptor::new(&self.serr, MetricKind::Absolute, options),
            MetricDescriptor::new(&self.lat, MetricKind::Gauge, options),
            MetricDescriptor::new(&self.mlat, MetricKind::Gauge, options),
        ]
    }
}
