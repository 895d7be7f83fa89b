//! The collector: descriptor registry, buffer, gauge samplers and the glue
//! that reconciles the store and drives the flush scheduler.
//!
//! Typical lifecycle:
//! 1. register metrics (directly, via gauge samplers, or via HTTP instrumentation),
//! 2. `start()` reconciles the store schema and spawns the flush loop,
//! 3. `CollectorHandle::shutdown()` (or `shutdown_on_signal()`) flushes one
//!    last time and reports the outcome.
//!
//! Metrics registered after `start()` are buffered but not part of the store
//! schema until the next start. Flushes drop them so the rest of the update
//! still lands.
//! Duplicate plain metric names are not detected; avoid namespace collisions.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::SystemTime;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use rrdpulse_core::error::{Result, RrdPulseError};
use rrdpulse_core::{
    default_archives, route_metric, Archive, HttpMetricSet, MetricDescriptor, MetricKind,
    MetricOptions, RoundRobinStore, UpdateTime, UNKNOWN_ROUTE,
};

use crate::buffer::MetricBuffer;
use crate::reconcile::{ReconcileAction, SchemaReconciler};
use crate::scheduler::{FlushScheduler, FlushTarget, SchedulerState};

/// Zero-argument sampler polled at every flush.
pub type GaugeSampler = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Enumerates route patterns at start time.
pub type RouteSource = Box<dyn Fn() -> Vec<String> + Send + Sync>;

/// Collector-wide settings.
///
/// `step_seconds` is both the store's native resolution and the flush
/// interval; they are never configured separately.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub store_path: PathBuf,
    pub step_seconds: u64,
    pub defaults: MetricOptions,
    pub archives: Vec<Archive>,
}

impl CollectorConfig {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            step_seconds: 60,
            defaults: MetricOptions::default(),
            archives: default_archives(),
        }
    }

    pub fn with_step(mut self, step_seconds: u64) -> Self {
        self.step_seconds = step_seconds;
        self
    }
}

pub struct MetricsCollector {
    cfg: CollectorConfig,
    store: Arc<dyn RoundRobinStore>,
    descriptors: RwLock<Vec<MetricDescriptor>>,
    buffer: MetricBuffer,
    samplers: DashMap<String, GaugeSampler>,
    http_sets: DashMap<String, HttpMetricSet>,
    route_source: Mutex<Option<RouteSource>>,
    flush_gate: tokio::sync::Mutex<()>,
    started: AtomicBool,
    /// Source names the store was reconciled with; `None` before start.
    schema: RwLock<Option<BTreeSet<String>>>,
    dropped: DashSet<String>,
}

impl MetricsCollector {
    pub fn new(cfg: CollectorConfig, store: Arc<dyn RoundRobinStore>) -> Self {
        Self {
            cfg,
            store,
            descriptors: RwLock::new(Vec::new()),
            buffer: MetricBuffer::new(),
            samplers: DashMap::new(),
            http_sets: DashMap::new(),
            route_source: Mutex::new(None),
            flush_gate: tokio::sync::Mutex::new(()),
            started: AtomicBool::new(false),
            schema: RwLock::new(None),
            dropped: DashSet::new(),
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.cfg
    }

    pub fn buffer(&self) -> &MetricBuffer {
        &self.buffer
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    fn has_schema(&self) -> bool {
        self.schema
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Registered descriptors, in registration order.
    pub fn descriptors(&self) -> Vec<MetricDescriptor> {
        self.descriptors
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn register(&self, descriptor: MetricDescriptor) {
        if self.has_schema() {
            tracing::warn!(
                metric = descriptor.name(),
                "metric registered after start; not in store schema until restart"
            );
        }
        self.buffer.register(descriptor.name(), descriptor.kind());
        self.descriptors
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(descriptor);
    }

    /// Register a metric with the collector defaults. Returns the normalized name.
    pub fn add_metric(&self, name: &str, kind: MetricKind) -> String {
        self.add_metric_with(name, kind, self.cfg.defaults)
    }

    pub fn add_metric_with(&self, name: &str, kind: MetricKind, options: MetricOptions) -> String {
        let descriptor = MetricDescriptor::new(name, kind, options);
        let name = descriptor.name().to_string();
        self.register(descriptor);
        name
    }

    /// Register a gauge whose value is pulled from `sampler` at flush time.
    pub fn add_gauge_metric<F>(&self, name: &str, sampler: F) -> String
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        let name = self.add_metric(name, MetricKind::Gauge);
        self.samplers.insert(name.clone(), Arc::new(sampler));
        name
    }

    /// Register the five HTTP series for `base`. Registering the same base
    /// again returns the existing set without adding descriptors.
    pub fn add_http_metrics(&self, base: &str) -> HttpMetricSet {
        let set = HttpMetricSet::new(base);
        match self.http_sets.entry(set.base.clone()) {
            Entry::Occupied(e) => e.get().clone(),
            Entry::Vacant(v) => {
                for d in set.descriptors(self.cfg.defaults) {
                    self.register(d);
                }
                v.insert(set.clone());
                set
            }
        }
    }

    pub fn http_set(&self, base: &str) -> Option<HttpMetricSet> {
        self.http_sets.get(base).map(|s| s.value().clone())
    }

    /// Route patterns returned by `source` each get an HTTP set at start time,
    /// plus one `unknown` set for requests matching none of them.
    pub fn set_route_source<F>(&self, source: F)
    where
        F: Fn() -> Vec<String> + Send + Sync + 'static,
    {
        *self
            .route_source
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Box::new(source));
    }

    /// Add `delta` to a counter-like metric.
    pub fn record(&self, name: &str, delta: f64) -> bool {
        self.buffer.record(name, delta)
    }

    /// Set a pushed gauge value.
    pub fn set(&self, name: &str, value: f64) -> bool {
        self.buffer.set(name, value)
    }

    /// Drain the buffer, poll gauge samplers and write one update.
    ///
    /// The buffer is reset even when the store rejects the write; that
    /// interval is lost. Nothing is written when there are no values.
    pub async fn flush_now(&self) -> Result<usize> {
        let _gate = self.flush_gate.lock().await;

        let mut values = self.buffer.drain_and_reset();

        let samplers: Vec<(String, GaugeSampler)> = self
            .samplers
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();
        for (name, sampler) in samplers {
            let v = sampler();
            if v.is_finite() {
                values.insert(name, v);
            } else {
                tracing::debug!(metric = %name, "non-finite gauge sample; reporting unknown");
            }
        }

        self.retain_schema(&mut values);

        if values.is_empty() {
            tracing::debug!("nothing to flush");
            return Ok(0);
        }

        self.store
            .update(&self.cfg.store_path, UpdateTime::Now, &values)
            .await
            .map_err(RrdPulseError::FlushFailed)?;
        Ok(values.len())
    }

    /// Drop sources the store does not know; warns once per name.
    fn retain_schema(&self, values: &mut BTreeMap<String, f64>) {
        let schema = self
            .schema
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(schema) = schema.as_ref() else { return };

        values.retain(|name, _| {
            if schema.contains(name) {
                return true;
            }
            if self.dropped.insert(name.clone()) {
                tracing::warn!(metric = %name, "metric not in store schema; dropping its samples until restart");
            }
            false
        });
    }

    fn register_routes(&self) {
        let source = self
            .route_source
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        let Some(source) = source else { return };

        let mut routes = 0usize;
        for route in source() {
            self.add_http_metrics(&route_metric(&route));
            routes += 1;
        }
        self.add_http_metrics(UNKNOWN_ROUTE);
        tracing::debug!(routes, sets = self.http_sets.len(), "registered route metrics");
    }

    /// Reconcile the store schema and start the flush loop.
    ///
    /// Store errors here are fatal and the loop is not started. With nothing
    /// registered, no store is touched and an idle handle is returned.
    /// Only one call can be in flight; a concurrent or repeated call fails.
    pub async fn start(self: &Arc<Self>) -> Result<CollectorHandle> {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RrdPulseError::Internal("collector already started".into()));
        }
        self.register_routes();

        let descriptors = self.descriptors();
        if descriptors.is_empty() {
            tracing::info!("no metrics registered; collector idle");
            self.started.store(false, Ordering::Release);
            return Ok(CollectorHandle::idle());
        }

        let reconciler = SchemaReconciler::new(
            Arc::clone(&self.store),
            self.cfg.step_seconds,
            self.cfg.archives.clone(),
        );
        let action = match reconciler
            .reconcile(&descriptors, &self.cfg.store_path, SystemTime::now())
            .await
        {
            Ok(action) => action,
            Err(e) => {
                self.started.store(false, Ordering::Release);
                return Err(e);
            }
        };

        *self
            .schema
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) =
            Some(descriptors.iter().map(|d| d.name().to_string()).collect());

        let scheduler = FlushScheduler::new(self.cfg.step_seconds);
        let state = scheduler.subscribe();
        let cancel = CancellationToken::new();
        let target: Arc<dyn FlushTarget> = Arc::clone(self) as Arc<dyn FlushTarget>;
        let task = tokio::spawn(scheduler.run(target, cancel.clone()));

        tracing::info!(
            path = %self.cfg.store_path.display(),
            step_s = self.cfg.step_seconds,
            sources = descriptors.len(),
            schema = action.as_str(),
            "collecting metrics"
        );

        Ok(CollectorHandle {
            action: Some(action),
            cancel,
            task: Some(task),
            state: Some(state),
        })
    }
}

#[async_trait]
impl FlushTarget for MetricsCollector {
    async fn flush(&self) -> Result<usize> {
        self.flush_now().await
    }
}

/// Running collector. Dropping the handle leaves the loop running; call
/// `shutdown` to get the final flush.
pub struct CollectorHandle {
    action: Option<ReconcileAction>,
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<()>>>,
    state: Option<watch::Receiver<SchedulerState>>,
}

impl CollectorHandle {
    fn idle() -> Self {
        Self {
            action: None,
            cancel: CancellationToken::new(),
            task: None,
            state: None,
        }
    }

    /// What start-up did to the store. `None` when nothing was registered.
    pub fn schema_action(&self) -> Option<ReconcileAction> {
        self.action
    }

    pub fn state(&self) -> SchedulerState {
        self.state
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(SchedulerState::Idle)
    }

    /// Stop the loop after one final flush. Returns that flush's outcome.
    pub async fn shutdown(self) -> Result<()> {
        self.cancel.cancel();
        match self.task {
            Some(task) => task
                .await
                .map_err(|e| RrdPulseError::Internal(format!("flush task join failed: {e}")))?,
            None => Ok(()),
        }
    }

    /// Wait for SIGINT/SIGTERM, then shut down.
    pub async fn shutdown_on_signal(self) -> Result<()> {
        crate::signal::terminate().await;
        tracing::info!("termination signal received; flushing");
        self.shutdown().await
    }
}
