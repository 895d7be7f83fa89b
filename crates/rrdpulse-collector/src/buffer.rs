//! In-memory accumulation buffer.
//!
//! One mutex guards the whole map. Every writer (request handlers, gauge
//! setters) and the flush path go through it, so a drain never observes a
//! half-applied update and a half-reset buffer is never visible.
//!
//! Reset rule per kind:
//! - Counter / Derive / Absolute: set back to 0.
//! - Gauge: removed, so the next flush reports it as unknown instead of 0.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use rrdpulse_core::MetricKind;

#[derive(Default)]
struct BufferInner {
    values: HashMap<String, f64>,
    kinds: HashMap<String, MetricKind>,
}

impl BufferInner {
    fn reset_entry(&mut self, name: &str, kind: MetricKind) {
        if kind.is_gauge() {
            self.values.remove(name);
        } else {
            self.values.insert(name.to_string(), 0.0);
        }
    }
}

#[derive(Default)]
pub struct MetricBuffer {
    inner: Mutex<BufferInner>,
}

impl MetricBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock only means a writer panicked mid-update; the map itself
    // is still a valid set of floats, so keep collecting.
    fn lock(&self) -> MutexGuard<'_, BufferInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Track `name` and initialize it per its kind.
    pub fn register(&self, name: &str, kind: MetricKind) {
        let mut g = self.lock();
        g.kinds.insert(name.to_string(), kind);
        g.reset_entry(name, kind);
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.lock().kinds.contains_key(name)
    }

    /// Add `delta` to the current value. Returns false for unregistered names.
    pub fn record(&self, name: &str, delta: f64) -> bool {
        let mut g = self.lock();
        if !g.kinds.contains_key(name) {
            return false;
        }
        *g.values.entry(name.to_string()).or_insert(0.0) += delta;
        true
    }

    /// Overwrite the current value. Returns false for unregistered names.
    pub fn set(&self, name: &str, value: f64) -> bool {
        let mut g = self.lock();
        if !g.kinds.contains_key(name) {
            return false;
        }
        g.values.insert(name.to_string(), value);
        true
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.lock().values.get(name).copied()
    }

    /// Run a multi-entry update inside one critical section.
    pub fn with_values<R>(&self, f: impl FnOnce(&mut HashMap<String, f64>) -> R) -> R {
        let mut g = self.lock();
        f(&mut g.values)
    }

    /// Snapshot every entry and reset, atomically.
    pub fn drain_and_reset(&self) -> BTreeMap<String, f64> {
        let mut g = self.lock();
        let snapshot: BTreeMap<String, f64> = g.values.drain().collect();
        let kinds: Vec<(String, MetricKind)> =
            g.kinds.iter().map(|(k, v)| (k.clone(), *v)).collect();
        for (name, kind) in kinds {
            g.reset_entry(&name, kind);
        }
        snapshot
    }

    /// Number of entries currently holding a value.
    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
