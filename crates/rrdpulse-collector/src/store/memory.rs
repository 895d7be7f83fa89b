//! In-process store. Keeps schemas and updates in memory and enforces the
//! same contract a real backend does: create refuses to clobber without
//! `overwrite`, update rejects unknown sources.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use rrdpulse_core::{CreateRequest, DataSource, MetricKind, RoundRobinStore, StoreError, UpdateTime};

#[derive(Debug, Clone, Default)]
pub struct MemoryFile {
    pub data_sources: Vec<DataSource>,
    pub start: u64,
    pub step_seconds: u64,
    pub updates: Vec<(UpdateTime, BTreeMap<String, f64>)>,
    /// Set when the file was created from an existing one.
    pub migrated_from: Option<PathBuf>,
    corrupt: bool,
}

impl MemoryFile {
    pub fn names(&self) -> BTreeSet<String> {
        self.data_sources.iter().map(|d| d.name.clone()).collect()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<PathBuf, MemoryFile>>,
    creates: AtomicUsize,
    reject_updates: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn files(&self) -> MutexGuard<'_, HashMap<PathBuf, MemoryFile>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a file holding gauge sources named `names`.
    pub fn with_schema<I, S>(self, path: impl Into<PathBuf>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let data_sources = names
            .into_iter()
            .map(|n| DataSource {
                name: n.into(),
                kind: MetricKind::Gauge,
                heartbeat_seconds: 900,
                min_value: 0,
                max_value: None,
            })
            .collect();
        self.files().insert(
            path.into(),
            MemoryFile {
                data_sources,
                step_seconds: 60,
                ..MemoryFile::default()
            },
        );
        self
    }

    /// Seed a file whose schema cannot be read.
    pub fn with_corrupt(self, path: impl Into<PathBuf>) -> Self {
        self.files().insert(
            path.into(),
            MemoryFile {
                corrupt: true,
                ..MemoryFile::default()
            },
        );
        self
    }

    pub fn file(&self, path: &Path) -> Option<MemoryFile> {
        self.files().get(path).cloned()
    }

    /// Values written to `path`, oldest first.
    pub fn updates(&self, path: &Path) -> Vec<BTreeMap<String, f64>> {
        self.file(path)
            .map(|f| f.updates.into_iter().map(|(_, v)| v).collect())
            .unwrap_or_default()
    }

    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::Relaxed)
    }

    /// Make every update fail until turned off again.
    pub fn reject_updates(&self, reject: bool) {
        self.reject_updates.store(reject, Ordering::Relaxed);
    }
}

#[async_trait]
impl RoundRobinStore for MemoryStore {
    async fn exists(&self, path: &Path) -> Result<bool, StoreError> {
        Ok(self.files().contains_key(path))
    }

    async fn create(&self, req: &CreateRequest) -> Result<(), StoreError> {
        self.creates.fetch_add(1, Ordering::Relaxed);
        let mut files = self.files();
        if files.contains_key(&req.path) && !req.overwrite {
            return Err(StoreError::Rejected(format!(
                "{} exists",
                req.path.display()
            )));
        }

        let mut file = MemoryFile {
            data_sources: req.data_sources.clone(),
            start: req.start,
            step_seconds: req.step_seconds,
            migrated_from: req.source.clone(),
            ..MemoryFile::default()
        };

        // Carry over history for sources that survive the migration.
        if let Some(src) = &req.source {
            let old = files
                .get(src)
                .ok_or_else(|| StoreError::NotFound(src.clone()))?;
            let keep = file.names();
            file.updates = old
                .updates
                .iter()
                .map(|(at, values)| {
                    let kept = values
                        .iter()
                        .filter(|(k, _)| keep.contains(*k))
                        .map(|(k, v)| (k.clone(), *v))
                        .collect();
                    (*at, kept)
                })
                .collect();
        }

        files.insert(req.path.clone(), file);
        Ok(())
    }

    async fn read_schema(&self, path: &Path) -> Result<BTreeSet<String>, StoreError> {
        let files = self.files();
        let file = files
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))?;
        if file.corrupt {
            return Err(StoreError::Corrupt(format!("{} unreadable", path.display())));
        }
        Ok(file.names())
    }

    async fn update(
        &self,
        path: &Path,
        at: UpdateTime,
        values: &BTreeMap<String, f64>,
    ) -> Result<(), StoreError> {
        if self.reject_updates.load(Ordering::Relaxed) {
            return Err(StoreError::Rejected("updates disabled".into()));
        }
        let mut files = self.files();
        let file = files
            .get_mut(path)
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))?;
        let names = file.names();
        if let Some(unknown) = values.keys().find(|k| !names.contains(*k)) {
            return Err(StoreError::Rejected(format!("unknown data source: {unknown}")));
        }
        file.updates.push((at, values.clone()));
        Ok(())
    }
}
