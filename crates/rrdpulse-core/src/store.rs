//! The round-robin store seam.
//!
//! The collector never touches the on-disk format. It needs exactly these
//! operations from a backend: existence check, create (optionally copying
//! from an existing file), read the data-source names, and update.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::archive::Archive;
use crate::descriptor::{MetricDescriptor, MetricKind};
use crate::error::StoreError;

/// Data-source definition as handed to `create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub name: String,
    pub kind: MetricKind,
    pub heartbeat_seconds: u32,
    pub min_value: i64,
    /// `None` means unbounded.
    pub max_value: Option<i64>,
}

impl From<&MetricDescriptor> for DataSource {
    fn from(d: &MetricDescriptor) -> Self {
        Self {
            name: d.name().to_string(),
            kind: d.kind(),
            heartbeat_seconds: d.heartbeat_seconds(),
            min_value: d.min_value(),
            max_value: d.max_value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    pub path: PathBuf,
    /// Unix seconds.
    pub start: u64,
    pub step_seconds: u64,
    pub data_sources: Vec<DataSource>,
    pub archives: Vec<Archive>,
    /// When false, creation fails if `path` exists.
    pub overwrite: bool,
    /// Copy matching series from this file before replacing the schema.
    pub source: Option<PathBuf>,
}

/// Update timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTime {
    Now,
    /// Unix seconds.
    At(u64),
}

#[async_trait]
pub trait RoundRobinStore: Send + Sync {
    async fn exists(&self, path: &Path) -> Result<bool, StoreError>;

    async fn create(&self, req: &CreateRequest) -> Result<(), StoreError>;

    /// Names of the persisted data sources.
    async fn read_schema(&self, path: &Path) -> Result<BTreeSet<String>, StoreError>;

    /// Write one sample per named source. Sources not in `values` are
    /// recorded as unknown.
    async fn update(
        &self,
        path: &Path,
        at: UpdateTime,
        values: &BTreeMap<String, f64>,
    ) -> Result<(), StoreError>;
}
