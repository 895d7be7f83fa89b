//! `rrdtool` CLI backend.
//!
//! Each operation is one `rrdtool` invocation through `tokio::process`.
//! Argument building and `info` parsing are plain functions so they can be
//! checked without the binary installed.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use rrdpulse_core::{CreateRequest, DataSource, RoundRobinStore, StoreError, UpdateTime};

#[derive(Debug, Clone)]
pub struct RrdtoolStore {
    binary: PathBuf,
}

impl Default for RrdtoolStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RrdtoolStore {
    /// Use `rrdtool` from `PATH`.
    pub fn new() -> Self {
        Self::with_binary("rrdtool")
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, args: &[String]) -> Result<String, StoreError> {
        let out = Command::new(&self.binary).args(args).output().await?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            return Err(StoreError::Rejected(stderr));
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

/// `DS:name:KIND:heartbeat:min:max`, `U` for an unbounded max.
pub fn ds_definition(ds: &DataSource) -> String {
    let max = ds
        .max_value
        .map(|m| m.to_string())
        .unwrap_or_else(|| "U".to_string());
    format!(
        "DS:{}:{}:{}:{}:{}",
        ds.name,
        ds.kind.as_str(),
        ds.heartbeat_seconds,
        ds.min_value,
        max
    )
}

pub fn create_args(req: &CreateRequest) -> Vec<String> {
    let mut args = vec![
        "create".to_string(),
        req.path.to_string_lossy().into_owned(),
        "--start".to_string(),
        req.start.to_string(),
        "--step".to_string(),
        req.step_seconds.to_string(),
    ];
    if !req.overwrite {
        args.push("--no-overwrite".to_string());
    }
    if let Some(src) = &req.source {
        args.push("--source".to_string());
        args.push(src.to_string_lossy().into_owned());
    }
    args.extend(req.data_sources.iter().map(ds_definition));
    args.extend(req.archives.iter().map(|a| {
        format!(
            "RRA:{}:{}:{}:{}",
            a.consolidation.as_str(),
            a.xff,
            a.resolution,
            a.retention
        )
    }));
    args
}

/// `update <path> --template a:b N:1:2`. Sources missing from `values` are
/// left out of the template, which the store records as unknown.
pub fn update_args(path: &Path, at: UpdateTime, values: &BTreeMap<String, f64>) -> Vec<String> {
    let template = values.keys().cloned().collect::<Vec<_>>().join(":");
    let mut sample = match at {
        UpdateTime::Now => "N".to_string(),
        UpdateTime::At(ts) => ts.to_string(),
    };
    for v in values.values() {
        sample.push(':');
        sample.push_str(&v.to_string());
    }
    vec![
        "update".to_string(),
        path.to_string_lossy().into_owned(),
        "--template".to_string(),
        template,
        sample,
    ]
}

/// Data-source names from `rrdtool info` output (`ds[NAME].index = N`).
pub fn parse_ds_names(info: &str) -> BTreeSet<String> {
    info.lines()
        .filter_map(|line| line.trim().strip_prefix("ds["))
        .filter_map(|rest| rest.split_once("].index"))
        .map(|(name, _)| name.to_string())
        .collect()
}

#[async_trait]
impl RoundRobinStore for RrdtoolStore {
    async fn exists(&self, path: &Path) -> Result<bool, StoreError> {
        Ok(tokio::fs::try_exists(path).await?)
    }

    async fn create(&self, req: &CreateRequest) -> Result<(), StoreError> {
        tracing::debug!(path = %req.path.display(), sources = req.data_sources.len(), "rrdtool create");
        self.run(&create_args(req)).await.map(|_| ())
    }

    async fn read_schema(&self, path: &Path) -> Result<BTreeSet<String>, StoreError> {
        let info = self
            .run(&["info".to_string(), path.to_string_lossy().into_owned()])
            .await
            .map_err(|e| match e {
                StoreError::Rejected(msg) => StoreError::Corrupt(msg),
                other => other,
            })?;
        if !info.lines().any(|l| l.starts_with("rrd_version")) {
            return Err(StoreError::Corrupt(format!(
                "{} is not a round-robin database",
                path.display()
            )));
        }
        Ok(parse_ds_names(&info))
    }

    async fn update(
        &self,
        path: &Path,
        at: UpdateTime,
        values: &BTreeMap<String, f64>,
    ) -> Result<(), StoreError> {
        self.run(&update_args(path, at, values)).await.map(|_| ())
    }
}
