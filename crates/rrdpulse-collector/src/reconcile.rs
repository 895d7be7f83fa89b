//! Schema reconciliation against the persisted store.
//!
//! Compares the registered descriptor names with the data sources already in
//! the store file and decides whether to create, migrate, or leave it alone.
//! A rename looks exactly like a removal plus an addition: the renamed series
//! starts empty and the old name's history is dropped by the migration.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rrdpulse_core::error::{Result, RrdPulseError};
use rrdpulse_core::{Archive, CreateRequest, DataSource, MetricDescriptor, RoundRobinStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Persisted schema already matches.
    NoOp,
    /// No store at the path yet.
    Create,
    /// Store exists with a different set of sources.
    Migrate,
}

impl ReconcileAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ReconcileAction::NoOp => "noop",
            ReconcileAction::Create => "create",
            ReconcileAction::Migrate => "migrate",
        }
    }
}

pub struct SchemaReconciler {
    store: Arc<dyn RoundRobinStore>,
    step_seconds: u64,
    archives: Vec<Archive>,
}

impl SchemaReconciler {
    pub fn new(store: Arc<dyn RoundRobinStore>, step_seconds: u64, archives: Vec<Archive>) -> Self {
        Self {
            store,
            step_seconds: step_seconds.max(1),
            archives,
        }
    }

    /// Decide what to do without touching the store.
    pub async fn plan(&self, descriptors: &[MetricDescriptor], path: &Path) -> Result<ReconcileAction> {
        let unavailable = |source| RrdPulseError::StoreUnavailable {
            path: path.to_path_buf(),
            source,
        };

        if !self.store.exists(path).await.map_err(unavailable)? {
            return Ok(ReconcileAction::Create);
        }

        let persisted = self.store.read_schema(path).await.map_err(unavailable)?;
        let registered: BTreeSet<String> = descriptors.iter().map(|d| d.name().to_string()).collect();

        if persisted == registered {
            return Ok(ReconcileAction::NoOp);
        }

        let added: Vec<&String> = registered.difference(&persisted).collect();
        let removed: Vec<&String> = persisted.difference(&registered).collect();
        tracing::warn!(
            path = %path.display(),
            ?added,
            ?removed,
            "registered metrics differ from store schema; migrating"
        );
        Ok(ReconcileAction::Migrate)
    }

    /// Plan, then create or migrate the store as needed.
    pub async fn reconcile(
        &self,
        descriptors: &[MetricDescriptor],
        path: &Path,
        now: SystemTime,
    ) -> Result<ReconcileAction> {
        let action = self.plan(descriptors, path).await?;
        if action != ReconcileAction::NoOp {
            let req = self.create_request(action, descriptors, path, now);
            self.store
                .create(&req)
                .await
                .map_err(|source| RrdPulseError::StoreCreateFailed {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        tracing::info!(
            path = %path.display(),
            action = action.as_str(),
            sources = descriptors.len(),
            "store schema reconciled"
        );
        Ok(action)
    }

    /// Creation request for `action`. The start time is `now` truncated to a
    /// step boundary.
    pub fn create_request(
        &self,
        action: ReconcileAction,
        descriptors: &[MetricDescriptor],
        path: &Path,
        now: SystemTime,
    ) -> CreateRequest {
        let secs = now.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        CreateRequest {
            path: path.to_path_buf(),
            start: secs - secs % self.step_seconds,
            step_seconds: self.step_seconds,
            data_sources: descriptors.iter().map(DataSource::from).collect(),
            archives: self.archives.clone(),
            overwrite: true,
            source: match action {
                ReconcileAction::Migrate => Some(path.to_path_buf()),
                _ => None,
            },
        }
    }
}
