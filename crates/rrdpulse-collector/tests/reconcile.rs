#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use rrdpulse_collector::store::MemoryStore;
use rrdpulse_collector::{ReconcileAction, SchemaReconciler};
use rrdpulse_core::{default_archives, ErrorCode, MetricDescriptor, MetricKind, MetricOptions};

fn descriptors(names: &[&str]) -> Vec<MetricDescriptor> {
    names
        .iter()
        .map(|n| MetricDescriptor::new(n, MetricKind::Absolute, MetricOptions::default()))
        .collect()
}

fn reconciler(store: Arc<MemoryStore>) -> SchemaReconciler {
    SchemaReconciler::new(store, 60, default_archives())
}

#[tokio::test]
async fn matching_schema_is_noop() {
    let store = Arc::new(MemoryStore::new().with_schema("m.rrd", ["b", "a"]));
    let r = reconciler(Arc::clone(&store));

    let action = r
        .reconcile(&descriptors(&["a", "b"]), Path::new("m.rrd"), UNIX_EPOCH)
        .await
        .unwrap();

    assert_eq!(action, ReconcileAction::NoOp);
    assert_eq!(store.create_calls(), 0);
}

#[tokio::test]
async fn differing_schema_migrates_from_existing_file() {
    let store = Arc::new(MemoryStore::new().with_schema("m.rrd", ["a", "c"]));
    let r = reconciler(Arc::clone(&store));

    let action = r
        .reconcile(&descriptors(&["a", "b"]), Path::new("m.rrd"), UNIX_EPOCH)
        .await
        .unwrap();

    assert_eq!(action, ReconcileAction::Migrate);
    let file = store.file(Path::new("m.rrd")).unwrap();
    assert_eq!(file.migrated_from.as_deref(), Some(Path::new("m.rrd")));
    assert_eq!(file.names().into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[tokio::test]
async fn missing_store_is_created_with_all_sources() {
    let store = Arc::new(MemoryStore::new());
    let r = reconciler(Arc::clone(&store));
    let now = UNIX_EPOCH + Duration::from_secs(43_217);

    let action = r
        .reconcile(&descriptors(&["a", "b"]), Path::new("new.rrd"), now)
        .await
        .unwrap();

    assert_eq!(action, ReconcileAction::Create);
    let file = store.file(Path::new("new.rrd")).unwrap();
    assert_eq!(file.migrated_from, None);
    assert_eq!(file.step_seconds, 60);
    assert_eq!(file.start, 43_200);
    assert_eq!(file.data_sources.len(), 2);
}

#[tokio::test]
async fn plan_does_not_touch_store() {
    let store = Arc::new(MemoryStore::new());
    let r = reconciler(Arc::clone(&store));

    let action = r.plan(&descriptors(&["a"]), Path::new("x.rrd")).await.unwrap();

    assert_eq!(action, ReconcileAction::Create);
    assert_eq!(store.create_calls(), 0);
}

#[tokio::test]
async fn unreadable_store_is_fatal() {
    let store = Arc::new(MemoryStore::new().with_corrupt("m.rrd"));
    let r = reconciler(Arc::clone(&store));

    let err = r
        .reconcile(&descriptors(&["a"]), Path::new("m.rrd"), UNIX_EPOCH)
        .await
        .expect_err("must fail");

    assert_eq!(err.code(), ErrorCode::StoreUnavailable);
    assert!(err.is_fatal());
    assert_eq!(store.create_calls(), 0);
}

#[test]
fn create_request_shape() {
    let r = reconciler(Arc::new(MemoryStore::new()));
    let req = r.create_request(
        ReconcileAction::Create,
        &descriptors(&["a"]),
        Path::new("m.rrd"),
        UNIX_EPOCH + Duration::from_secs(125),
    );
    assert_eq!(req.start, 120);
    assert!(req.overwrite);
    assert!(req.source.is_none());
    assert_eq!(req.archives.len(), 3);
}
