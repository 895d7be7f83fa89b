#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use rrdpulse_core::{
    default_archives, DataSource, ErrorCode, HttpMetricSet, MetricDescriptor, MetricKind,
    MetricOptions, RrdPulseError, StoreError,
};

#[test]
fn option_defaults() {
    let o = MetricOptions::default();
    assert_eq!(o.heartbeat_seconds, 900);
    assert_eq!(o.min_value, 0);
    assert_eq!(o.max_value, None);
}

#[test]
fn options_from_yaml_fill_defaults() {
    let o: MetricOptions = serde_yaml::from_str("max_value: 100").unwrap();
    assert_eq!(o.heartbeat_seconds, 900);
    assert_eq!(o.max_value, Some(100));

    let bad = serde_yaml::from_str::<MetricOptions>("heartbeet: 10");
    assert!(bad.is_err());
}

#[test]
fn descriptor_normalizes_name() {
    let d = MetricDescriptor::new("queue depth!", MetricKind::Gauge, MetricOptions::default());
    assert_eq!(d.name(), "queuedepth");
    assert_eq!(d.kind(), MetricKind::Gauge);
}

#[test]
fn http_set_suffixes_fit_identifier_limit() {
    let set = HttpMetricSet::new("abcdefghijklmnopqrstuvwxyz");
    assert_eq!(set.base, "abcdefghijklmn");
    assert_eq!(set.cnt, "abcdefghijklmn_cnt");
    assert_eq!(set.mlat, "abcdefghijklmn_mlat");

    let descriptors = set.descriptors(MetricOptions::default());
    let kinds: Vec<MetricKind> = descriptors.iter().map(|d| d.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            MetricKind::Absolute,
            MetricKind::Absolute,
            MetricKind::Absolute,
            MetricKind::Gauge,
            MetricKind::Gauge
        ]
    );
    assert!(descriptors.iter().all(|d| d.name().len() <= 19));
    assert_eq!(descriptors[1].name(), "abcdefghijklmn_cerr");
}

#[test]
fn data_source_carries_bounds() {
    let opts = MetricOptions {
        heartbeat_seconds: 120,
        min_value: -5,
        max_value: Some(10),
    };
    let ds = DataSource::from(&MetricDescriptor::new("temp", MetricKind::Gauge, opts));
    assert_eq!(ds.heartbeat_seconds, 120);
    assert_eq!(ds.min_value, -5);
    assert_eq!(ds.max_value, Some(10));
}

#[test]
fn fixed_archive_defaults() {
    let a = default_archives();
    assert_eq!(a.len(), 3);
    assert_eq!((a[0].resolution.as_str(), a[0].retention.as_str()), ("1m", "90d"));
    assert_eq!((a[1].resolution.as_str(), a[1].retention.as_str()), ("1h", "18M"));
    assert_eq!((a[2].resolution.as_str(), a[2].retention.as_str()), ("1d", "10y"));
    assert!(a.iter().all(|x| x.xff == 0.5 && x.consolidation.as_str() == "AVERAGE"));
}

#[test]
fn only_flush_errors_are_non_fatal() {
    let flush = RrdPulseError::FlushFailed(StoreError::Rejected("x".into()));
    assert!(!flush.is_fatal());
    let last = flush.into_shutdown();
    assert_eq!(last.code(), ErrorCode::ShutdownFlushFailed);
    assert!(!last.is_fatal());

    let unavailable = RrdPulseError::StoreUnavailable {
        path: "m.rrd".into(),
        source: StoreError::Corrupt("bad".into()),
    };
    assert!(unavailable.is_fatal());
    assert_eq!(unavailable.code().as_str(), "STORE_UNAVAILABLE");
}
