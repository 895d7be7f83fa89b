#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;

use rrdpulse_collector::MetricBuffer;
use rrdpulse_core::MetricKind;

#[test]
fn counters_start_at_zero_and_gauges_absent() {
    let b = MetricBuffer::new();
    b.register("hits", MetricKind::Absolute);
    b.register("total", MetricKind::Counter);
    b.register("rate", MetricKind::Derive);
    b.register("temp", MetricKind::Gauge);

    assert_eq!(b.get("hits"), Some(0.0));
    assert_eq!(b.get("total"), Some(0.0));
    assert_eq!(b.get("rate"), Some(0.0));
    assert_eq!(b.get("temp"), None);
}

#[test]
fn drain_resets_per_kind() {
    let b = MetricBuffer::new();
    b.register("hits", MetricKind::Absolute);
    b.register("temp", MetricKind::Gauge);

    assert!(b.record("hits", 3.0));
    assert!(b.set("temp", 21.5));

    let snap = b.drain_and_reset();
    assert_eq!(snap.get("hits"), Some(&3.0));
    assert_eq!(snap.get("temp"), Some(&21.5));

    assert_eq!(b.get("hits"), Some(0.0));
    assert_eq!(b.get("temp"), None);

    // an idle interval reports counters as zero and gauges not at all
    let idle = b.drain_and_reset();
    assert_eq!(idle.get("hits"), Some(&0.0));
    assert!(!idle.contains_key("temp"));
}

#[test]
fn set_overwrites_and_record_accumulates() {
    let b = MetricBuffer::new();
    b.register("temp", MetricKind::Gauge);
    b.register("hits", MetricKind::Absolute);

    b.set("temp", 1.0);
    b.set("temp", 2.0);
    b.record("hits", 1.0);
    b.record("hits", 2.5);

    assert_eq!(b.get("temp"), Some(2.0));
    assert_eq!(b.get("hits"), Some(3.5));
}

#[test]
fn unregistered_names_are_ignored() {
    let b = MetricBuffer::new();
    assert!(!b.record("ghost", 1.0));
    assert!(!b.set("ghost", 1.0));
    assert!(b.is_empty());
}

#[test]
fn concurrent_deltas_are_never_lost_across_drains() {
    let b = Arc::new(MetricBuffer::new());
    b.register("hits", MetricKind::Absolute);

    let writers: Vec<_> = (0..8)
        .map(|_| {
            let b = Arc::clone(&b);
            thread::spawn(move || {
                for _ in 0..1_000 {
                    b.record("hits", 1.0);
                }
            })
        })
        .collect();

    let mut drained = 0.0;
    for _ in 0..50 {
        drained += b.drain_and_reset().get("hits").copied().unwrap_or(0.0);
        thread::yield_now();
    }
    for w in writers {
        w.join().unwrap();
    }
    drained += b.drain_and_reset().get("hits").copied().unwrap_or(0.0);

    assert_eq!(drained, 8_000.0);
}
