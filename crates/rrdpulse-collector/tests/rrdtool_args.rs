#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rrdpulse_collector::store::rrdtool::{create_args, parse_ds_names, update_args};
use rrdpulse_core::{default_archives, CreateRequest, DataSource, MetricKind, UpdateTime};

fn ds(name: &str, kind: MetricKind, max: Option<i64>) -> DataSource {
    DataSource {
        name: name.into(),
        kind,
        heartbeat_seconds: 900,
        min_value: 0,
        max_value: max,
    }
}

#[test]
fn create_with_source_and_unbounded_max() {
    let req = CreateRequest {
        path: PathBuf::from("m.rrd"),
        start: 1_700_000_040,
        step_seconds: 60,
        data_sources: vec![
            ds("home_cnt", MetricKind::Absolute, None),
            ds("home_lat", MetricKind::Gauge, Some(5000)),
        ],
        archives: default_archives(),
        overwrite: true,
        source: Some(PathBuf::from("m.rrd")),
    };

    let args = create_args(&req);
    assert_eq!(
        args,
        vec![
            "create",
            "m.rrd",
            "--start",
            "1700000040",
            "--step",
            "60",
            "--source",
            "m.rrd",
            "DS:home_cnt:ABSOLUTE:900:0:U",
            "DS:home_lat:GAUGE:900:0:5000",
            "RRA:AVERAGE:0.5:1m:90d",
            "RRA:AVERAGE:0.5:1h:18M",
            "RRA:AVERAGE:0.5:1d:10y",
        ]
    );
}

#[test]
fn create_without_overwrite() {
    let req = CreateRequest {
        path: PathBuf::from("m.rrd"),
        start: 0,
        step_seconds: 60,
        data_sources: vec![ds("a", MetricKind::Counter, None)],
        archives: vec![],
        overwrite: false,
        source: None,
    };
    let args = create_args(&req);
    assert!(args.contains(&"--no-overwrite".to_string()));
    assert!(!args.contains(&"--source".to_string()));
}

#[test]
fn update_uses_template_in_key_order() {
    let mut values = BTreeMap::new();
    values.insert("b_cnt".to_string(), 3.0);
    values.insert("a_lat".to_string(), 12.5);

    let args = update_args(Path::new("m.rrd"), UpdateTime::Now, &values);
    assert_eq!(args, vec!["update", "m.rrd", "--template", "a_lat:b_cnt", "N:12.5:3"]);

    let args = update_args(Path::new("m.rrd"), UpdateTime::At(1_700_000_000), &values);
    assert_eq!(args[4], "1700000000:12.5:3");
}

#[test]
fn info_output_yields_ds_names() {
    let info = r#"filename = "m.rrd"
rrd_version = "0003"
step = 60
ds[home_cnt].index = 0
ds[home_cnt].type = "ABSOLUTE"
ds[home_lat].index = 1
ds[home_lat].minimal_heartbeat = 900
rra[0].cf = "AVERAGE"
"#;
    let names: Vec<String> = parse_ds_names(info).into_iter().collect();
    assert_eq!(names, vec!["home_cnt", "home_lat"]);
}
