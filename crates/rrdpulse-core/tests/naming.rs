#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use rrdpulse_core::{normalize_base, normalize_ds_name, route_metric};

#[test]
fn root_maps_to_literal_token() {
    assert_eq!(route_metric("/"), "root");
}

#[test]
fn slashes_trimmed_and_joined() {
    assert_eq!(route_metric("/api/users/"), "api_users");
    assert_eq!(route_metric("api/users"), "api_users");
}

#[test]
fn spaces_become_underscores_and_punctuation_is_dropped() {
    assert_eq!(route_metric("/a b/c!d"), "a_b_cd");
    assert_eq!(route_metric("/api/users/:id"), "api_users_id");
    assert_eq!(route_metric("/files/{*rest}"), "files_rest");
}

#[test]
fn dash_and_underscore_survive() {
    assert_eq!(route_metric("/health-check/v_2"), "health-check_v");
}

#[test]
fn long_paths_truncate_to_fourteen() {
    let path = "/abcdefghij0123456789";
    assert_eq!(route_metric(path), "abcdefghij0123");
    assert_eq!(route_metric(path).len(), 14);
}

#[test]
fn non_ascii_is_stripped() {
    assert_eq!(route_metric("/café/ü"), "caf_");
}

#[test]
fn empty_result_falls_back() {
    assert_eq!(route_metric("/!!!/"), "unknown");
    assert_eq!(normalize_base(""), "unknown");
    assert_eq!(normalize_ds_name("%%%"), "unnamed");
}

#[test]
fn ds_names_cap_at_nineteen() {
    let name = normalize_ds_name("requests.per.second.total.all");
    assert_eq!(name, "requestspersecondto");
    assert_eq!(name.len(), 19);
}
