//! Directory listings, single and batched

use crate::common::fixtures::MemoryFixture;
use dfs_facade::fs::ClientOp;
use dfs_facade::{FacadeError, PreconditionError};

fn names(statuses: &[dfs_facade::fs::FileStatus]) -> Vec<&str> {
    statuses.iter().map(|s| s.name()).collect()
}

fn populate(fx: &MemoryFixture) {
    fx.memory.write_file("/logs/2024/app.log", b"a").unwrap();
    fx.memory.write_file("/logs/2024/db.log", b"bb").unwrap();
    fx.memory.write_file("/logs/2025/app.log", b"ccc").unwrap();
    fx.memory.write_file("/logs/README", b"").unwrap();
}

#[test]
fn test_list_status_of_directory_and_file() {
    let fx = MemoryFixture::new();
    populate(&fx);

    let listing = fx.facade.list_status("/logs").unwrap();
    assert_eq!(names(&listing), vec!["2024", "2025", "README"]);
    assert!(listing[0].is_dir);
    assert_eq!(listing[0].path, "/logs/2024");

    let single = fx.facade.list_status("/logs/2024/db.log").unwrap();
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].length, 2);
}

#[test]
fn test_relative_listing_uses_the_working_directory() {
    let fx = MemoryFixture::new();
    fx.memory.write_file("notes.txt", b"hi").unwrap();

    let listing = fx.facade.list_status(".").unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].path, "/user/dfs/notes.txt");
}

#[test]
fn test_batch_keeps_input_order_and_filters() {
    let fx = MemoryFixture::new();
    populate(&fx);

    let all = fx
        .facade
        .list_status_batch(&["/logs/2025", "/logs/2024"], None)
        .unwrap();
    assert_eq!(
        all.iter().map(|s| s.path.as_str()).collect::<Vec<_>>(),
        vec!["/logs/2025/app.log", "/logs/2024/app.log", "/logs/2024/db.log"]
    );

    let accept = |p: &str| p.ends_with("app.log");
    let apps = fx
        .facade
        .list_status_batch(&["/logs/2024", "/logs/2025"], Some(&accept))
        .unwrap();
    assert_eq!(apps.len(), 2);
    assert!(apps.iter().all(|s| s.name() == "app.log"));

    let single = fx
        .facade
        .list_status_filtered("/logs/2024", |p| p.contains("db"))
        .unwrap();
    assert_eq!(names(&single), vec!["db.log"]);
}

#[test]
fn test_batch_edge_cases() {
    let fx = MemoryFixture::new();
    populate(&fx);
    let empty: Vec<String> = Vec::new();

    let err = fx.facade.list_status_batch(&empty, None).unwrap_err();
    assert!(matches!(
        err,
        FacadeError::Precondition(PreconditionError::EmptyList { .. })
    ));
    assert_eq!(fx.calls(), 0);

    let reject = |_: &str| false;
    let none = fx
        .facade
        .list_status_batch(&["/logs", "/logs/2024"], Some(&reject))
        .unwrap();
    assert!(none.is_empty());

    let blank = fx.facade.list_status_batch(&["/logs", " "], None).unwrap_err();
    assert!(blank.is_precondition());
}

#[test]
fn test_batch_has_no_existence_check() {
    let fx = MemoryFixture::new();
    populate(&fx);
    fx.reset_calls();

    let err = fx
        .facade
        .list_status_batch(&["/logs", "/missing"], None)
        .unwrap_err();
    assert_eq!(err.op(), Some(ClientOp::ListStatusFiltered));

    let metrics = fx.counting.metrics();
    assert_eq!(metrics.calls(ClientOp::Exists), 0);
    assert_eq!(metrics.calls(ClientOp::ListStatusFiltered), 1);
    assert_eq!(metrics.listed_paths, 2);
}
