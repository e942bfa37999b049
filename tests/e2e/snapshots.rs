//! Directory snapshots through the facade

use crate::common::fixtures::MemoryFixture;
use dfs_facade::fs::ClientOp;

#[test]
fn test_create_and_delete_snapshot() {
    let fx = MemoryFixture::new();
    fx.memory.write_file("/db/table/part-0", b"v1").unwrap();

    let path = fx.facade.create_snapshot("/db", Some("nightly")).unwrap();
    assert_eq!(path, "/db/.snapshot/nightly");

    fx.memory.write_file("/db/table/part-0", b"v2").unwrap();
    assert_eq!(
        fx.memory.read_file("/db/.snapshot/nightly/table/part-0").unwrap(),
        b"v1"
    );
    assert!(fx.facade.exist("/db/.snapshot/nightly/table").unwrap());

    assert!(fx.facade.delete_snapshot("/db", "nightly").unwrap());
    assert!(fx.memory.snapshot_names("/db").unwrap().is_empty());
    assert!(!fx.facade.delete_snapshot("/db", "nightly").unwrap());
}

#[test]
fn test_default_snapshot_name_is_timestamped() {
    let fx = MemoryFixture::new();
    fx.facade.mkdirs("/db").unwrap();

    let path = fx.facade.create_snapshot("/db", None).unwrap();
    let name = path.rsplit('/').next().unwrap();
    assert!(path.starts_with("/db/.snapshot/s"));
    assert_eq!(fx.memory.snapshot_names("/db").unwrap(), vec![name.to_string()]);
}

#[test]
fn test_snapshot_errors() {
    let fx = MemoryFixture::new();
    fx.memory.write_file("/db/file", b"x").unwrap();
    fx.facade.create_snapshot("/db", Some("a")).unwrap();

    let err = fx.facade.create_snapshot("/db", Some("a")).unwrap_err();
    assert_eq!(err.op(), Some(ClientOp::CreateSnapshot));
    assert_eq!(
        err.cause().map(std::io::Error::kind),
        Some(std::io::ErrorKind::AlreadyExists)
    );

    assert!(fx.facade.create_snapshot("/db/file", None).is_err());
    assert!(fx.facade.create_snapshot("/missing", None).is_err());

    // Snapshot contents are read-only
    assert!(!fx.facade.mkdirs("/db/.snapshot/a/new").unwrap());

    // Directories holding snapshots cannot be removed
    assert!(!fx.facade.delete_with("/db", true).unwrap());
}

#[test]
fn test_rename_snapshot() {
    let fx = MemoryFixture::new();
    fx.facade.mkdirs("/db").unwrap();
    fx.facade.create_snapshot("/db", Some("old")).unwrap();
    fx.facade.create_snapshot("/db", Some("taken")).unwrap();

    assert!(fx.facade.rename_snapshot("/db", "old", "new").unwrap());
    assert_eq!(
        fx.memory.snapshot_names("/db").unwrap(),
        vec!["new".to_string(), "taken".to_string()]
    );
    assert!(!fx.facade.rename_snapshot("/db", "new", "taken").unwrap());
    assert!(!fx.facade.rename_snapshot("/db", "ghost", "other").unwrap());
}
