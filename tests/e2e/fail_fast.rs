//! Status queries raise client failures with the call and cause attached

use std::io;

use crate::common::fixtures::{FailingFixture, MemoryFixture};
use dfs_facade::fs::{ClientOp, FailurePolicy};
use dfs_facade::FacadeError;

#[test]
fn test_content_summary_counts_the_tree() {
    let fx = MemoryFixture::new();
    fx.memory.write_file("/proj/src/main.rs", b"fn main() {}").unwrap();
    fx.memory.write_file("/proj/README", b"hello").unwrap();

    let summary = fx.facade.content_summary("/proj").unwrap();
    assert_eq!(summary.file_count, 2);
    assert_eq!(summary.directory_count, 2);
    assert_eq!(summary.length, 17);
    assert_eq!(summary.space_consumed, 17 * 3);
}

#[test]
fn test_missing_path_surfaces_the_client_cause() {
    let fx = MemoryFixture::new();

    let err = fx.facade.content_summary("/ghost").unwrap_err();
    assert!(!err.is_precondition());
    assert_eq!(err.op(), Some(ClientOp::GetContentSummary));
    assert_eq!(err.cause().map(io::Error::kind), Some(io::ErrorKind::NotFound));

    let err = fx.facade.file_link_status("/ghost").unwrap_err();
    assert_eq!(err.op(), Some(ClientOp::GetFileLinkStatus));
}

#[test]
fn test_file_checksum() {
    let fx = MemoryFixture::new();
    fx.memory.write_file("/sums/a", b"same").unwrap();
    fx.memory.write_file("/sums/b", b"same").unwrap();

    let a = fx.facade.file_checksum("/sums/a").unwrap().unwrap();
    let b = fx.facade.file_checksum("/sums/b").unwrap().unwrap();
    assert_eq!(a, b);
    assert_eq!(a.bytes.len(), 32);

    let err = fx.facade.file_checksum("/sums").unwrap_err();
    assert_eq!(err.op(), Some(ClientOp::GetFileChecksum));
}

#[test]
fn test_status_and_usage() {
    let fx = MemoryFixture::new();
    fx.memory.write_file("/a", &[0u8; 100]).unwrap();

    let status = fx.facade.status(None).unwrap();
    assert!(status.capacity > 0);
    assert_eq!(status.capacity, status.used + status.remaining);
    assert_eq!(fx.facade.used(), 100);
    assert_eq!(fx.facade.status(Some("/a")).unwrap(), status);
}

#[test]
fn test_symlink_status_is_not_followed() {
    let fx = MemoryFixture::new();
    fx.memory.write_file("/real/file", b"data").unwrap();
    fx.memory.create_symlink("/real/file", "/link").unwrap();

    let status = fx.facade.file_link_status("/link").unwrap();
    assert!(status.is_symlink());
    assert_eq!(status.symlink.as_deref(), Some("/real/file"));
}

#[test]
fn test_list_xattrs() {
    let fx = MemoryFixture::new();
    fx.memory.write_file("/x", b"").unwrap();
    fx.memory.set_xattr("/x", "user.origin", b"import").unwrap();
    fx.memory.set_xattr("/x", "user.batch", b"7").unwrap();

    assert_eq!(
        fx.facade.list_xattrs("/x").unwrap(),
        vec!["user.batch".to_string(), "user.origin".to_string()]
    );
}

#[test]
fn test_injected_failure_is_wrapped() {
    let fx = FailingFixture::new(FailurePolicy::OnOps(vec![ClientOp::ListStatus]));
    fx.memory.write_file("/dir/a", b"a").unwrap();

    match fx.facade.list_status("/dir").unwrap_err() {
        FacadeError::Operation { op, path, source } => {
            assert_eq!(op, ClientOp::ListStatus);
            assert_eq!(path, "/dir");
            assert!(source.to_string().contains("injected failure"));
        }
        other => panic!("expected an operation error, got {other:?}"),
    }
}
