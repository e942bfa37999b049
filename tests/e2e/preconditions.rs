//! Argument and existence checks stop an operation before the client does
//! any real work

use crate::common::fixtures::MemoryFixture;
use dfs_facade::fs::{AclEntry, AclEntryType, ClientOp, FsAction, FsPermission, TimestampPair};
use dfs_facade::{FacadeError, PreconditionError};

fn not_found(op: ClientOp, path: &str) -> PreconditionError {
    PreconditionError::PathNotFound {
        op,
        path: path.to_string(),
    }
}

/// Run the best-effort operation tagged `op` against `path`
fn run_best_effort(
    fx: &MemoryFixture,
    op: ClientOp,
    path: &str,
) -> Result<bool, PreconditionError> {
    let entry = AclEntry::access(AclEntryType::User, Some("bob"), FsAction::Read);
    let facade = &fx.facade;
    match op {
        ClientOp::Delete => facade.delete_with(path, true),
        ClientOp::CancelDeleteOnExit => facade.cancel_delete_on_exit(path),
        ClientOp::Rename => facade.rename(path, "/x"),
        ClientOp::RenameSnapshot => facade.rename_snapshot(path, "a", "b"),
        ClientOp::ModifyAclEntries => facade.modify_acl_entries(path, &[entry]),
        ClientOp::RemoveAclEntries => facade.remove_acl_entries(path, &[entry]),
        ClientOp::RemoveDefaultAcl => facade.remove_default_acl(path),
        ClientOp::RemoveAcl => facade.remove_acl(path),
        ClientOp::SetAcl => facade.set_acl(path, &[entry]),
        ClientOp::SetOwner => facade.set_owner(path, Some("bob"), None),
        ClientOp::SetPermission => facade.set_permission(path, FsPermission::new(0o700)),
        ClientOp::SetReplication => facade.set_replication(path, 2),
        ClientOp::SetTimes => facade.set_times(path, TimestampPair::modification_only(0)),
        other => panic!("{other} has no existence check"),
    }
}

#[test]
fn test_missing_path_stops_after_the_existence_check() {
    let fx = MemoryFixture::new();
    let missing = "/data/missing";

    for op in [
        ClientOp::Delete,
        ClientOp::CancelDeleteOnExit,
        ClientOp::Rename,
        ClientOp::RenameSnapshot,
        ClientOp::ModifyAclEntries,
        ClientOp::RemoveAclEntries,
        ClientOp::RemoveDefaultAcl,
        ClientOp::RemoveAcl,
        ClientOp::SetAcl,
        ClientOp::SetOwner,
        ClientOp::SetPermission,
        ClientOp::SetReplication,
        ClientOp::SetTimes,
    ] {
        fx.reset_calls();
        assert_eq!(
            run_best_effort(&fx, op, missing).unwrap_err(),
            not_found(op, missing),
            "{op}"
        );
        let metrics = fx.counting.metrics();
        assert_eq!(metrics.calls(ClientOp::Exists), 1, "{op}");
        assert_eq!(metrics.total_calls(), 1, "{op}");
    }
}

#[test]
fn test_fail_fast_missing_path_is_a_precondition_error() {
    let fx = MemoryFixture::new();
    let scratch = tempfile::TempDir::new().unwrap();

    let err = fx
        .facade
        .download("/nowhere/file.txt", scratch.path().join("file.txt"))
        .unwrap_err();
    assert!(err.is_precondition());
    assert!(matches!(
        err,
        FacadeError::Precondition(PreconditionError::PathNotFound {
            op: ClientOp::CopyToLocal,
            ..
        })
    ));

    fx.reset_calls();
    let err = fx.facade.list_status("/nowhere").unwrap_err();
    assert!(err.is_precondition());
    assert_eq!(fx.calls(), 1);

    fx.reset_calls();
    let err = fx.facade.list_xattrs("/nowhere").unwrap_err();
    assert!(err.is_precondition());
    assert_eq!(err.op(), Some(ClientOp::ListXAttrs));
    assert!(err.cause().is_none());
    assert_eq!(fx.counting.metrics().calls(ClientOp::ListXAttrs), 0);
}

#[test]
fn test_blank_arguments_never_reach_the_client() {
    let fx = MemoryFixture::new();

    assert_eq!(
        fx.facade.mkdirs("").unwrap_err(),
        PreconditionError::BlankArgument { what: "directory" }
    );
    assert_eq!(
        fx.facade.rename("/a", "   ").unwrap_err(),
        PreconditionError::BlankArgument {
            what: "destination path"
        }
    );
    assert_eq!(
        fx.facade.delete_snapshot("/a", "").unwrap_err(),
        PreconditionError::BlankArgument {
            what: "snapshot name"
        }
    );
    assert!(fx.facade.create_snapshot("/a", Some(" ")).unwrap_err().is_precondition());
    assert!(fx.facade.content_summary("\t").unwrap_err().is_precondition());
    assert!(fx.facade.status(Some("")).unwrap_err().is_precondition());
    assert!(fx.facade.default_replication("").is_err());

    assert_eq!(fx.calls(), 0);
}

#[test]
fn test_delete_needs_an_existing_path() {
    let fx = MemoryFixture::new();

    assert_eq!(
        fx.facade.delete("/tmp/gone").unwrap_err(),
        not_found(ClientOp::Delete, "/tmp/gone")
    );

    assert!(fx.facade.mkdirs("/tmp/empty").unwrap());
    assert!(fx.facade.delete_with("/tmp/empty", true).unwrap());
    assert!(!fx.facade.exist("/tmp/empty").unwrap());
}

#[test]
fn test_missing_local_source_is_rejected() {
    let fx = MemoryFixture::new();
    let scratch = tempfile::TempDir::new().unwrap();
    let missing = scratch.path().join("not-there.csv");

    let err = fx.facade.upload(&missing, "/data/in.csv").unwrap_err();
    assert_eq!(
        err,
        PreconditionError::LocalSourceNotFound {
            op: ClientOp::CopyFromLocal,
            path: missing,
        }
    );
    assert_eq!(fx.calls(), 0);
}
