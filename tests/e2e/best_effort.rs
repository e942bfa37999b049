//! Mutations report client failures as `false` instead of raising them

use crate::common::fixtures::{FailingFixture, MemoryFixture};
use dfs_facade::fs::{
    AclEntry, AclEntryType, ClientOp, DfsClient, FailurePolicy, FsAction, FsPermission,
    TimestampPair,
};

#[test]
fn test_mkdirs_is_idempotent() {
    let fx = MemoryFixture::new();

    assert!(fx.facade.mkdirs("/warehouse/raw/2024").unwrap());
    assert!(fx.facade.mkdirs("/warehouse/raw/2024").unwrap());
    assert!(fx.facade.exist("/warehouse/raw").unwrap());
}

#[test]
fn test_mkdirs_with_permission_applies_umask() {
    let fx = MemoryFixture::new();

    assert!(fx
        .facade
        .mkdirs_with_permission("/secure", FsPermission::new(0o777))
        .unwrap());
    let status = fx.facade.file_link_status("/secure").unwrap();
    assert_eq!(status.permission.mode(), 0o755);
}

#[test]
fn test_create_new_file_twice() {
    let fx = MemoryFixture::new();

    assert!(fx.facade.create_new_file("/logs/app.log").unwrap());
    assert!(!fx.facade.create_new_file("/logs/app.log").unwrap());
    assert_eq!(fx.memory.read_file("/logs/app.log").unwrap(), Vec::<u8>::new());
}

#[test]
fn test_non_recursive_delete_of_full_directory_is_false() {
    let fx = MemoryFixture::new();
    fx.memory.write_file("/full/a.txt", b"a").unwrap();

    assert!(!fx.facade.delete("/full").unwrap());
    assert!(fx.facade.exist("/full/a.txt").unwrap());
    assert!(fx.facade.delete_with("/full", true).unwrap());
}

#[test]
fn test_plain_delete_removes_files_and_empty_directories() {
    let fx = MemoryFixture::new();
    fx.memory.write_file("/out/part-0", b"0").unwrap();
    fx.memory.mkdirs("/empty", FsPermission::dir_default()).unwrap();

    assert!(!fx.facade.delete("/out").unwrap());
    assert!(fx.facade.delete("/out/part-0").unwrap());
    assert!(fx.facade.delete("/out").unwrap());
    assert!(fx.facade.delete("/empty").unwrap());
    assert!(!fx.facade.exist("/out").unwrap());
    assert!(!fx.facade.exist("/empty").unwrap());
}

#[test]
fn test_rename_moves_subtree() {
    let fx = MemoryFixture::new();
    fx.memory.write_file("/staging/job/part-0", b"0").unwrap();
    fx.memory.mkdirs("/final", FsPermission::dir_default()).unwrap();

    assert!(fx.facade.rename("/staging/job", "/final").unwrap());
    assert_eq!(fx.memory.read_file("/final/job/part-0").unwrap(), b"0");
    assert!(!fx.facade.exist("/staging/job").unwrap());
}

#[test]
fn test_delete_on_exit_round_trip() {
    let fx = MemoryFixture::new();
    fx.memory.write_file("/tmp/scratch", b"x").unwrap();

    assert!(fx.facade.delete_on_exit("/tmp/scratch").unwrap());
    assert!(fx.facade.cancel_delete_on_exit("/tmp/scratch").unwrap());
    assert!(!fx.facade.cancel_delete_on_exit("/tmp/scratch").unwrap());

    assert!(fx.facade.delete_on_exit("/tmp/scratch").unwrap());
    fx.facade.close();
    assert!(!fx.memory.exists("/tmp/scratch").unwrap());
}

#[test]
fn test_attribute_updates() {
    let fx = MemoryFixture::new();
    fx.memory.write_file("/data/table.parquet", b"PAR1").unwrap();

    assert!(fx
        .facade
        .set_owner("/data/table.parquet", Some("etl"), Some("analytics"))
        .unwrap());
    assert!(fx
        .facade
        .set_permission("/data/table.parquet", FsPermission::new(0o640))
        .unwrap());
    assert!(fx
        .facade
        .set_times("/data/table.parquet", TimestampPair::new(1_000, 2_000))
        .unwrap());
    assert!(fx.facade.set_replication("/data/table.parquet", 2).unwrap());

    let status = fx.facade.file_link_status("/data/table.parquet").unwrap();
    assert_eq!(status.owner, "etl");
    assert_eq!(status.group, "analytics");
    assert_eq!(status.permission.mode(), 0o640);
    assert_eq!(status.modification_time, 1_000);
    assert_eq!(status.access_time, 2_000);
    assert_eq!(status.replication, 2);

    // Directories carry no replication factor
    assert!(!fx.facade.set_replication("/data", 2).unwrap());
}

#[test]
fn test_acl_lifecycle() {
    let fx = MemoryFixture::new();
    fx.memory.mkdirs("/shared", FsPermission::dir_default()).unwrap();
    let bob = AclEntry::access(AclEntryType::User, Some("bob"), FsAction::ReadExecute);
    let default_bob =
        AclEntry::default_scope(AclEntryType::User, Some("bob"), FsAction::ReadExecute);

    assert!(fx
        .facade
        .modify_acl_entries("/shared", &[bob.clone(), default_bob])
        .unwrap());
    assert_eq!(fx.facade.acl_status("/shared").unwrap().entries.len(), 2);

    assert!(fx.facade.remove_default_acl("/shared").unwrap());
    assert_eq!(fx.facade.acl_status("/shared").unwrap().entries, vec![bob.clone()]);

    assert!(fx.facade.remove_acl_entries("/shared", &[bob.clone()]).unwrap());
    assert!(fx.facade.acl_status("/shared").unwrap().entries.is_empty());

    assert!(fx.facade.set_acl("/shared", &[bob]).unwrap());
    assert!(fx.facade.remove_acl("/shared").unwrap());
    assert!(fx.facade.acl_status("/shared").unwrap().entries.is_empty());
}

#[test]
fn test_client_failures_downgrade_to_false() {
    let fx = FailingFixture::new(FailurePolicy::Never);
    fx.memory.write_file("/data/a", b"a").unwrap();
    fx.memory.write_file("/data/b", b"b").unwrap();
    let scratch = tempfile::TempDir::new().unwrap();
    let local = scratch.path().join("up.txt");
    std::fs::write(&local, b"up").unwrap();

    // Existence checks pass; only the mutating call fails
    fx.failing.set_policy(FailurePolicy::OnOps(vec![
        ClientOp::Mkdirs,
        ClientOp::CreateNewFile,
        ClientOp::Delete,
        ClientOp::Rename,
        ClientOp::Concat,
        ClientOp::CopyFromLocal,
        ClientOp::SetPermission,
        ClientOp::SetVerifyChecksum,
    ]));

    assert!(!fx.facade.mkdirs("/new").unwrap());
    assert!(!fx.facade.create_new_file("/data/c").unwrap());
    assert!(!fx.facade.delete("/data/a").unwrap());
    assert!(!fx.facade.rename("/data/a", "/data/z").unwrap());
    assert!(!fx.facade.concat(&["/data/b"], "/data/a").unwrap());
    assert!(!fx.facade.upload(&local, "/data/up.txt").unwrap());
    assert!(!fx
        .facade
        .set_permission("/data/a", FsPermission::new(0o600))
        .unwrap());
    assert!(!fx.facade.set_verify_checksum(false));
    assert!(fx.facade.set_write_checksum(false));

    assert_eq!(fx.failing.injected_failures(), 8);
    assert_eq!(fx.memory.read_file("/data/a").unwrap(), b"a");
}

#[test]
fn test_failing_existence_check_reads_as_missing() {
    let fx = FailingFixture::new(FailurePolicy::Never);
    fx.memory.write_file("/data/a", b"a").unwrap();
    fx.failing.set_policy(FailurePolicy::OnOps(vec![ClientOp::Exists]));

    assert!(!fx.facade.exist("/data/a").unwrap());
    assert!(fx.facade.delete("/data/a").unwrap_err().to_string().contains("/data/a"));
    assert!(fx.memory.exists("/data/a").unwrap());
}

#[test]
fn test_queries_survive_a_broken_client() {
    let fx = FailingFixture::new(FailurePolicy::Always);

    assert_eq!(fx.facade.used(), u64::MAX);
    assert_eq!(fx.facade.scheme(), "mem");
    assert_eq!(fx.facade.home_directory(), "/user/dfs");
    assert_eq!(fx.facade.working_directory(), "/user/dfs");
    assert_eq!(fx.facade.default_replication("/any").unwrap(), 3);
}
