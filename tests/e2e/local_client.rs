//! The facade over a local directory tree

use crate::common::fixtures::LocalFixture;
use dfs_facade::fs::{ClientOp, FsPermission};

#[test]
fn test_namespace_operations() {
    let fx = LocalFixture::new();

    assert!(fx.facade.mkdirs("/a/b").unwrap());
    assert!(fx.facade.mkdirs("/a/b").unwrap());
    assert!(fx.backing("/a/b").is_dir());

    assert!(fx.facade.create_new_file("/a/b/f.txt").unwrap());
    assert!(!fx.facade.create_new_file("/a/b/f.txt").unwrap());

    assert!(fx.facade.rename("/a/b/f.txt", "/a/g.txt").unwrap());
    assert!(fx.backing("/a/g.txt").is_file());

    assert!(!fx.facade.delete("/a").unwrap());
    assert!(fx.facade.delete_with("/a", true).unwrap());
    assert!(!fx.backing("/a").exists());
}

#[test]
fn test_transfers() {
    let fx = LocalFixture::new();
    let src = fx.scratch_file("in.txt", b"local data");

    assert!(fx.facade.upload(&src, "/inbox/in.txt").unwrap());
    assert!(src.exists());
    assert_eq!(std::fs::read(fx.backing("/inbox/in.txt")).unwrap(), b"local data");

    let out = fx.scratch.path().join("out.txt");
    fx.facade.download("/inbox/in.txt", &out).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), b"local data");
    assert!(fx.scratch.path().join(".out.txt.crc").exists());
}

#[test]
fn test_listing_and_summary() {
    let fx = LocalFixture::new();
    crate::common::fixtures::write_local(&fx.backing("/d/b.txt"), b"bb");
    crate::common::fixtures::write_local(&fx.backing("/d/a.txt"), b"a");

    let listing = fx.facade.list_status("/d").unwrap();
    assert_eq!(
        listing.iter().map(|s| s.path.as_str()).collect::<Vec<_>>(),
        vec!["/d/a.txt", "/d/b.txt"]
    );
    assert_eq!(listing[0].replication, 1);

    let summary = fx.facade.content_summary("/d").unwrap();
    assert_eq!(summary.file_count, 2);
    assert_eq!(summary.length, 3);
}

#[cfg(unix)]
#[test]
fn test_permissions() {
    let fx = LocalFixture::new();
    fx.facade.create_new_file("/p").unwrap();

    assert!(fx.facade.set_permission("/p", FsPermission::new(0o600)).unwrap());
    assert_eq!(fx.facade.file_link_status("/p").unwrap().permission.mode(), 0o600);
}

#[test]
fn test_unsupported_features_degrade() {
    let fx = LocalFixture::new();
    fx.facade.mkdirs("/snap").unwrap();

    assert!(!fx.facade.set_owner("/snap", Some("root"), None).unwrap());
    assert!(!fx.facade.remove_acl("/snap").unwrap());

    let err = fx.facade.create_snapshot("/snap", None).unwrap_err();
    assert_eq!(err.op(), Some(ClientOp::CreateSnapshot));
    assert_eq!(
        err.cause().map(std::io::Error::kind),
        Some(std::io::ErrorKind::Unsupported)
    );
}

#[test]
fn test_paths_cannot_escape_the_root() {
    let fx = LocalFixture::new();

    assert!(!fx.facade.exist("/../../etc/passwd").unwrap());
    assert!(!fx.facade.mkdirs("../outside").unwrap());
}
