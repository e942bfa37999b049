//! Client collaborator abstraction
//!
//! `DfsClient` is the seam between the facade and a remote filesystem. The
//! facade never constructs or closes a client itself; it receives one shared
//! `Arc<dyn DfsClient>` from whoever owns the connection lifecycle.
//!
//! Implementations shipped with this crate:
//! - `NoopClient`: rejects every call, used as a placeholder
//! - `MemoryClient`: complete in-memory namespace
//! - `LocalClient`: local directory tree exposed under the `file` scheme
//! - `CountingClient` / `FailingClient`: decorators for tests and diagnostics
//!
//! The trait is synchronous. Thread-safety of concurrent calls is the
//! implementation's responsibility.

use std::fmt;
use std::io;
use std::path::Path;

use super::types::{
    AclEntry, AclStatus, ContentSummary, FileChecksum, FileStatus, FsPermission, FsStatus,
    TimestampPair,
};

/// Predicate over candidate child paths used by filtered listings
pub type PathFilter<'a> = &'a dyn Fn(&str) -> bool;

// ============================================================================
// Operation tags
// ============================================================================

/// Identifies one client call; carried by errors, log records and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClientOp {
    Exists,
    Mkdirs,
    CopyFromLocal,
    CopyToLocal,
    Concat,
    CreateNewFile,
    Delete,
    DeleteOnExit,
    CancelDeleteOnExit,
    Rename,
    CreateSnapshot,
    DeleteSnapshot,
    RenameSnapshot,
    GetAclStatus,
    ModifyAclEntries,
    RemoveAclEntries,
    RemoveDefaultAcl,
    RemoveAcl,
    SetAcl,
    SetOwner,
    SetPermission,
    SetReplication,
    SetTimes,
    SetVerifyChecksum,
    SetWriteChecksum,
    GetContentSummary,
    GetStatus,
    GetUsed,
    GetDefaultReplication,
    GetFileChecksum,
    GetFileLinkStatus,
    ListXAttrs,
    ListStatus,
    ListStatusFiltered,
    GetWorkingDirectory,
    GetHomeDirectory,
    GetScheme,
    Close,
}

impl ClientOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientOp::Exists => "exists",
            ClientOp::Mkdirs => "mkdirs",
            ClientOp::CopyFromLocal => "copy_from_local",
            ClientOp::CopyToLocal => "copy_to_local",
            ClientOp::Concat => "concat",
            ClientOp::CreateNewFile => "create_new_file",
            ClientOp::Delete => "delete",
            ClientOp::DeleteOnExit => "delete_on_exit",
            ClientOp::CancelDeleteOnExit => "cancel_delete_on_exit",
            ClientOp::Rename => "rename",
            ClientOp::CreateSnapshot => "create_snapshot",
            ClientOp::DeleteSnapshot => "delete_snapshot",
            ClientOp::RenameSnapshot => "rename_snapshot",
            ClientOp::GetAclStatus => "get_acl_status",
            ClientOp::ModifyAclEntries => "modify_acl_entries",
            ClientOp::RemoveAclEntries => "remove_acl_entries",
            ClientOp::RemoveDefaultAcl => "remove_default_acl",
            ClientOp::RemoveAcl => "remove_acl",
            ClientOp::SetAcl => "set_acl",
            ClientOp::SetOwner => "set_owner",
            ClientOp::SetPermission => "set_permission",
            ClientOp::SetReplication => "set_replication",
            ClientOp::SetTimes => "set_times",
            ClientOp::SetVerifyChecksum => "set_verify_checksum",
            ClientOp::SetWriteChecksum => "set_write_checksum",
            ClientOp::GetContentSummary => "get_content_summary",
            ClientOp::GetStatus => "get_status",
            ClientOp::GetUsed => "get_used",
            ClientOp::GetDefaultReplication => "get_default_replication",
            ClientOp::GetFileChecksum => "get_file_checksum",
            ClientOp::GetFileLinkStatus => "get_file_link_status",
            ClientOp::ListXAttrs => "list_xattrs",
            ClientOp::ListStatus => "list_status",
            ClientOp::ListStatusFiltered => "list_status_filtered",
            ClientOp::GetWorkingDirectory => "get_working_directory",
            ClientOp::GetHomeDirectory => "get_home_directory",
            ClientOp::GetScheme => "get_scheme",
            ClientOp::Close => "close",
        }
    }
}

impl fmt::Display for ClientOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// DfsClient Trait
// ============================================================================

/// Operation set of a remote filesystem client
///
/// Remote paths are opaque strings; their interpretation (absolute vs.
/// relative, scheme prefixes) belongs to the implementation. Local paths
/// (the other end of a copy) are `std::path::Path`.
pub trait DfsClient: Send + Sync {
    // ========================================================================
    // Namespace
    // ========================================================================

    fn exists(&self, path: &str) -> io::Result<bool>;

    /// Create a directory and any missing parents
    ///
    /// Returns true when the directory exists afterwards, including when it
    /// already existed.
    fn mkdirs(&self, path: &str, permission: FsPermission) -> io::Result<bool>;

    /// Create a zero-length file; false when something already exists there
    fn create_new_file(&self, path: &str) -> io::Result<bool>;

    fn delete(&self, path: &str, recursive: bool) -> io::Result<bool>;

    /// Mark a path for deletion when the client is closed
    fn delete_on_exit(&self, path: &str) -> io::Result<bool>;

    /// Undo `delete_on_exit`; false when the path was not marked
    fn cancel_delete_on_exit(&self, path: &str) -> io::Result<bool>;

    fn rename(&self, src: &str, dst: &str) -> io::Result<bool>;

    /// Move the content of `sources` onto the end of `target`, in order
    fn concat(&self, target: &str, sources: &[String]) -> io::Result<()>;

    // ========================================================================
    // Transfers
    // ========================================================================

    fn copy_from_local(
        &self,
        delete_source: bool,
        overwrite: bool,
        src: &Path,
        dst: &str,
    ) -> io::Result<()>;

    fn copy_to_local(
        &self,
        delete_source: bool,
        src: &str,
        dst: &Path,
        use_raw_local_fs: bool,
    ) -> io::Result<()>;

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Create a snapshot of a directory; `None` lets the client choose a name.
    /// Returns the snapshot's path.
    fn create_snapshot(&self, path: &str, name: Option<&str>) -> io::Result<String>;

    fn delete_snapshot(&self, path: &str, name: &str) -> io::Result<()>;

    fn rename_snapshot(&self, path: &str, old_name: &str, new_name: &str) -> io::Result<()>;

    // ========================================================================
    // ACLs
    // ========================================================================

    fn acl_status(&self, path: &str) -> io::Result<AclStatus>;

    fn modify_acl_entries(&self, path: &str, spec: &[AclEntry]) -> io::Result<()>;

    fn remove_acl_entries(&self, path: &str, spec: &[AclEntry]) -> io::Result<()>;

    fn remove_default_acl(&self, path: &str) -> io::Result<()>;

    fn remove_acl(&self, path: &str) -> io::Result<()>;

    /// Replace every extended entry
    fn set_acl(&self, path: &str, spec: &[AclEntry]) -> io::Result<()>;

    // ========================================================================
    // Attributes
    // ========================================================================

    /// `None` leaves that side of the ownership unchanged
    fn set_owner(&self, path: &str, username: Option<&str>, group: Option<&str>)
        -> io::Result<()>;

    fn set_permission(&self, path: &str, permission: FsPermission) -> io::Result<()>;

    fn set_replication(&self, path: &str, replication: u16) -> io::Result<bool>;

    fn set_times(&self, path: &str, times: TimestampPair) -> io::Result<()>;

    fn set_verify_checksum(&self, verify: bool) -> io::Result<()>;

    fn set_write_checksum(&self, write: bool) -> io::Result<()>;

    // ========================================================================
    // Queries
    // ========================================================================

    fn content_summary(&self, path: &str) -> io::Result<ContentSummary>;

    /// Capacity and usage; `None` asks about the whole filesystem
    fn status(&self, path: Option<&str>) -> io::Result<FsStatus>;

    /// Total size of all files
    fn used(&self) -> io::Result<u64>;

    fn default_replication(&self, path: &str) -> u16;

    /// `Ok(None)` when the client keeps no checksum for the path
    fn file_checksum(&self, path: &str) -> io::Result<Option<FileChecksum>>;

    /// Status without following a final symlink
    fn file_link_status(&self, path: &str) -> io::Result<FileStatus>;

    fn list_xattrs(&self, path: &str) -> io::Result<Vec<String>>;

    /// Children of a directory, or the file's own status
    fn list_status(&self, path: &str) -> io::Result<Vec<FileStatus>>;

    /// Children of every path in `paths`, keeping those accepted by `filter`
    fn list_status_filtered(
        &self,
        paths: &[String],
        filter: PathFilter<'_>,
    ) -> io::Result<Vec<FileStatus>>;

    fn working_directory(&self) -> String;

    fn home_directory(&self) -> String;

    fn scheme(&self) -> String;

    // ========================================================================
    // Lifecycle
    // ========================================================================

    fn close(&self) -> io::Result<()>;
}

// ============================================================================
// NoopClient Implementation
// ============================================================================

/// Client that fails every call with `ErrorKind::Unsupported`
///
/// Used as a placeholder before a real connection is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopClient;

impl NoopClient {
    fn unsupported<T>() -> io::Result<T> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Filesystem client not available",
        ))
    }
}

impl DfsClient for NoopClient {
    fn exists(&self, _path: &str) -> io::Result<bool> {
        Self::unsupported()
    }

    fn mkdirs(&self, _path: &str, _permission: FsPermission) -> io::Result<bool> {
        Self::unsupported()
    }

    fn create_new_file(&self, _path: &str) -> io::Result<bool> {
        Self::unsupported()
    }

    fn delete(&self, _path: &str, _recursive: bool) -> io::Result<bool> {
        Self::unsupported()
    }

    fn delete_on_exit(&self, _path: &str) -> io::Result<bool> {
        Self::unsupported()
    }

    fn cancel_delete_on_exit(&self, _path: &str) -> io::Result<bool> {
        Self::unsupported()
    }

    fn rename(&self, _src: &str, _dst: &str) -> io::Result<bool> {
        Self::unsupported()
    }

    fn concat(&self, _target: &str, _sources: &[String]) -> io::Result<()> {
        Self::unsupported()
    }

    fn copy_from_local(
        &self,
        _delete_source: bool,
        _overwrite: bool,
        _src: &Path,
        _dst: &str,
    ) -> io::Result<()> {
        Self::unsupported()
    }

    fn copy_to_local(
        &self,
        _delete_source: bool,
        _src: &str,
        _dst: &Path,
        _use_raw_local_fs: bool,
    ) -> io::Result<()> {
        Self::unsupported()
    }

    fn create_snapshot(&self, _path: &str, _name: Option<&str>) -> io::Result<String> {
        Self::unsupported()
    }

    fn delete_snapshot(&self, _path: &str, _name: &str) -> io::Result<()> {
        Self::unsupported()
    }

    fn rename_snapshot(&self, _path: &str, _old_name: &str, _new_name: &str) -> io::Result<()> {
        Self::unsupported()
    }

    fn acl_status(&self, _path: &str) -> io::Result<AclStatus> {
        Self::unsupported()
    }

    fn modify_acl_entries(&self, _path: &str, _spec: &[AclEntry]) -> io::Result<()> {
        Self::unsupported()
    }

    fn remove_acl_entries(&self, _path: &str, _spec: &[AclEntry]) -> io::Result<()> {
        Self::unsupported()
    }

    fn remove_default_acl(&self, _path: &str) -> io::Result<()> {
        Self::unsupported()
    }

    fn remove_acl(&self, _path: &str) -> io::Result<()> {
        Self::unsupported()
    }

    fn set_acl(&self, _path: &str, _spec: &[AclEntry]) -> io::Result<()> {
        Self::unsupported()
    }

    fn set_owner(
        &self,
        _path: &str,
        _username: Option<&str>,
        _group: Option<&str>,
    ) -> io::Result<()> {
        Self::unsupported()
    }

    fn set_permission(&self, _path: &str, _permission: FsPermission) -> io::Result<()> {
        Self::unsupported()
    }

    fn set_replication(&self, _path: &str, _replication: u16) -> io::Result<bool> {
        Self::unsupported()
    }

    fn set_times(&self, _path: &str, _times: TimestampPair) -> io::Result<()> {
        Self::unsupported()
    }

    fn set_verify_checksum(&self, _verify: bool) -> io::Result<()> {
        Self::unsupported()
    }

    fn set_write_checksum(&self, _write: bool) -> io::Result<()> {
        Self::unsupported()
    }

    fn content_summary(&self, _path: &str) -> io::Result<ContentSummary> {
        Self::unsupported()
    }

    fn status(&self, _path: Option<&str>) -> io::Result<FsStatus> {
        Self::unsupported()
    }

    fn used(&self) -> io::Result<u64> {
        Self::unsupported()
    }

    fn default_replication(&self, _path: &str) -> u16 {
        0
    }

    fn file_checksum(&self, _path: &str) -> io::Result<Option<FileChecksum>> {
        Self::unsupported()
    }

    fn file_link_status(&self, _path: &str) -> io::Result<FileStatus> {
        Self::unsupported()
    }

    fn list_xattrs(&self, _path: &str) -> io::Result<Vec<String>> {
        Self::unsupported()
    }

    fn list_status(&self, _path: &str) -> io::Result<Vec<FileStatus>> {
        Self::unsupported()
    }

    fn list_status_filtered(
        &self,
        _paths: &[String],
        _filter: PathFilter<'_>,
    ) -> io::Result<Vec<FileStatus>> {
        Self::unsupported()
    }

    fn working_directory(&self) -> String {
        "/".to_string()
    }

    fn home_directory(&self) -> String {
        "/".to_string()
    }

    fn scheme(&self) -> String {
        "noop".to_string()
    }

    fn close(&self) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
