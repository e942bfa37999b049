//! Path-oriented facade over a remote filesystem client
//!
//! `FilesystemFacade` is the single entry point callers use. Every operation
//! validates its arguments, checks existence where the operation cannot
//! succeed otherwise, delegates to exactly one client call and normalizes the
//! outcome according to its category:
//!
//! - queries swallow client failures and return a safe default
//! - best-effort mutations log client failures and return `false`
//! - fail-fast operations log client failures and return
//!   [`FacadeError::Operation`] with the original cause attached
//!
//! Argument and existence checks raise [`PreconditionError`] in every
//! category, before the client is asked to do the real work.

mod options;

pub use options::{DownloadOptions, UploadOptions};

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::error::{FacadeError, FacadeResult, PreconditionError};
use crate::fs::{
    AclEntry, AclStatus, ClientOp, ContentSummary, DfsClient, FileChecksum, FileStatus,
    FsPermission, FsStatus, PathFilter, TimestampPair,
};

/// Result of a best-effort operation: `Ok(false)` reports a client failure
/// that was logged and swallowed
pub type BestEffort = Result<bool, PreconditionError>;

/// Facade over one shared filesystem client handle
///
/// The handle is owned by the lifecycle manager that created it; the facade
/// only closes it when [`FilesystemFacade::close`] is called explicitly.
pub struct FilesystemFacade {
    client: Arc<dyn DfsClient>,
}

impl fmt::Debug for FilesystemFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilesystemFacade")
            .field("client", &"<dyn DfsClient>")
            .finish()
    }
}

impl Clone for FilesystemFacade {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

// ============================================================================
// Validation and normalization helpers
// ============================================================================

fn require_non_blank(value: &str, what: &'static str) -> Result<(), PreconditionError> {
    if value.trim().is_empty() {
        warn!(what, "rejected blank argument");
        return Err(PreconditionError::BlankArgument { what });
    }
    Ok(())
}

fn require_paths<S: AsRef<str>>(
    paths: &[S],
    what: &'static str,
) -> Result<Vec<String>, PreconditionError> {
    if paths.is_empty() {
        warn!(what, "rejected empty list");
        return Err(PreconditionError::EmptyList { what });
    }
    paths
        .iter()
        .map(|p| {
            let p = p.as_ref();
            require_non_blank(p, what).map(|()| p.to_string())
        })
        .collect()
}

/// Downgrade a client failure to `false`, keeping the cause in the log
fn downgrade(op: ClientOp, path: &str, result: io::Result<bool>) -> bool {
    match result {
        Ok(done) => done,
        Err(e) => {
            error!(%op, path, error = %e, kind = ?e.kind(), "client call failed, reporting false");
            false
        }
    }
}

fn downgrade_unit(op: ClientOp, path: &str, result: io::Result<()>) -> bool {
    downgrade(op, path, result.map(|()| true))
}

/// Wrap a client failure into an operation error
fn wrap<T>(op: ClientOp, path: &str, result: io::Result<T>) -> FacadeResult<T> {
    result.map_err(|e| {
        error!(%op, path, error = %e, kind = ?e.kind(), "client call failed");
        FacadeError::operation(op, path, e)
    })
}

impl FilesystemFacade {
    /// Create a facade over an already connected client
    pub fn new(client: Arc<dyn DfsClient>) -> Self {
        Self { client }
    }

    /// Get the underlying client
    pub fn client(&self) -> &Arc<dyn DfsClient> {
        &self.client
    }

    /// Fail with `PathNotFound` unless `path` exists
    fn require_exists(&self, op: ClientOp, path: &str) -> Result<(), PreconditionError> {
        if self.exist(path)? {
            return Ok(());
        }
        warn!(%op, path, "precondition failed: path does not exist");
        Err(PreconditionError::PathNotFound {
            op,
            path: path.to_string(),
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Check whether a file or directory exists; client failures read as false
    pub fn exist(&self, path: &str) -> BestEffort {
        require_non_blank(path, "path")?;
        Ok(downgrade(ClientOp::Exists, path, self.client.exists(path)))
    }

    pub fn home_directory(&self) -> String {
        self.client.home_directory()
    }

    pub fn scheme(&self) -> String {
        self.client.scheme()
    }

    pub fn working_directory(&self) -> String {
        self.client.working_directory()
    }

    /// Total size of all files; `u64::MAX` when the client cannot tell
    pub fn used(&self) -> u64 {
        match self.client.used() {
            Ok(used) => used,
            Err(e) => {
                error!(op = %ClientOp::GetUsed, error = %e, "client call failed, reporting u64::MAX");
                u64::MAX
            }
        }
    }

    pub fn default_replication(&self, path: &str) -> Result<u16, PreconditionError> {
        require_non_blank(path, "path")?;
        Ok(self.client.default_replication(path))
    }

    // ========================================================================
    // Namespace mutations (best-effort)
    // ========================================================================

    /// Create a directory and its parents with the default directory permission
    pub fn mkdirs(&self, path: &str) -> BestEffort {
        self.mkdirs_with_permission(path, FsPermission::dir_default())
    }

    pub fn mkdirs_with_permission(&self, path: &str, permission: FsPermission) -> BestEffort {
        require_non_blank(path, "directory")?;
        debug!(path, %permission, "mkdirs");
        Ok(downgrade(
            ClientOp::Mkdirs,
            path,
            self.client.mkdirs(path, permission),
        ))
    }

    /// Create an empty file; false if it already exists or creation failed
    pub fn create_new_file(&self, path: &str) -> BestEffort {
        require_non_blank(path, "path")?;
        Ok(downgrade(
            ClientOp::CreateNewFile,
            path,
            self.client.create_new_file(path),
        ))
    }

    /// Delete a file or empty directory
    pub fn delete(&self, path: &str) -> BestEffort {
        self.delete_with(path, false)
    }

    /// Delete a file or directory; directories with children need `recursive`
    pub fn delete_with(&self, path: &str, recursive: bool) -> BestEffort {
        require_non_blank(path, "path")?;
        self.require_exists(ClientOp::Delete, path)?;
        Ok(downgrade(
            ClientOp::Delete,
            path,
            self.client.delete(path, recursive),
        ))
    }

    /// Mark a path for deletion when the client handle is closed
    pub fn delete_on_exit(&self, path: &str) -> BestEffort {
        require_non_blank(path, "path")?;
        Ok(downgrade(
            ClientOp::DeleteOnExit,
            path,
            self.client.delete_on_exit(path),
        ))
    }

    pub fn cancel_delete_on_exit(&self, path: &str) -> BestEffort {
        require_non_blank(path, "path")?;
        self.require_exists(ClientOp::CancelDeleteOnExit, path)?;
        Ok(downgrade(
            ClientOp::CancelDeleteOnExit,
            path,
            self.client.cancel_delete_on_exit(path),
        ))
    }

    pub fn rename(&self, src: &str, dst: &str) -> BestEffort {
        require_non_blank(src, "source path")?;
        require_non_blank(dst, "destination path")?;
        self.require_exists(ClientOp::Rename, src)?;
        Ok(downgrade(ClientOp::Rename, src, self.client.rename(src, dst)))
    }

    /// Merge `sources` onto the end of `target`, in the order given
    pub fn concat<S: AsRef<str>>(&self, sources: &[S], target: &str) -> BestEffort {
        let sources = require_paths(sources, "source paths")?;
        require_non_blank(target, "target path")?;
        debug!(target, count = sources.len(), "concat");
        Ok(downgrade_unit(
            ClientOp::Concat,
            target,
            self.client.concat(target, &sources),
        ))
    }

    // ========================================================================
    // Transfers
    // ========================================================================

    /// Upload with the default options (keep the source, overwrite the target)
    pub fn upload(&self, src: impl AsRef<Path>, target: &str) -> BestEffort {
        self.upload_with(src, target, UploadOptions::default())
    }

    pub fn upload_with(
        &self,
        src: impl AsRef<Path>,
        target: &str,
        options: UploadOptions,
    ) -> BestEffort {
        let src = src.as_ref();
        require_non_blank(target, "target path")?;
        if !src.exists() {
            warn!(src = %src.display(), "precondition failed: local source does not exist");
            return Err(PreconditionError::LocalSourceNotFound {
                op: ClientOp::CopyFromLocal,
                path: src.to_path_buf(),
            });
        }
        debug!(src = %src.display(), target, ?options, "upload");
        Ok(downgrade_unit(
            ClientOp::CopyFromLocal,
            target,
            self.client
                .copy_from_local(options.delete_source, options.overwrite, src, target),
        ))
    }

    /// Download with the default options (keep the source, checksummed local writes)
    pub fn download(&self, src: &str, target: impl AsRef<Path>) -> FacadeResult<()> {
        self.download_with(src, target, DownloadOptions::default())
    }

    pub fn download_with(
        &self,
        src: &str,
        target: impl AsRef<Path>,
        options: DownloadOptions,
    ) -> FacadeResult<()> {
        let target = target.as_ref();
        require_non_blank(src, "source path")?;
        require_non_blank(&target.to_string_lossy(), "target path")?;
        self.require_exists(ClientOp::CopyToLocal, src)?;
        debug!(src, target = %target.display(), ?options, "download");
        wrap(
            ClientOp::CopyToLocal,
            src,
            self.client.copy_to_local(
                options.delete_source,
                src,
                target,
                options.use_raw_local_fs,
            ),
        )
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Snapshot a directory; `None` lets the client pick a timestamped name.
    /// Returns the snapshot's path.
    pub fn create_snapshot(&self, path: &str, name: Option<&str>) -> FacadeResult<String> {
        require_non_blank(path, "path")?;
        if let Some(name) = name {
            require_non_blank(name, "snapshot name")?;
        }
        wrap(
            ClientOp::CreateSnapshot,
            path,
            self.client.create_snapshot(path, name),
        )
    }

    pub fn delete_snapshot(&self, path: &str, name: &str) -> BestEffort {
        require_non_blank(path, "path")?;
        require_non_blank(name, "snapshot name")?;
        Ok(downgrade_unit(
            ClientOp::DeleteSnapshot,
            path,
            self.client.delete_snapshot(path, name),
        ))
    }

    pub fn rename_snapshot(&self, path: &str, old_name: &str, new_name: &str) -> BestEffort {
        require_non_blank(path, "path")?;
        require_non_blank(old_name, "snapshot name")?;
        require_non_blank(new_name, "snapshot name")?;
        self.require_exists(ClientOp::RenameSnapshot, path)?;
        Ok(downgrade_unit(
            ClientOp::RenameSnapshot,
            path,
            self.client.rename_snapshot(path, old_name, new_name),
        ))
    }

    // ========================================================================
    // ACLs
    // ========================================================================

    pub fn acl_status(&self, path: &str) -> FacadeResult<AclStatus> {
        require_non_blank(path, "path")?;
        wrap(ClientOp::GetAclStatus, path, self.client.acl_status(path))
    }

    pub fn modify_acl_entries(&self, path: &str, spec: &[AclEntry]) -> BestEffort {
        require_non_blank(path, "path")?;
        self.require_exists(ClientOp::ModifyAclEntries, path)?;
        Ok(downgrade_unit(
            ClientOp::ModifyAclEntries,
            path,
            self.client.modify_acl_entries(path, spec),
        ))
    }

    pub fn remove_acl_entries(&self, path: &str, spec: &[AclEntry]) -> BestEffort {
        require_non_blank(path, "path")?;
        self.require_exists(ClientOp::RemoveAclEntries, path)?;
        Ok(downgrade_unit(
            ClientOp::RemoveAclEntries,
            path,
            self.client.remove_acl_entries(path, spec),
        ))
    }

    pub fn remove_default_acl(&self, path: &str) -> BestEffort {
        require_non_blank(path, "path")?;
        self.require_exists(ClientOp::RemoveDefaultAcl, path)?;
        Ok(downgrade_unit(
            ClientOp::RemoveDefaultAcl,
            path,
            self.client.remove_default_acl(path),
        ))
    }

    /// Drop every extended ACL entry, keeping the base permission bits
    pub fn remove_acl(&self, path: &str) -> BestEffort {
        require_non_blank(path, "path")?;
        self.require_exists(ClientOp::RemoveAcl, path)?;
        Ok(downgrade_unit(
            ClientOp::RemoveAcl,
            path,
            self.client.remove_acl(path),
        ))
    }

    /// Replace all extended ACL entries with `spec`
    pub fn set_acl(&self, path: &str, spec: &[AclEntry]) -> BestEffort {
        require_non_blank(path, "path")?;
        self.require_exists(ClientOp::SetAcl, path)?;
        Ok(downgrade_unit(
            ClientOp::SetAcl,
            path,
            self.client.set_acl(path, spec),
        ))
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    pub fn set_owner(&self, path: &str, username: Option<&str>, group: Option<&str>) -> BestEffort {
        require_non_blank(path, "path")?;
        self.require_exists(ClientOp::SetOwner, path)?;
        Ok(downgrade_unit(
            ClientOp::SetOwner,
            path,
            self.client.set_owner(path, username, group),
        ))
    }

    pub fn set_permission(&self, path: &str, permission: FsPermission) -> BestEffort {
        require_non_blank(path, "path")?;
        self.require_exists(ClientOp::SetPermission, path)?;
        Ok(downgrade_unit(
            ClientOp::SetPermission,
            path,
            self.client.set_permission(path, permission),
        ))
    }

    pub fn set_replication(&self, path: &str, replication: u16) -> BestEffort {
        require_non_blank(path, "path")?;
        self.require_exists(ClientOp::SetReplication, path)?;
        Ok(downgrade(
            ClientOp::SetReplication,
            path,
            self.client.set_replication(path, replication),
        ))
    }

    pub fn set_times(&self, path: &str, times: TimestampPair) -> BestEffort {
        require_non_blank(path, "path")?;
        self.require_exists(ClientOp::SetTimes, path)?;
        Ok(downgrade_unit(
            ClientOp::SetTimes,
            path,
            self.client.set_times(path, times),
        ))
    }

    pub fn set_verify_checksum(&self, verify: bool) -> bool {
        downgrade_unit(
            ClientOp::SetVerifyChecksum,
            "",
            self.client.set_verify_checksum(verify),
        )
    }

    pub fn set_write_checksum(&self, write: bool) -> bool {
        downgrade_unit(
            ClientOp::SetWriteChecksum,
            "",
            self.client.set_write_checksum(write),
        )
    }

    // ========================================================================
    // Status queries (fail-fast)
    // ========================================================================

    pub fn content_summary(&self, path: &str) -> FacadeResult<ContentSummary> {
        require_non_blank(path, "path")?;
        wrap(
            ClientOp::GetContentSummary,
            path,
            self.client.content_summary(path),
        )
    }

    /// `Ok(None)` when the client keeps no checksum for the file
    pub fn file_checksum(&self, path: &str) -> FacadeResult<Option<FileChecksum>> {
        require_non_blank(path, "path")?;
        wrap(
            ClientOp::GetFileChecksum,
            path,
            self.client.file_checksum(path),
        )
    }

    /// Capacity and usage; `None` covers the whole filesystem
    pub fn status(&self, path: Option<&str>) -> FacadeResult<FsStatus> {
        if let Some(path) = path {
            require_non_blank(path, "path")?;
        }
        wrap(
            ClientOp::GetStatus,
            path.unwrap_or("/"),
            self.client.status(path),
        )
    }

    pub fn file_link_status(&self, path: &str) -> FacadeResult<FileStatus> {
        require_non_blank(path, "path")?;
        wrap(
            ClientOp::GetFileLinkStatus,
            path,
            self.client.file_link_status(path),
        )
    }

    pub fn list_xattrs(&self, path: &str) -> FacadeResult<Vec<String>> {
        require_non_blank(path, "path")?;
        self.require_exists(ClientOp::ListXAttrs, path)?;
        wrap(ClientOp::ListXAttrs, path, self.client.list_xattrs(path))
    }

    // ========================================================================
    // Listings (fail-fast)
    // ========================================================================

    /// Children of an existing directory (or the status of an existing file)
    pub fn list_status(&self, directory: &str) -> FacadeResult<Vec<FileStatus>> {
        require_non_blank(directory, "directory")?;
        self.require_exists(ClientOp::ListStatus, directory)?;
        wrap(
            ClientOp::ListStatus,
            directory,
            self.client.list_status(directory),
        )
    }

    /// Children of every path in `paths`, in order, kept when `filter`
    /// accepts their path. `None` accepts everything.
    pub fn list_status_batch<S: AsRef<str>>(
        &self,
        paths: &[S],
        filter: Option<PathFilter<'_>>,
    ) -> FacadeResult<Vec<FileStatus>> {
        let paths = require_paths(paths, "path list")?;
        let accept_all = |_: &str| true;
        let filter: PathFilter<'_> = match filter {
            Some(filter) => filter,
            None => &accept_all,
        };
        wrap(
            ClientOp::ListStatusFiltered,
            &paths.join(","),
            self.client.list_status_filtered(&paths, filter),
        )
    }

    /// Filtered listing of a single path; same as a one-element batch
    pub fn list_status_filtered(
        &self,
        path: &str,
        filter: impl Fn(&str) -> bool,
    ) -> FacadeResult<Vec<FileStatus>> {
        let filter: PathFilter<'_> = &filter;
        self.list_status_batch(&[path], Some(filter))
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Close the client handle; failures are logged, never raised
    ///
    /// Called once by the lifecycle owner at shutdown. No operation may be
    /// issued afterwards.
    pub fn close(&self) {
        if let Err(e) = self.client.close() {
            error!(op = %ClientOp::Close, error = %e, "failed to close filesystem client");
        }
    }
}
