//! Failure-injecting client decorator
//!
//! Wraps a client and makes selected calls fail with an I/O error before
//! they reach the inner client. Used to exercise the facade's failure
//! normalization without a misbehaving cluster.
//!
//! Calls that cannot fail (working directory, home directory, scheme,
//! default replication) always pass through.

use std::io;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use super::client::{ClientOp, DfsClient, PathFilter};
use super::types::{
    AclEntry, AclStatus, ContentSummary, FileChecksum, FileStatus, FsPermission, FsStatus,
    TimestampPair,
};

/// Policy for when failures should occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Never fail (passthrough)
    Never,
    /// Fail every fallible call
    Always,
    /// Fail only the listed calls
    OnOps(Vec<ClientOp>),
    /// Let N fallible calls through, then fail every one after
    AfterCalls(usize),
}

struct FailureState {
    policy: FailurePolicy,
    call_count: usize,
    injected: usize,
}

/// Wrapper around a client that can simulate failures
pub struct FailingClient {
    inner: Arc<dyn DfsClient>,
    state: Mutex<FailureState>,
}

impl FailingClient {
    /// Create a new failing client with the given policy
    pub fn new(inner: Arc<dyn DfsClient>, policy: FailurePolicy) -> Self {
        Self {
            inner,
            state: Mutex::new(FailureState {
                policy,
                call_count: 0,
                injected: 0,
            }),
        }
    }

    /// Replace the failure policy and reset the counters
    pub fn set_policy(&self, policy: FailurePolicy) {
        let mut state = self.state.lock();
        state.policy = policy;
        state.call_count = 0;
        state.injected = 0;
    }

    /// Number of fallible calls seen so far
    pub fn call_count(&self) -> usize {
        self.state.lock().call_count
    }

    /// Number of calls that were failed on purpose
    pub fn injected_failures(&self) -> usize {
        self.state.lock().injected
    }

    fn check(&self, op: ClientOp) -> io::Result<()> {
        let mut state = self.state.lock();
        let fail = match &state.policy {
            FailurePolicy::Never => false,
            FailurePolicy::Always => true,
            FailurePolicy::OnOps(ops) => ops.contains(&op),
            FailurePolicy::AfterCalls(n) => state.call_count >= *n,
        };
        state.call_count += 1;
        if fail {
            state.injected += 1;
            tracing::debug!(%op, "injecting client failure");
            return Err(io::Error::other(format!("injected failure: {op}")));
        }
        Ok(())
    }
}

impl DfsClient for FailingClient {
    fn exists(&self, path: &str) -> io::Result<bool> {
        self.check(ClientOp::Exists)?;
        self.inner.exists(path)
    }

    fn mkdirs(&self, path: &str, permission: FsPermission) -> io::Result<bool> {
        self.check(ClientOp::Mkdirs)?;
        self.inner.mkdirs(path, permission)
    }

    fn create_new_file(&self, path: &str) -> io::Result<bool> {
        self.check(ClientOp::CreateNewFile)?;
        self.inner.create_new_file(path)
    }

    fn delete(&self, path: &str, recursive: bool) -> io::Result<bool> {
        self.check(ClientOp::Delete)?;
        self.inner.delete(path, recursive)
    }

    fn delete_on_exit(&self, path: &str) -> io::Result<bool> {
        self.check(ClientOp::DeleteOnExit)?;
        self.inner.delete_on_exit(path)
    }

    fn cancel_delete_on_exit(&self, path: &str) -> io::Result<bool> {
        self.check(ClientOp::CancelDeleteOnExit)?;
        self.inner.cancel_delete_on_exit(path)
    }

    fn rename(&self, src: &str, dst: &str) -> io::Result<bool> {
        self.check(ClientOp::Rename)?;
        self.inner.rename(src, dst)
    }

    fn concat(&self, target: &str, sources: &[String]) -> io::Result<()> {
        self.check(ClientOp::Concat)?;
        self.inner.concat(target, sources)
    }

    fn copy_from_local(
        &self,
        delete_source: bool,
        overwrite: bool,
        src: &Path,
        dst: &str,
    ) -> io::Result<()> {
        self.check(ClientOp::CopyFromLocal)?;
        self.inner.copy_from_local(delete_source, overwrite, src, dst)
    }

    fn copy_to_local(
        &self,
        delete_source: bool,
        src: &str,
        dst: &Path,
        use_raw_local_fs: bool,
    ) -> io::Result<()> {
        self.check(ClientOp::CopyToLocal)?;
        self.inner
            .copy_to_local(delete_source, src, dst, use_raw_local_fs)
    }

    fn create_snapshot(&self, path: &str, name: Option<&str>) -> io::Result<String> {
        self.check(ClientOp::CreateSnapshot)?;
        self.inner.create_snapshot(path, name)
    }

    fn delete_snapshot(&self, path: &str, name: &str) -> io::Result<()> {
        self.check(ClientOp::DeleteSnapshot)?;
        self.inner.delete_snapshot(path, name)
    }

    fn rename_snapshot(&self, path: &str, old_name: &str, new_name: &str) -> io::Result<()> {
        self.check(ClientOp::RenameSnapshot)?;
        self.inner.rename_snapshot(path, old_name, new_name)
    }

    fn acl_status(&self, path: &str) -> io::Result<AclStatus> {
        self.check(ClientOp::GetAclStatus)?;
        self.inner.acl_status(path)
    }

    fn modify_acl_entries(&self, path: &str, spec: &[AclEntry]) -> io::Result<()> {
        self.check(ClientOp::ModifyAclEntries)?;
        self.inner.modify_acl_entries(path, spec)
    }

    fn remove_acl_entries(&self, path: &str, spec: &[AclEntry]) -> io::Result<()> {
        self.check(ClientOp::RemoveAclEntries)?;
        self.inner.remove_acl_entries(path, spec)
    }

    fn remove_default_acl(&self, path: &str) -> io::Result<()> {
        self.check(ClientOp::RemoveDefaultAcl)?;
        self.inner.remove_default_acl(path)
    }

    fn remove_acl(&self, path: &str) -> io::Result<()> {
        self.check(ClientOp::RemoveAcl)?;
        self.inner.remove_acl(path)
    }

    fn set_acl(&self, path: &str, spec: &[AclEntry]) -> io::Result<()> {
        self.check(ClientOp::SetAcl)?;
        self.inner.set_acl(path, spec)
    }

    fn set_owner(
        &self,
        path: &str,
        username: Option<&str>,
        group: Option<&str>,
    ) -> io::Result<()> {
        self.check(ClientOp::SetOwner)?;
        self.inner.set_owner(path, username, group)
    }

    fn set_permission(&self, path: &str, permission: FsPermission) -> io::Result<()> {
        self.check(ClientOp::SetPermission)?;
        self.inner.set_permission(path, permission)
    }

    fn set_replication(&self, path: &str, replication: u16) -> io::Result<bool> {
        self.check(ClientOp::SetReplication)?;
        self.inner.set_replication(path, replication)
    }

    fn set_times(&self, path: &str, times: TimestampPair) -> io::Result<()> {
        self.check(ClientOp::SetTimes)?;
        self.inner.set_times(path, times)
    }

    fn set_verify_checksum(&self, verify: bool) -> io::Result<()> {
        self.check(ClientOp::SetVerifyChecksum)?;
        self.inner.set_verify_checksum(verify)
    }

    fn set_write_checksum(&self, write: bool) -> io::Result<()> {
        self.check(ClientOp::SetWriteChecksum)?;
        self.inner.set_write_checksum(write)
    }

    fn content_summary(&self, path: &str) -> io::Result<ContentSummary> {
        self.check(ClientOp::GetContentSummary)?;
        self.inner.content_summary(path)
    }

    fn status(&self, path: Option<&str>) -> io::Result<FsStatus> {
        self.check(ClientOp::GetStatus)?;
        self.inner.status(path)
    }

    fn used(&self) -> io::Result<u64> {
        self.check(ClientOp::GetUsed)?;
        self.inner.used()
    }

    fn default_replication(&self, path: &str) -> u16 {
        self.inner.default_replication(path)
    }

    fn file_checksum(&self, path: &str) -> io::Result<Option<FileChecksum>> {
        self.check(ClientOp::GetFileChecksum)?;
        self.inner.file_checksum(path)
    }

    fn file_link_status(&self, path: &str) -> io::Result<FileStatus> {
        self.check(ClientOp::GetFileLinkStatus)?;
        self.inner.file_link_status(path)
    }

    fn list_xattrs(&self, path: &str) -> io::Result<Vec<String>> {
        self.check(ClientOp::ListXAttrs)?;
        self.inner.list_xattrs(path)
    }

    fn list_status(&self, path: &str) -> io::Result<Vec<FileStatus>> {
        self.check(ClientOp::ListStatus)?;
        self.inner.list_status(path)
    }

    fn list_status_filtered(
        &self,
        paths: &[String],
        filter: PathFilter<'_>,
    ) -> io::Result<Vec<FileStatus>> {
        self.check(ClientOp::ListStatusFiltered)?;
        self.inner.list_status_filtered(paths, filter)
    }

    fn working_directory(&self) -> String {
        self.inner.working_directory()
    }

    fn home_directory(&self) -> String {
        self.inner.home_directory()
    }

    fn scheme(&self) -> String {
        self.inner.scheme()
    }

    fn close(&self) -> io::Result<()> {
        self.check(ClientOp::Close)?;
        self.inner.close()
    }
}
