//! Call-counting client decorator
//!
//! Wraps any `DfsClient` and records how many times each client call was
//! made. Used by tests to prove that validation failures never reach the
//! client, and by the CLI's `--stats` output.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use super::client::{ClientOp, DfsClient, PathFilter};
use super::types::{
    AclEntry, AclStatus, ContentSummary, FileChecksum, FileStatus, FsPermission, FsStatus,
    TimestampPair,
};

/// Per-call counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMetrics {
    calls: BTreeMap<ClientOp, usize>,
    /// Number of individual paths handed to filtered listings
    pub listed_paths: usize,
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all metrics to zero
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Number of calls made for `op`
    pub fn calls(&self, op: ClientOp) -> usize {
        self.calls.get(&op).copied().unwrap_or(0)
    }

    /// Total number of client calls
    pub fn total_calls(&self) -> usize {
        self.calls.values().sum()
    }

    /// Calls made so far, in `ClientOp` order
    pub fn iter(&self) -> impl Iterator<Item = (ClientOp, usize)> + '_ {
        self.calls.iter().map(|(op, count)| (*op, *count))
    }

    fn record(&mut self, op: ClientOp) {
        *self.calls.entry(op).or_insert(0) += 1;
    }
}

/// Counting wrapper around another client
pub struct CountingClient {
    inner: Arc<dyn DfsClient>,
    metrics: Arc<Mutex<ClientMetrics>>,
}

impl CountingClient {
    pub fn new(inner: Arc<dyn DfsClient>) -> Self {
        Self {
            inner,
            metrics: Arc::new(Mutex::new(ClientMetrics::new())),
        }
    }

    /// Get a snapshot of current metrics
    pub fn metrics(&self) -> ClientMetrics {
        self.metrics.lock().clone()
    }

    pub fn reset_metrics(&self) {
        self.metrics.lock().reset();
    }

    /// Get a clone of the metrics Arc for sharing
    pub fn metrics_arc(&self) -> Arc<Mutex<ClientMetrics>> {
        Arc::clone(&self.metrics)
    }

    fn count(&self, op: ClientOp) {
        self.metrics.lock().record(op);
    }
}

impl DfsClient for CountingClient {
    fn exists(&self, path: &str) -> io::Result<bool> {
        self.count(ClientOp::Exists);
        self.inner.exists(path)
    }

    fn mkdirs(&self, path: &str, permission: FsPermission) -> io::Result<bool> {
        self.count(ClientOp::Mkdirs);
        self.inner.mkdirs(path, permission)
    }

    fn create_new_file(&self, path: &str) -> io::Result<bool> {
        self.count(ClientOp::CreateNewFile);
        self.inner.create_new_file(path)
    }

    fn delete(&self, path: &str, recursive: bool) -> io::Result<bool> {
        self.count(ClientOp::Delete);
        self.inner.delete(path, recursive)
    }

    fn delete_on_exit(&self, path: &str) -> io::Result<bool> {
        self.count(ClientOp::DeleteOnExit);
        self.inner.delete_on_exit(path)
    }

    fn cancel_delete_on_exit(&self, path: &str) -> io::Result<bool> {
        self.count(ClientOp::CancelDeleteOnExit);
        self.inner.cancel_delete_on_exit(path)
    }

    fn rename(&self, src: &str, dst: &str) -> io::Result<bool> {
        self.count(ClientOp::Rename);
        self.inner.rename(src, dst)
    }

    fn concat(&self, target: &str, sources: &[String]) -> io::Result<()> {
        self.count(ClientOp::Concat);
        self.inner.concat(target, sources)
    }

    fn copy_from_local(
        &self,
        delete_source: bool,
        overwrite: bool,
        src: &Path,
        dst: &str,
    ) -> io::Result<()> {
        self.count(ClientOp::CopyFromLocal);
        self.inner.copy_from_local(delete_source, overwrite, src, dst)
    }

    fn copy_to_local(
        &self,
        delete_source: bool,
        src: &str,
        dst: &Path,
        use_raw_local_fs: bool,
    ) -> io::Result<()> {
        self.count(ClientOp::CopyToLocal);
        self.inner
            .copy_to_local(delete_source, src, dst, use_raw_local_fs)
    }

    fn create_snapshot(&self, path: &str, name: Option<&str>) -> io::Result<String> {
        self.count(ClientOp::CreateSnapshot);
        self.inner.create_snapshot(path, name)
    }

    fn delete_snapshot(&self, path: &str, name: &str) -> io::Result<()> {
        self.count(ClientOp::DeleteSnapshot);
        self.inner.delete_snapshot(path, name)
    }

    fn rename_snapshot(&self, path: &str, old_name: &str, new_name: &str) -> io::Result<()> {
        self.count(ClientOp::RenameSnapshot);
        self.inner.rename_snapshot(path, old_name, new_name)
    }

    fn acl_status(&self, path: &str) -> io::Result<AclStatus> {
        self.count(ClientOp::GetAclStatus);
        self.inner.acl_status(path)
    }

    fn modify_acl_entries(&self, path: &str, spec: &[AclEntry]) -> io::Result<()> {
        self.count(ClientOp::ModifyAclEntries);
        self.inner.modify_acl_entries(path, spec)
    }

    fn remove_acl_entries(&self, path: &str, spec: &[AclEntry]) -> io::Result<()> {
        self.count(ClientOp::RemoveAclEntries);
        self.inner.remove_acl_entries(path, spec)
    }

    fn remove_default_acl(&self, path: &str) -> io::Result<()> {
        self.count(ClientOp::RemoveDefaultAcl);
        self.inner.remove_default_acl(path)
    }

    fn remove_acl(&self, path: &str) -> io::Result<()> {
        self.count(ClientOp::RemoveAcl);
        self.inner.remove_acl(path)
    }

    fn set_acl(&self, path: &str, spec: &[AclEntry]) -> io::Result<()> {
        self.count(ClientOp::SetAcl);
        self.inner.set_acl(path, spec)
    }

    fn set_owner(
        &self,
        path: &str,
        username: Option<&str>,
        group: Option<&str>,
    ) -> io::Result<()> {
        self.count(ClientOp::SetOwner);
        self.inner.set_owner(path, username, group)
    }

    fn set_permission(&self, path: &str, permission: FsPermission) -> io::Result<()> {
        self.count(ClientOp::SetPermission);
        self.inner.set_permission(path, permission)
    }

    fn set_replication(&self, path: &str, replication: u16) -> io::Result<bool> {
        self.count(ClientOp::SetReplication);
        self.inner.set_replication(path, replication)
    }

    fn set_times(&self, path: &str, times: TimestampPair) -> io::Result<()> {
        self.count(ClientOp::SetTimes);
        self.inner.set_times(path, times)
    }

    fn set_verify_checksum(&self, verify: bool) -> io::Result<()> {
        self.count(ClientOp::SetVerifyChecksum);
        self.inner.set_verify_checksum(verify)
    }

    fn set_write_checksum(&self, write: bool) -> io::Result<()> {
        self.count(ClientOp::SetWriteChecksum);
        self.inner.set_write_checksum(write)
    }

    fn content_summary(&self, path: &str) -> io::Result<ContentSummary> {
        self.count(ClientOp::GetContentSummary);
        self.inner.content_summary(path)
    }

    fn status(&self, path: Option<&str>) -> io::Result<FsStatus> {
        self.count(ClientOp::GetStatus);
        self.inner.status(path)
    }

    fn used(&self) -> io::Result<u64> {
        self.count(ClientOp::GetUsed);
        self.inner.used()
    }

    fn default_replication(&self, path: &str) -> u16 {
        self.count(ClientOp::GetDefaultReplication);
        self.inner.default_replication(path)
    }

    fn file_checksum(&self, path: &str) -> io::Result<Option<FileChecksum>> {
        self.count(ClientOp::GetFileChecksum);
        self.inner.file_checksum(path)
    }

    fn file_link_status(&self, path: &str) -> io::Result<FileStatus> {
        self.count(ClientOp::GetFileLinkStatus);
        self.inner.file_link_status(path)
    }

    fn list_xattrs(&self, path: &str) -> io::Result<Vec<String>> {
        self.count(ClientOp::ListXAttrs);
        self.inner.list_xattrs(path)
    }

    fn list_status(&self, path: &str) -> io::Result<Vec<FileStatus>> {
        self.count(ClientOp::ListStatus);
        self.inner.list_status(path)
    }

    fn list_status_filtered(
        &self,
        paths: &[String],
        filter: PathFilter<'_>,
    ) -> io::Result<Vec<FileStatus>> {
        let mut metrics = self.metrics.lock();
        metrics.record(ClientOp::ListStatusFiltered);
        metrics.listed_paths += paths.len();
        drop(metrics);

        self.inner.list_status_filtered(paths, filter)
    }

    fn working_directory(&self) -> String {
        self.count(ClientOp::GetWorkingDirectory);
        self.inner.working_directory()
    }

    fn home_directory(&self) -> String {
        self.count(ClientOp::GetHomeDirectory);
        self.inner.home_directory()
    }

    fn scheme(&self) -> String {
        self.count(ClientOp::GetScheme);
        self.inner.scheme()
    }

    fn close(&self) -> io::Result<()> {
        self.count(ClientOp::Close);
        self.inner.close()
    }
}
