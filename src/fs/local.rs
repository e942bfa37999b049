//! Local directory client
//!
//! `LocalClient` exposes a directory of the local filesystem under the `file`
//! scheme. Remote path `/` is the root directory handed to
//! [`LocalClient::new`]; paths can never escape it.
//!
//! The local filesystem has no snapshots, ACLs, extended attributes or
//! replication. Snapshot, ACL, ownership and xattr calls fail with
//! `ErrorKind::Unsupported`; replication is reported as 1.

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use super::checksum;
use super::client::{DfsClient, PathFilter};
use super::path;
use super::types::{
    AclEntry, AclStatus, ContentSummary, FileChecksum, FileStatus, FsPermission, FsStatus,
    TimestampPair,
};

const UMASK: u16 = 0o022;

fn unsupported<T>(what: &str) -> io::Result<T> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{what} is not supported by the local filesystem"),
    ))
}

fn to_millis(time: io::Result<SystemTime>) -> i64 {
    time.ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_millis() as i64)
}

fn from_millis(millis: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(millis.max(0) as u64)
}

/// Sidecar handling for one copy
#[derive(Debug, Clone, Copy)]
struct Sidecars {
    /// Check each source file against its sidecar, if it has one
    verify: bool,
    /// Write a sidecar next to each target file
    write: bool,
}

/// Copy one file, honoring `overwrite` and the sidecar settings
fn copy_file(src: &Path, dst: &Path, overwrite: bool, sidecars: Sidecars) -> io::Result<()> {
    if dst.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists as a directory", dst.display()),
        ));
    }
    if !overwrite && dst.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", dst.display()),
        ));
    }
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = std::fs::read(src)?;
    if sidecars.verify {
        checksum::verify_sidecar(src, &data)?;
    }
    std::fs::write(dst, &data)?;
    if sidecars.write {
        checksum::write_sidecar(dst, &data)?;
    }
    Ok(())
}

/// Copy a file or a whole tree from `src` to `dst`
fn copy_tree(src: &Path, dst: &Path, overwrite: bool, sidecars: Sidecars) -> io::Result<()> {
    if !src.is_dir() {
        return copy_file(src, dst, overwrite, sidecars);
    }
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry.path().strip_prefix(src).map_err(io::Error::other)?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() && !checksum::is_sidecar(entry.path()) {
            copy_file(entry.path(), &target, overwrite, sidecars)?;
        }
    }
    Ok(())
}

fn remove_local(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

#[cfg(unix)]
#[allow(clippy::unnecessary_cast)]
fn volume_status(root: &Path) -> io::Result<FsStatus> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(root.as_os_str().as_bytes()).map_err(io::Error::other)?;
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    if unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) } != 0 {
        return Err(io::Error::last_os_error());
    }
    let block = stat.f_frsize as u64;
    let capacity = stat.f_blocks as u64 * block;
    let free = stat.f_bfree as u64 * block;
    Ok(FsStatus {
        capacity,
        used: capacity.saturating_sub(free),
        remaining: stat.f_bavail as u64 * block,
    })
}

#[cfg(not(unix))]
fn volume_status(_root: &Path) -> io::Result<FsStatus> {
    unsupported("Volume status")
}

/// `DfsClient` over a local directory tree
pub struct LocalClient {
    root: PathBuf,
    working_directory: String,
    delete_on_exit: Mutex<BTreeSet<String>>,
    verify_checksum: AtomicBool,
    write_checksum: AtomicBool,
}

impl LocalClient {
    /// Expose `root` (which must be an existing directory) as `/`
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Root directory does not exist: {}", root.display()),
            ));
        }
        Ok(Self {
            root: root.canonicalize()?,
            working_directory: "/".to_string(),
            delete_on_exit: Mutex::new(BTreeSet::new()),
            verify_checksum: AtomicBool::new(true),
            write_checksum: AtomicBool::new(true),
        })
    }

    /// Resolve relative paths against `dir` instead of `/`
    pub fn with_working_directory(mut self, dir: &str) -> io::Result<Self> {
        self.working_directory = path::normalize("/", dir)?;
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical remote path and the local path backing it
    fn resolve(&self, remote: &str) -> io::Result<(String, PathBuf)> {
        let key = path::normalize(&self.working_directory, remote)?;
        let local = self.root.join(key.trim_start_matches('/'));
        Ok((key, local))
    }

    fn status_of(&self, key: &str, local: &Path) -> io::Result<FileStatus> {
        let meta = std::fs::symlink_metadata(local)?;
        let symlink = if meta.file_type().is_symlink() {
            Some(std::fs::read_link(local)?.to_string_lossy().into_owned())
        } else {
            None
        };

        #[cfg(unix)]
        let (permission, owner, group) = {
            use std::os::unix::fs::{MetadataExt, PermissionsExt};
            (
                FsPermission::new((meta.permissions().mode() & 0o1777) as u16),
                meta.uid().to_string(),
                meta.gid().to_string(),
            )
        };
        #[cfg(not(unix))]
        let (permission, owner, group) = {
            let mode = if meta.permissions().readonly() { 0o555 } else { 0o755 };
            (FsPermission::new(mode), String::new(), String::new())
        };

        Ok(FileStatus {
            path: key.to_string(),
            length: if meta.is_file() { meta.len() } else { 0 },
            is_dir: meta.is_dir(),
            symlink,
            replication: if meta.is_file() { 1 } else { 0 },
            block_size: if meta.is_file() { 32 * 1024 * 1024 } else { 0 },
            modification_time: to_millis(meta.modified()),
            access_time: to_millis(meta.accessed()),
            permission,
            owner,
            group,
        })
    }

    fn apply_permission(local: &Path, permission: FsPermission) -> io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(
                local,
                std::fs::Permissions::from_mode(u32::from(permission.mode())),
            )
        }
        #[cfg(not(unix))]
        {
            let mut perms = std::fs::metadata(local)?.permissions();
            perms.set_readonly(permission.mode() & 0o222 == 0);
            std::fs::set_permissions(local, perms)
        }
    }
}

impl DfsClient for LocalClient {
    fn exists(&self, path: &str) -> io::Result<bool> {
        let (_, local) = self.resolve(path)?;
        match std::fs::symlink_metadata(&local) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn mkdirs(&self, path: &str, permission: FsPermission) -> io::Result<bool> {
        let (key, local) = self.resolve(path)?;
        if local.exists() && !local.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Path is not a directory: {key}"),
            ));
        }
        if local.is_dir() {
            return Ok(true);
        }
        std::fs::create_dir_all(&local)?;
        Self::apply_permission(&local, permission.apply_umask(UMASK))?;
        Ok(true)
    }

    fn create_new_file(&self, path: &str) -> io::Result<bool> {
        let (_, local) = self.resolve(path)?;
        if let Some(parent) = local.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match OpenOptions::new().write(true).create_new(true).open(&local) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn delete(&self, path: &str, recursive: bool) -> io::Result<bool> {
        let (key, local) = self.resolve(path)?;
        if key == "/" {
            return Ok(false);
        }
        let meta = match std::fs::symlink_metadata(&local) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        if meta.is_dir() {
            if recursive {
                std::fs::remove_dir_all(&local)?;
            } else {
                std::fs::remove_dir(&local)?;
            }
        } else {
            std::fs::remove_file(&local)?;
        }
        self.delete_on_exit
            .lock()
            .retain(|p| !path::is_within(&key, p));
        Ok(true)
    }

    fn delete_on_exit(&self, path: &str) -> io::Result<bool> {
        if !self.exists(path)? {
            return Ok(false);
        }
        let (key, _) = self.resolve(path)?;
        self.delete_on_exit.lock().insert(key);
        Ok(true)
    }

    fn cancel_delete_on_exit(&self, path: &str) -> io::Result<bool> {
        let (key, _) = self.resolve(path)?;
        Ok(self.delete_on_exit.lock().remove(&key))
    }

    fn rename(&self, src: &str, dst: &str) -> io::Result<bool> {
        let (src_key, src_local) = self.resolve(src)?;
        let (dst_key, dst_local) = self.resolve(dst)?;
        if src_key == "/" || !self.exists(&src_key)? {
            return Ok(false);
        }
        if src_key == dst_key {
            return Ok(true);
        }
        let (target_key, target_local) = if dst_local.is_dir() {
            let name = path::file_name(&src_key);
            (path::join(&dst_key, name), dst_local.join(name))
        } else if dst_local.exists() {
            return Ok(false);
        } else {
            (dst_key, dst_local)
        };
        if path::is_within(&src_key, &target_key) || target_local.exists() {
            return Ok(false);
        }
        if !target_local.parent().is_some_and(Path::is_dir) {
            return Ok(false);
        }
        std::fs::rename(&src_local, &target_local)?;
        Ok(true)
    }

    fn concat(&self, target: &str, sources: &[String]) -> io::Result<()> {
        let (target_key, target_local) = self.resolve(target)?;
        if !target_local.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("concat: target {target_key} is not an existing file"),
            ));
        }
        let mut resolved = Vec::with_capacity(sources.len());
        let mut seen = BTreeSet::new();
        for src in sources {
            let (key, local) = self.resolve(src)?;
            if key == target_key || !seen.insert(key.clone()) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("concat: {key} is listed twice"),
                ));
            }
            if !local.is_file() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("concat: source {key} is not an existing file"),
                ));
            }
            if path::parent(&key) != path::parent(&target_key) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("concat: source {key} is not in the same directory as {target_key}"),
                ));
            }
            resolved.push(local);
        }

        let mut out = OpenOptions::new().append(true).open(&target_local)?;
        for local in &resolved {
            out.write_all(&std::fs::read(local)?)?;
        }
        out.sync_all()?;
        for local in &resolved {
            std::fs::remove_file(local)?;
        }
        Ok(())
    }

    fn copy_from_local(
        &self,
        delete_source: bool,
        overwrite: bool,
        src: &Path,
        dst: &str,
    ) -> io::Result<()> {
        let (_, dst_local) = self.resolve(dst)?;
        let target = match src.file_name() {
            Some(name) if dst_local.is_dir() => dst_local.join(name),
            _ => dst_local,
        };
        let sidecars = Sidecars {
            verify: self.verify_checksum.load(Ordering::Relaxed),
            write: false,
        };
        copy_tree(src, &target, overwrite, sidecars)?;
        if delete_source {
            remove_local(src)?;
        }
        Ok(())
    }

    fn copy_to_local(
        &self,
        delete_source: bool,
        src: &str,
        dst: &Path,
        use_raw_local_fs: bool,
    ) -> io::Result<()> {
        let (src_key, src_local) = self.resolve(src)?;
        if !src_local.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("File does not exist: {src_key}"),
            ));
        }
        let target = if dst.is_dir() {
            dst.join(path::file_name(&src_key))
        } else {
            dst.to_path_buf()
        };
        let sidecars = Sidecars {
            verify: false,
            write: !use_raw_local_fs && self.write_checksum.load(Ordering::Relaxed),
        };
        copy_tree(&src_local, &target, true, sidecars)?;
        if delete_source {
            self.delete(&src_key, true)?;
        }
        Ok(())
    }

    fn create_snapshot(&self, _path: &str, _name: Option<&str>) -> io::Result<String> {
        unsupported("Snapshots")
    }

    fn delete_snapshot(&self, _path: &str, _name: &str) -> io::Result<()> {
        unsupported("Snapshots")
    }

    fn rename_snapshot(&self, _path: &str, _old_name: &str, _new_name: &str) -> io::Result<()> {
        unsupported("Snapshots")
    }

    fn acl_status(&self, _path: &str) -> io::Result<AclStatus> {
        unsupported("ACLs")
    }

    fn modify_acl_entries(&self, _path: &str, _spec: &[AclEntry]) -> io::Result<()> {
        unsupported("ACLs")
    }

    fn remove_acl_entries(&self, _path: &str, _spec: &[AclEntry]) -> io::Result<()> {
        unsupported("ACLs")
    }

    fn remove_default_acl(&self, _path: &str) -> io::Result<()> {
        unsupported("ACLs")
    }

    fn remove_acl(&self, _path: &str) -> io::Result<()> {
        unsupported("ACLs")
    }

    fn set_acl(&self, _path: &str, _spec: &[AclEntry]) -> io::Result<()> {
        unsupported("ACLs")
    }

    fn set_owner(
        &self,
        _path: &str,
        _username: Option<&str>,
        _group: Option<&str>,
    ) -> io::Result<()> {
        unsupported("Changing ownership")
    }

    fn set_permission(&self, path: &str, permission: FsPermission) -> io::Result<()> {
        let (_, local) = self.resolve(path)?;
        Self::apply_permission(&local, permission)
    }

    fn set_replication(&self, path: &str, _replication: u16) -> io::Result<bool> {
        let (_, local) = self.resolve(path)?;
        Ok(local.is_file())
    }

    fn set_times(&self, path: &str, times: TimestampPair) -> io::Result<()> {
        let (_, local) = self.resolve(path)?;
        let mut file_times = std::fs::FileTimes::new();
        if times.mtime != TimestampPair::UNCHANGED {
            file_times = file_times.set_modified(from_millis(times.mtime));
        }
        if times.atime != TimestampPair::UNCHANGED {
            file_times = file_times.set_accessed(from_millis(times.atime));
        }
        File::open(&local)?.set_times(file_times)
    }

    fn set_verify_checksum(&self, verify: bool) -> io::Result<()> {
        self.verify_checksum.store(verify, Ordering::Relaxed);
        Ok(())
    }

    fn set_write_checksum(&self, write: bool) -> io::Result<()> {
        self.write_checksum.store(write, Ordering::Relaxed);
        Ok(())
    }

    fn content_summary(&self, path: &str) -> io::Result<ContentSummary> {
        let (key, local) = self.resolve(path)?;
        if !local.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("File does not exist: {key}"),
            ));
        }
        let mut summary = ContentSummary {
            length: 0,
            file_count: 0,
            directory_count: 0,
            quota: -1,
            space_consumed: 0,
            space_quota: -1,
        };
        for entry in WalkDir::new(&local) {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_dir() {
                summary.directory_count += 1;
            } else {
                let len = entry.metadata().map_err(io::Error::from)?.len();
                summary.file_count += 1;
                summary.length += len;
                summary.space_consumed += len;
            }
        }
        Ok(summary)
    }

    fn status(&self, path: Option<&str>) -> io::Result<FsStatus> {
        let local = match path {
            Some(p) => self.resolve(p)?.1,
            None => self.root.clone(),
        };
        volume_status(&local)
    }

    fn used(&self) -> io::Result<u64> {
        let mut used = 0;
        for entry in WalkDir::new(&self.root) {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() {
                used += entry.metadata().map_err(io::Error::from)?.len();
            }
        }
        Ok(used)
    }

    fn default_replication(&self, _path: &str) -> u16 {
        1
    }

    fn file_checksum(&self, path: &str) -> io::Result<Option<FileChecksum>> {
        let (key, local) = self.resolve(path)?;
        if local.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Path is not a file: {key}"),
            ));
        }
        let data = std::fs::read(&local)?;
        Ok(Some(FileChecksum {
            algorithm: "SHA-256".to_string(),
            bytes: Sha256::digest(&data).to_vec(),
        }))
    }

    fn file_link_status(&self, path: &str) -> io::Result<FileStatus> {
        let (key, local) = self.resolve(path)?;
        self.status_of(&key, &local)
    }

    fn list_xattrs(&self, _path: &str) -> io::Result<Vec<String>> {
        unsupported("Extended attributes")
    }

    fn list_status(&self, path: &str) -> io::Result<Vec<FileStatus>> {
        let (key, local) = self.resolve(path)?;
        if !local.is_dir() {
            return Ok(vec![self.status_of(&key, &local)?]);
        }
        let mut names: Vec<String> = std::fs::read_dir(&local)?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<io::Result<_>>()?;
        names.sort();
        names
            .iter()
            .map(|name| self.status_of(&path::join(&key, name), &local.join(name)))
            .collect()
    }

    fn list_status_filtered(
        &self,
        paths: &[String],
        filter: PathFilter<'_>,
    ) -> io::Result<Vec<FileStatus>> {
        let mut statuses = Vec::new();
        for p in paths {
            statuses.extend(
                self.list_status(p)?
                    .into_iter()
                    .filter(|status| filter(&status.path)),
            );
        }
        Ok(statuses)
    }

    fn working_directory(&self) -> String {
        self.working_directory.clone()
    }

    fn home_directory(&self) -> String {
        "/".to_string()
    }

    fn scheme(&self) -> String {
        "file".to_string()
    }

    fn close(&self) -> io::Result<()> {
        let marked = std::mem::take(&mut *self.delete_on_exit.lock());
        for p in marked {
            if let Err(e) = self.delete(&p, true) {
                tracing::warn!(path = %p, error = %e, "delete-on-exit failed");
            }
        }
        Ok(())
    }
}
