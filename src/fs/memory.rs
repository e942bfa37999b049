//! In-memory filesystem client
//!
//! `MemoryClient` keeps a complete namespace behind a single lock: files with
//! content, directories, symlinks, permissions, ownership, ACLs, extended
//! attributes and directory snapshots. It behaves like a small single-node
//! cluster under the `mem` scheme and is what the facade is exercised against
//! when no real cluster is around.
//!
//! Snapshots are full copies of a directory subtree, readable (never
//! writable) under `<dir>/.snapshot/<name>`.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::Path;

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use super::checksum;
use super::client::{DfsClient, PathFilter};
use super::path::{self, SNAPSHOT_DIR};
use super::types::{
    AclEntry, AclEntryScope, AclEntryType, AclStatus, ContentSummary, FileChecksum, FileStatus,
    FsPermission, FsStatus, TimestampPair,
};

/// Identity and sizing of a `MemoryClient`
#[derive(Debug, Clone)]
pub struct MemoryClientOptions {
    /// Acting user; owns everything the client creates
    pub username: String,
    pub group: String,
    /// Base for relative paths; defaults to the home directory
    pub working_directory: Option<String>,
    pub replication: u16,
    pub block_size: u64,
    /// Reported capacity in bytes
    pub capacity: u64,
    pub umask: u16,
}

impl Default for MemoryClientOptions {
    fn default() -> Self {
        Self {
            username: "dfs".to_string(),
            group: "supergroup".to_string(),
            working_directory: None,
            replication: 3,
            block_size: 128 * 1024 * 1024,
            capacity: 1 << 40,
            umask: 0o022,
        }
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    File(Vec<u8>),
    Directory,
    Symlink(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    permission: FsPermission,
    owner: String,
    group: String,
    replication: u16,
    modification_time: i64,
    access_time: i64,
    acl: Vec<AclEntry>,
    xattrs: BTreeMap<String, Vec<u8>>,
}

impl Node {
    fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory)
    }

    fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File(_))
    }

    fn len(&self) -> u64 {
        match &self.kind {
            NodeKind::File(data) => data.len() as u64,
            _ => 0,
        }
    }
}

/// Canonical path -> node. Snapshots reuse the same shape rooted at `/`.
type Tree = BTreeMap<String, Node>;

struct Namespace {
    tree: Tree,
    /// Snapshot root -> snapshot name -> frozen subtree
    snapshots: BTreeMap<String, BTreeMap<String, Tree>>,
    delete_on_exit: BTreeSet<String>,
    verify_checksum: bool,
    write_checksum: bool,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("File does not exist: {path}"),
    )
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}

fn default_snapshot_name() -> String {
    chrono::Local::now()
        .format("s%Y%m%d-%H%M%S%.3f")
        .to_string()
}

fn prefix_of(dir: &str) -> String {
    if dir == "/" {
        "/".to_string()
    } else {
        format!("{dir}/")
    }
}

/// Direct children of `dir`, in name order
fn children<'a>(tree: &'a Tree, dir: &'a str) -> impl Iterator<Item = (&'a String, &'a Node)> {
    let prefix = prefix_of(dir);
    tree.range(prefix.clone()..)
        .take_while(move |(key, _)| key.starts_with(&prefix))
        .filter(move |(key, _)| path::parent(key) == Some(dir))
}

/// `root` and everything below it
fn subtree_keys(tree: &Tree, root: &str) -> Vec<String> {
    if root == "/" {
        return tree.keys().cloned().collect();
    }
    let prefix = prefix_of(root);
    let mut keys: Vec<String> = tree
        .contains_key(root)
        .then(|| root.to_string())
        .into_iter()
        .collect();
    keys.extend(
        tree.range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| key.clone()),
    );
    keys
}

/// The tree and key a canonical path refers to, following snapshot paths
fn view<'a>(ns: &'a Namespace, path: &str) -> Option<(&'a Tree, String)> {
    if let Some((dir, name, rest)) = path::split_snapshot_path(path) {
        let tree = ns.snapshots.get(dir)?.get(name)?;
        return Some((tree, rest));
    }
    Some((&ns.tree, path.to_string()))
}

fn is_base_entry(entry: &AclEntry) -> bool {
    entry.scope == AclEntryScope::Access
        && entry.name.is_none()
        && entry.kind != AclEntryType::Mask
}

/// Unnamed access entries for user, group and other are the permission bits
fn apply_base_entry(permission: FsPermission, entry: &AclEntry) -> FsPermission {
    let shift = match entry.kind {
        AclEntryType::User => 6,
        AclEntryType::Group => 3,
        _ => 0,
    };
    let cleared = permission.mode() & !(0o7 << shift);
    FsPermission::new(cleared | ((entry.permission.bits() as u16) << shift))
}

fn write_local(target: &Path, data: &[u8], write_checksum: bool) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(target, data)?;
    if write_checksum {
        checksum::write_sidecar(target, data)?;
    }
    Ok(())
}

/// Complete in-memory `DfsClient`
pub struct MemoryClient {
    options: MemoryClientOptions,
    state: Mutex<Namespace>,
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::with_options(MemoryClientOptions::default())
    }

    pub fn with_options(options: MemoryClientOptions) -> Self {
        let client = Self {
            options,
            state: Mutex::new(Namespace {
                tree: Tree::new(),
                snapshots: BTreeMap::new(),
                delete_on_exit: BTreeSet::new(),
                verify_checksum: true,
                write_checksum: true,
            }),
        };
        let root = client.new_node(NodeKind::Directory, FsPermission::new(0o755));
        client.state.lock().tree.insert("/".to_string(), root);
        client
    }

    // ========================================================================
    // Direct access helpers (not part of the client interface)
    // ========================================================================

    /// Write a whole file, creating parent directories
    pub fn write_file(&self, path: &str, data: &[u8]) -> io::Result<()> {
        let key = self.resolve_mut(path)?;
        let mut ns = self.state.lock();
        self.put_file(&mut ns, &key, data.to_vec(), true)
    }

    /// Read a whole file, including files inside snapshots
    pub fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        self.with_node(path, |node, key| match &node.kind {
            NodeKind::File(data) => Ok(data.clone()),
            _ => Err(invalid(format!("Path is not a file: {key}"))),
        })
    }

    pub fn set_xattr(&self, path: &str, name: &str, value: &[u8]) -> io::Result<()> {
        self.with_node_mut(path, |node| {
            node.xattrs.insert(name.to_string(), value.to_vec());
            Ok(())
        })
    }

    /// Create a symlink at `link` pointing to `target` (not resolved)
    pub fn create_symlink(&self, target: &str, link: &str) -> io::Result<()> {
        let key = self.resolve_mut(link)?;
        let mut ns = self.state.lock();
        if ns.tree.contains_key(&key) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Path already exists: {key}"),
            ));
        }
        if let Some(parent) = path::parent(&key) {
            self.ensure_dirs(&mut ns, parent, FsPermission::dir_default())?;
        }
        let node = self.new_node(
            NodeKind::Symlink(target.to_string()),
            FsPermission::new(0o777),
        );
        ns.tree.insert(key, node);
        Ok(())
    }

    /// Names of the snapshots taken of a directory
    pub fn snapshot_names(&self, dir: &str) -> io::Result<Vec<String>> {
        let key = self.resolve(dir)?;
        let ns = self.state.lock();
        Ok(ns
            .snapshots
            .get(&key)
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn resolve(&self, path: &str) -> io::Result<String> {
        path::normalize(&self.working_directory(), path)
    }

    /// Resolve a path that is about to be modified; snapshots are read-only
    fn resolve_mut(&self, path: &str) -> io::Result<String> {
        let key = self.resolve(path)?;
        if path::split_snapshot_path(&key).is_some()
            || path::file_name(&key) == SNAPSHOT_DIR
        {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("Modification on a read-only snapshot is disallowed: {key}"),
            ));
        }
        Ok(key)
    }

    fn new_node(&self, kind: NodeKind, permission: FsPermission) -> Node {
        let now = now_millis();
        let replication = match kind {
            NodeKind::File(_) => self.options.replication,
            _ => 0,
        };
        Node {
            kind,
            permission: permission.apply_umask(self.options.umask),
            owner: self.options.username.clone(),
            group: self.options.group.clone(),
            replication,
            modification_time: now,
            access_time: now,
            acl: Vec::new(),
            xattrs: BTreeMap::new(),
        }
    }

    fn status(&self, node: &Node, path: &str) -> FileStatus {
        let symlink = match &node.kind {
            NodeKind::Symlink(target) => Some(target.clone()),
            _ => None,
        };
        FileStatus {
            path: path.to_string(),
            length: node.len(),
            is_dir: node.is_dir(),
            symlink,
            replication: node.replication,
            block_size: if node.is_file() {
                self.options.block_size
            } else {
                0
            },
            modification_time: node.modification_time,
            access_time: node.access_time,
            permission: node.permission,
            owner: node.owner.clone(),
            group: node.group.clone(),
        }
    }

    /// Create every missing directory on the way to `dir`
    fn ensure_dirs(
        &self,
        ns: &mut Namespace,
        dir: &str,
        permission: FsPermission,
    ) -> io::Result<()> {
        let mut current = "/".to_string();
        for component in dir.split('/').filter(|c| !c.is_empty()) {
            current = path::join(&current, component);
            match ns.tree.get(&current) {
                Some(node) if node.is_dir() => {}
                Some(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("Parent path is not a directory: {current}"),
                    ))
                }
                None => {
                    let node = self.new_node(NodeKind::Directory, permission);
                    ns.tree.insert(current.clone(), node);
                }
            }
        }
        Ok(())
    }

    fn put_file(
        &self,
        ns: &mut Namespace,
        key: &str,
        data: Vec<u8>,
        overwrite: bool,
    ) -> io::Result<()> {
        match ns.tree.get(key) {
            Some(node) if node.is_dir() => {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{key} already exists as a directory"),
                ))
            }
            Some(_) if !overwrite => {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{key} already exists"),
                ))
            }
            _ => {}
        }
        if let Some(parent) = path::parent(key) {
            self.ensure_dirs(ns, parent, FsPermission::dir_default())?;
        }
        let node = self.new_node(NodeKind::File(data), FsPermission::file_default());
        ns.tree.insert(key.to_string(), node);
        Ok(())
    }

    fn with_node<T>(
        &self,
        path: &str,
        f: impl FnOnce(&Node, &str) -> io::Result<T>,
    ) -> io::Result<T> {
        let key = self.resolve(path)?;
        let ns = self.state.lock();
        let (tree, inner) = view(&ns, &key).ok_or_else(|| not_found(&key))?;
        let node = tree.get(&inner).ok_or_else(|| not_found(&key))?;
        f(node, &key)
    }

    fn with_node_mut<T>(
        &self,
        path: &str,
        f: impl FnOnce(&mut Node) -> io::Result<T>,
    ) -> io::Result<T> {
        let key = self.resolve_mut(path)?;
        let mut ns = self.state.lock();
        let node = ns.tree.get_mut(&key).ok_or_else(|| not_found(&key))?;
        f(node)
    }

    fn has_snapshots_within(ns: &Namespace, root: &str) -> bool {
        ns.snapshots
            .iter()
            .any(|(dir, snaps)| path::is_within(root, dir) && !snaps.is_empty())
    }
}

impl DfsClient for MemoryClient {
    fn exists(&self, path: &str) -> io::Result<bool> {
        let key = self.resolve(path)?;
        let ns = self.state.lock();
        Ok(view(&ns, &key).is_some_and(|(tree, inner)| tree.contains_key(&inner)))
    }

    fn mkdirs(&self, path: &str, permission: FsPermission) -> io::Result<bool> {
        let key = self.resolve_mut(path)?;
        let mut ns = self.state.lock();
        if let Some(node) = ns.tree.get(&key) {
            if node.is_dir() {
                return Ok(true);
            }
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Path is not a directory: {key}"),
            ));
        }
        self.ensure_dirs(&mut ns, &key, permission)?;
        Ok(true)
    }

    fn create_new_file(&self, path: &str) -> io::Result<bool> {
        let key = self.resolve_mut(path)?;
        let mut ns = self.state.lock();
        if ns.tree.contains_key(&key) {
            return Ok(false);
        }
        self.put_file(&mut ns, &key, Vec::new(), false)?;
        Ok(true)
    }

    fn delete(&self, path: &str, recursive: bool) -> io::Result<bool> {
        let key = self.resolve_mut(path)?;
        let mut ns = self.state.lock();
        let Some(node) = ns.tree.get(&key) else {
            return Ok(false);
        };
        if key == "/" {
            return Ok(false);
        }
        if node.is_dir() {
            if !recursive && children(&ns.tree, &key).next().is_some() {
                return Err(io::Error::other(format!(
                    "`{key}' is non empty: Directory is not empty"
                )));
            }
            if Self::has_snapshots_within(&ns, &key) {
                return Err(io::Error::other(format!(
                    "The directory {key} cannot be deleted since it has snapshots"
                )));
            }
        }
        for k in subtree_keys(&ns.tree, &key) {
            ns.tree.remove(&k);
        }
        ns.delete_on_exit.retain(|p| !path::is_within(&key, p));
        ns.snapshots.retain(|dir, _| !path::is_within(&key, dir));
        Ok(true)
    }

    fn delete_on_exit(&self, path: &str) -> io::Result<bool> {
        let key = self.resolve_mut(path)?;
        let mut ns = self.state.lock();
        if !ns.tree.contains_key(&key) {
            return Ok(false);
        }
        ns.delete_on_exit.insert(key);
        Ok(true)
    }

    fn cancel_delete_on_exit(&self, path: &str) -> io::Result<bool> {
        let key = self.resolve_mut(path)?;
        Ok(self.state.lock().delete_on_exit.remove(&key))
    }

    fn rename(&self, src: &str, dst: &str) -> io::Result<bool> {
        let src = self.resolve_mut(src)?;
        let dst = self.resolve_mut(dst)?;
        let mut ns = self.state.lock();
        if src == "/" || !ns.tree.contains_key(&src) {
            return Ok(false);
        }
        if src == dst {
            return Ok(true);
        }
        let target = match ns.tree.get(&dst) {
            Some(node) if node.is_dir() => path::join(&dst, path::file_name(&src)),
            Some(_) => return Ok(false),
            None => dst,
        };
        if path::is_within(&src, &target) || ns.tree.contains_key(&target) {
            return Ok(false);
        }
        match path::parent(&target) {
            Some(parent) if ns.tree.get(parent).is_some_and(Node::is_dir) => {}
            _ => return Ok(false),
        }

        for key in subtree_keys(&ns.tree, &src) {
            if let Some(node) = ns.tree.remove(&key) {
                ns.tree.insert(path::rebase(&key, &src, &target), node);
            }
        }
        let moved: Vec<String> = ns
            .snapshots
            .keys()
            .filter(|dir| path::is_within(&src, dir))
            .cloned()
            .collect();
        for dir in moved {
            if let Some(snaps) = ns.snapshots.remove(&dir) {
                ns.snapshots.insert(path::rebase(&dir, &src, &target), snaps);
            }
        }
        let marked: Vec<String> = ns
            .delete_on_exit
            .iter()
            .filter(|p| path::is_within(&src, p))
            .cloned()
            .collect();
        for p in marked {
            ns.delete_on_exit.remove(&p);
            ns.delete_on_exit.insert(path::rebase(&p, &src, &target));
        }
        Ok(true)
    }

    fn concat(&self, target: &str, sources: &[String]) -> io::Result<()> {
        let target = self.resolve_mut(target)?;
        let sources = sources
            .iter()
            .map(|s| self.resolve_mut(s))
            .collect::<io::Result<Vec<_>>>()?;
        let mut ns = self.state.lock();

        match ns.tree.get(&target) {
            Some(node) if node.is_file() => {}
            Some(_) => return Err(invalid(format!("concat: target {target} is not a file"))),
            None => return Err(not_found(&target)),
        }
        let target_parent = path::parent(&target);
        let mut seen = BTreeSet::new();
        for src in &sources {
            if *src == target {
                return Err(invalid(format!(
                    "concat: target file {target} is in the source list"
                )));
            }
            if !seen.insert(src.as_str()) {
                return Err(invalid(format!("concat: duplicate source {src}")));
            }
            match ns.tree.get(src) {
                Some(node) if node.is_file() => {}
                Some(_) => return Err(invalid(format!("concat: source {src} is not a file"))),
                None => return Err(not_found(src)),
            }
            if path::parent(src) != target_parent {
                return Err(invalid(format!(
                    "concat: source {src} is not in the same directory as the target {target}"
                )));
            }
        }

        let mut appended = Vec::new();
        for src in &sources {
            if let Some(Node {
                kind: NodeKind::File(data),
                ..
            }) = ns.tree.remove(src)
            {
                appended.extend(data);
            }
        }
        if let Some(node) = ns.tree.get_mut(&target) {
            if let NodeKind::File(data) = &mut node.kind {
                data.extend(appended);
            }
            node.modification_time = now_millis();
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
        let dst = self.resolve_mut(dst)?;
        let metadata = std::fs::metadata(src)?;
        let name = src
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| invalid(format!("No file name in {}", src.display())))?;

        {
            let mut ns = self.state.lock();
            let verify = ns.verify_checksum;
            let dest = match ns.tree.get(&dst) {
                Some(node) if node.is_dir() => path::join(&dst, &name),
                _ => dst.clone(),
            };

            if metadata.is_dir() {
                for entry in WalkDir::new(src).sort_by_file_name() {
                    let entry = entry.map_err(io::Error::from)?;
                    if entry.file_type().is_file() && checksum::is_sidecar(entry.path()) {
                        continue;
                    }
                    let relative = entry
                        .path()
                        .strip_prefix(src)
                        .map_err(io::Error::other)?;
                    let target = relative.components().fold(dest.clone(), |acc, c| {
                        path::join(&acc, &c.as_os_str().to_string_lossy())
                    });
                    if entry.file_type().is_dir() {
                        self.ensure_dirs(&mut ns, &target, FsPermission::dir_default())?;
                    } else {
                        let data = std::fs::read(entry.path())?;
                        if verify {
                            checksum::verify_sidecar(entry.path(), &data)?;
                        }
                        self.put_file(&mut ns, &target, data, overwrite)?;
                    }
                }
            } else {
                let data = std::fs::read(src)?;
                if verify {
                    checksum::verify_sidecar(src, &data)?;
                }
                self.put_file(&mut ns, &dest, data, overwrite)?;
            }
        }

        if delete_source {
            if metadata.is_dir() {
                std::fs::remove_dir_all(src)?;
            } else {
                std::fs::remove_file(src)?;
            }
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
        let key = self.resolve(src)?;
        {
            let ns = self.state.lock();
            let (tree, inner) = view(&ns, &key).ok_or_else(|| not_found(&key))?;
            let node = tree.get(&inner).ok_or_else(|| not_found(&key))?;
            let write_checksum = !use_raw_local_fs && ns.write_checksum;
            let dest = if dst.is_dir() {
                dst.join(path::file_name(&key))
            } else {
                dst.to_path_buf()
            };

            match &node.kind {
                NodeKind::File(data) => write_local(&dest, data, write_checksum)?,
                NodeKind::Directory => {
                    std::fs::create_dir_all(&dest)?;
                    for k in subtree_keys(tree, &inner) {
                        let relative = path::rebase(&k, &inner, "/");
                        let local = dest.join(relative.trim_start_matches('/'));
                        match tree.get(&k).map(|n| &n.kind) {
                            Some(NodeKind::Directory) => std::fs::create_dir_all(&local)?,
                            Some(NodeKind::File(data)) => {
                                write_local(&local, data, write_checksum)?
                            }
                            _ => {}
                        }
                    }
                }
                NodeKind::Symlink(_) => {
                    return Err(invalid(format!("Cannot copy a symlink: {key}")))
                }
            }
        }

        if delete_source {
            self.delete(&key, true)?;
        }
        Ok(())
    }

    fn create_snapshot(&self, path: &str, name: Option<&str>) -> io::Result<String> {
        let dir = self.resolve_mut(path)?;
        let mut ns = self.state.lock();
        match ns.tree.get(&dir) {
            Some(node) if node.is_dir() => {}
            Some(_) => return Err(invalid(format!("Path is not a directory: {dir}"))),
            None => return Err(not_found(&dir)),
        }
        let name = name.map_or_else(default_snapshot_name, str::to_string);
        if name.contains('/') || name == "." || name == ".." {
            return Err(invalid(format!("Invalid snapshot name: {name}")));
        }
        if ns.snapshots.get(&dir).is_some_and(|s| s.contains_key(&name)) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Snapshot {name} already exists for {dir}"),
            ));
        }

        let frozen: Tree = subtree_keys(&ns.tree, &dir)
            .into_iter()
            .filter_map(|k| {
                ns.tree
                    .get(&k)
                    .map(|node| (path::rebase(&k, &dir, "/"), node.clone()))
            })
            .collect();
        ns.snapshots
            .entry(dir.clone())
            .or_default()
            .insert(name.clone(), frozen);
        Ok(path::join(&path::join(&dir, SNAPSHOT_DIR), &name))
    }

    fn delete_snapshot(&self, path: &str, name: &str) -> io::Result<()> {
        let dir = self.resolve_mut(path)?;
        let mut ns = self.state.lock();
        let removed = ns
            .snapshots
            .get_mut(&dir)
            .and_then(|snaps| snaps.remove(name));
        if removed.is_none() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Cannot delete snapshot {name} from path {dir}: the snapshot does not exist"),
            ));
        }
        if ns.snapshots.get(&dir).is_some_and(BTreeMap::is_empty) {
            ns.snapshots.remove(&dir);
        }
        Ok(())
    }

    fn rename_snapshot(&self, path: &str, old_name: &str, new_name: &str) -> io::Result<()> {
        let dir = self.resolve_mut(path)?;
        let mut ns = self.state.lock();
        let snaps = ns
            .snapshots
            .get_mut(&dir)
            .ok_or_else(|| not_found(&path::join(&path::join(&dir, SNAPSHOT_DIR), old_name)))?;
        if snaps.contains_key(new_name) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("The snapshot {new_name} already exists for directory {dir}"),
            ));
        }
        let frozen = snaps.remove(old_name).ok_or_else(|| {
            not_found(&path::join(&path::join(&dir, SNAPSHOT_DIR), old_name))
        })?;
        snaps.insert(new_name.to_string(), frozen);
        Ok(())
    }

    fn acl_status(&self, path: &str) -> io::Result<AclStatus> {
        self.with_node(path, |node, _| {
            Ok(AclStatus {
                owner: node.owner.clone(),
                group: node.group.clone(),
                sticky_bit: node.permission.sticky_bit(),
                entries: node.acl.clone(),
                permission: Some(node.permission),
            })
        })
    }

    fn modify_acl_entries(&self, path: &str, spec: &[AclEntry]) -> io::Result<()> {
        self.with_node_mut(path, |node| {
            for entry in spec {
                if is_base_entry(entry) {
                    node.permission = apply_base_entry(node.permission, entry);
                } else if let Some(existing) = node.acl.iter_mut().find(|e| e.same_key(entry)) {
                    existing.permission = entry.permission;
                } else {
                    node.acl.push(entry.clone());
                }
            }
            Ok(())
        })
    }

    fn remove_acl_entries(&self, path: &str, spec: &[AclEntry]) -> io::Result<()> {
        self.with_node_mut(path, |node| {
            node.acl.retain(|e| !spec.iter().any(|s| s.same_key(e)));
            Ok(())
        })
    }

    fn remove_default_acl(&self, path: &str) -> io::Result<()> {
        self.with_node_mut(path, |node| {
            node.acl.retain(|e| e.scope == AclEntryScope::Access);
            Ok(())
        })
    }

    fn remove_acl(&self, path: &str) -> io::Result<()> {
        self.with_node_mut(path, |node| {
            node.acl.clear();
            Ok(())
        })
    }

    fn set_acl(&self, path: &str, spec: &[AclEntry]) -> io::Result<()> {
        self.with_node_mut(path, |node| {
            let mut extended = Vec::new();
            for entry in spec {
                if is_base_entry(entry) {
                    node.permission = apply_base_entry(node.permission, entry);
                } else {
                    extended.push(entry.clone());
                }
            }
            node.acl = extended;
            Ok(())
        })
    }

    fn set_owner(
        &self,
        path: &str,
        username: Option<&str>,
        group: Option<&str>,
    ) -> io::Result<()> {
        if username.is_none() && group.is_none() {
            return Err(invalid(
                "username and group cannot both be unset".to_string(),
            ));
        }
        self.with_node_mut(path, |node| {
            if let Some(username) = username {
                node.owner = username.to_string();
            }
            if let Some(group) = group {
                node.group = group.to_string();
            }
            Ok(())
        })
    }

    fn set_permission(&self, path: &str, permission: FsPermission) -> io::Result<()> {
        self.with_node_mut(path, |node| {
            node.permission = permission;
            Ok(())
        })
    }

    fn set_replication(&self, path: &str, replication: u16) -> io::Result<bool> {
        if replication == 0 {
            return Err(invalid("replication must be at least 1".to_string()));
        }
        let key = self.resolve_mut(path)?;
        let mut ns = self.state.lock();
        match ns.tree.get_mut(&key) {
            Some(node) if node.is_file() => {
                node.replication = replication;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn set_times(&self, path: &str, times: TimestampPair) -> io::Result<()> {
        self.with_node_mut(path, |node| {
            if times.mtime != TimestampPair::UNCHANGED {
                node.modification_time = times.mtime;
            }
            if times.atime != TimestampPair::UNCHANGED {
                node.access_time = times.atime;
            }
            Ok(())
        })
    }

    fn set_verify_checksum(&self, verify: bool) -> io::Result<()> {
        self.state.lock().verify_checksum = verify;
        Ok(())
    }

    fn set_write_checksum(&self, write: bool) -> io::Result<()> {
        self.state.lock().write_checksum = write;
        Ok(())
    }

    fn content_summary(&self, path: &str) -> io::Result<ContentSummary> {
        let key = self.resolve(path)?;
        let ns = self.state.lock();
        let (tree, inner) = view(&ns, &key).ok_or_else(|| not_found(&key))?;
        if !tree.contains_key(&inner) {
            return Err(not_found(&key));
        }
        let mut summary = ContentSummary {
            length: 0,
            file_count: 0,
            directory_count: 0,
            quota: -1,
            space_consumed: 0,
            space_quota: -1,
        };
        for k in subtree_keys(tree, &inner) {
            let Some(node) = tree.get(&k) else { continue };
            if node.is_dir() {
                summary.directory_count += 1;
            } else {
                summary.file_count += 1;
                summary.length += node.len();
                summary.space_consumed += node.len() * u64::from(node.replication);
            }
        }
        Ok(summary)
    }

    fn status(&self, _path: Option<&str>) -> io::Result<FsStatus> {
        let ns = self.state.lock();
        let used: u64 = ns
            .tree
            .values()
            .map(|node| node.len() * u64::from(node.replication))
            .sum();
        Ok(FsStatus {
            capacity: self.options.capacity,
            used,
            remaining: self.options.capacity.saturating_sub(used),
        })
    }

    fn used(&self) -> io::Result<u64> {
        Ok(self.state.lock().tree.values().map(Node::len).sum())
    }

    fn default_replication(&self, _path: &str) -> u16 {
        self.options.replication
    }

    fn file_checksum(&self, path: &str) -> io::Result<Option<FileChecksum>> {
        self.with_node(path, |node, key| match &node.kind {
            NodeKind::File(data) => Ok(Some(FileChecksum {
                algorithm: "SHA-256".to_string(),
                bytes: Sha256::digest(data).to_vec(),
            })),
            _ => Err(invalid(format!("Path is not a file: {key}"))),
        })
    }

    fn file_link_status(&self, path: &str) -> io::Result<FileStatus> {
        self.with_node(path, |node, key| Ok(self.status(node, key)))
    }

    fn list_xattrs(&self, path: &str) -> io::Result<Vec<String>> {
        self.with_node(path, |node, _| Ok(node.xattrs.keys().cloned().collect()))
    }

    fn list_status(&self, path: &str) -> io::Result<Vec<FileStatus>> {
        let key = self.resolve(path)?;
        let ns = self.state.lock();
        let (tree, inner) = view(&ns, &key).ok_or_else(|| not_found(&key))?;
        let node = tree.get(&inner).ok_or_else(|| not_found(&key))?;
        if !node.is_dir() {
            return Ok(vec![self.status(node, &key)]);
        }
        Ok(children(tree, &inner)
            .map(|(k, child)| self.status(child, &path::join(&key, path::file_name(k))))
            .collect())
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
        self.options
            .working_directory
            .clone()
            .unwrap_or_else(|| self.home_directory())
    }

    fn home_directory(&self) -> String {
        format!("/user/{}", self.options.username)
    }

    fn scheme(&self) -> String {
        "mem".to_string()
    }

    fn close(&self) -> io::Result<()> {
        let marked = std::mem::take(&mut self.state.lock().delete_on_exit);
        for p in marked {
            if let Err(e) = self.delete(&p, true) {
                tracing::warn!(path = %p, error = %e, "delete-on-exit failed");
            }
        }
        Ok(())
    }
}
