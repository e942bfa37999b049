//! Value types passed across the client boundary
//!
//! These mirror the remote filesystem's own permission, ACL and status model.
//! The facade forwards them to and from the client without interpreting them;
//! only the bundled clients look inside.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Permissions
// ============================================================================

/// Access bits for one class (user, group or other)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FsAction {
    None,
    Execute,
    Write,
    WriteExecute,
    Read,
    ReadExecute,
    ReadWrite,
    All,
}

impl FsAction {
    /// Build from the low three bits of a mode (`r=4`, `w=2`, `x=1`)
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0o7 {
            0 => FsAction::None,
            1 => FsAction::Execute,
            2 => FsAction::Write,
            3 => FsAction::WriteExecute,
            4 => FsAction::Read,
            5 => FsAction::ReadExecute,
            6 => FsAction::ReadWrite,
            _ => FsAction::All,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            FsAction::None => 0,
            FsAction::Execute => 1,
            FsAction::Write => 2,
            FsAction::WriteExecute => 3,
            FsAction::Read => 4,
            FsAction::ReadExecute => 5,
            FsAction::ReadWrite => 6,
            FsAction::All => 7,
        }
    }

    /// Returns true if every bit of `other` is granted by `self`
    pub fn implies(self, other: FsAction) -> bool {
        self.bits() & other.bits() == other.bits()
    }

    /// Symbolic form, e.g. `r-x`
    pub fn symbol(self) -> &'static str {
        match self {
            FsAction::None => "---",
            FsAction::Execute => "--x",
            FsAction::Write => "-w-",
            FsAction::WriteExecute => "-wx",
            FsAction::Read => "r--",
            FsAction::ReadExecute => "r-x",
            FsAction::ReadWrite => "rw-",
            FsAction::All => "rwx",
        }
    }
}

impl fmt::Display for FsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// POSIX-style permission bits, including the sticky bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FsPermission {
    mode: u16,
}

impl FsPermission {
    pub const fn new(mode: u16) -> Self {
        Self {
            mode: mode & 0o1777,
        }
    }

    /// Default permission for newly created directories
    pub const fn dir_default() -> Self {
        Self::new(0o777)
    }

    /// Default permission for newly created files
    pub const fn file_default() -> Self {
        Self::new(0o666)
    }

    pub fn mode(&self) -> u16 {
        self.mode
    }

    pub fn sticky_bit(&self) -> bool {
        self.mode & 0o1000 != 0
    }

    pub fn user_action(&self) -> FsAction {
        FsAction::from_bits((self.mode >> 6) as u8)
    }

    pub fn group_action(&self) -> FsAction {
        FsAction::from_bits((self.mode >> 3) as u8)
    }

    pub fn other_action(&self) -> FsAction {
        FsAction::from_bits(self.mode as u8)
    }

    /// Clear the bits set in `umask`
    pub fn apply_umask(self, umask: u16) -> Self {
        Self::new(self.mode & !umask)
    }
}

impl Default for FsPermission {
    fn default() -> Self {
        Self::file_default()
    }
}

impl fmt::Display for FsPermission {
    /// Symbolic form (`rwxr-xr-x`); the sticky bit replaces the last
    /// character with `t` (or `T` when other-execute is unset).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = format!(
            "{}{}{}",
            self.user_action(),
            self.group_action(),
            self.other_action()
        );
        if self.sticky_bit() {
            let exec = self.other_action().implies(FsAction::Execute);
            s.pop();
            s.push(if exec { 't' } else { 'T' });
        }
        f.write_str(&s)
    }
}

// ============================================================================
// ACLs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AclEntryScope {
    Access,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AclEntryType {
    User,
    Group,
    Mask,
    Other,
}

impl AclEntryType {
    fn as_str(self) -> &'static str {
        match self {
            AclEntryType::User => "user",
            AclEntryType::Group => "group",
            AclEntryType::Mask => "mask",
            AclEntryType::Other => "other",
        }
    }
}

/// One ACL entry, e.g. `default:user:alice:rwx`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AclEntry {
    pub scope: AclEntryScope,
    pub kind: AclEntryType,
    /// Named user or group; `None` for the owning user/group, mask and other
    pub name: Option<String>,
    pub permission: FsAction,
}

impl AclEntry {
    /// Create an access-scope entry
    pub fn access(kind: AclEntryType, name: Option<&str>, permission: FsAction) -> Self {
        Self {
            scope: AclEntryScope::Access,
            kind,
            name: name.map(str::to_string),
            permission,
        }
    }

    /// Create a default-scope entry (inherited by new children of a directory)
    pub fn default_scope(kind: AclEntryType, name: Option<&str>, permission: FsAction) -> Self {
        Self {
            scope: AclEntryScope::Default,
            ..Self::access(kind, name, permission)
        }
    }

    /// Two entries address the same slot when scope, type and name match
    pub fn same_key(&self, other: &AclEntry) -> bool {
        self.scope == other.scope && self.kind == other.kind && self.name == other.name
    }
}

impl fmt::Display for AclEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scope == AclEntryScope::Default {
            f.write_str("default:")?;
        }
        write!(
            f,
            "{}:{}:{}",
            self.kind.as_str(),
            self.name.as_deref().unwrap_or(""),
            self.permission
        )
    }
}

/// ACL state of a file or directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclStatus {
    pub owner: String,
    pub group: String,
    pub sticky_bit: bool,
    /// Extended entries only; the base user/group/other bits live in `permission`
    pub entries: Vec<AclEntry>,
    pub permission: Option<FsPermission>,
}

// ============================================================================
// Status records
// ============================================================================

/// Status of a single file, directory or symlink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatus {
    /// Fully qualified path of the entry
    pub path: String,
    /// Length in bytes (0 for directories)
    pub length: u64,
    pub is_dir: bool,
    /// Target of the link when the entry is a symlink
    pub symlink: Option<String>,
    pub replication: u16,
    pub block_size: u64,
    /// Epoch milliseconds
    pub modification_time: i64,
    /// Epoch milliseconds
    pub access_time: i64,
    pub permission: FsPermission,
    pub owner: String,
    pub group: String,
}

impl FileStatus {
    pub fn is_file(&self) -> bool {
        !self.is_dir && self.symlink.is_none()
    }

    pub fn is_symlink(&self) -> bool {
        self.symlink.is_some()
    }

    /// Last path component
    pub fn name(&self) -> &str {
        let trimmed = self.path.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) => &trimmed[idx + 1..],
            None => trimmed,
        }
    }
}

/// Usage and quota totals for a directory tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSummary {
    pub length: u64,
    pub file_count: u64,
    pub directory_count: u64,
    /// Namespace quota, -1 when unlimited
    pub quota: i64,
    pub space_consumed: u64,
    /// Space quota, -1 when unlimited
    pub space_quota: i64,
}

/// Checksum of a file's content as computed by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChecksum {
    pub algorithm: String,
    pub bytes: Vec<u8>,
}

impl FileChecksum {
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for FileChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// Capacity and usage of a filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsStatus {
    pub capacity: u64,
    pub used: u64,
    pub remaining: u64,
}

/// Modification/access time pair in epoch milliseconds
///
/// A value of [`TimestampPair::UNCHANGED`] leaves that time untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampPair {
    pub mtime: i64,
    pub atime: i64,
}

impl TimestampPair {
    pub const UNCHANGED: i64 = -1;

    pub fn new(mtime: i64, atime: i64) -> Self {
        Self { mtime, atime }
    }

    pub fn modification_only(mtime: i64) -> Self {
        Self::new(mtime, Self::UNCHANGED)
    }

    pub fn access_only(atime: i64) -> Self {
        Self::new(Self::UNCHANGED, atime)
    }
}
