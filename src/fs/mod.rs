//! Filesystem client layer
//!
//! The client trait, the value types it speaks, and the bundled
//! implementations.

mod checksum;
mod client;
mod counting;
mod failing;
mod local;
mod memory;
pub mod path;
pub mod types;

pub use client::{ClientOp, DfsClient, NoopClient, PathFilter};
pub use counting::{ClientMetrics, CountingClient};
pub use failing::{FailingClient, FailurePolicy};
pub use local::LocalClient;
pub use memory::{MemoryClient, MemoryClientOptions};
pub use types::{
    AclEntry, AclEntryScope, AclEntryType, AclStatus, ContentSummary, FileChecksum, FileStatus,
    FsAction, FsPermission, FsStatus, TimestampPair,
};
