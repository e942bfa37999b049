//! Facades wired to the bundled clients, with handles kept for inspection

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dfs_facade::fs::{CountingClient, FailingClient, FailurePolicy, LocalClient, MemoryClient};
use dfs_facade::FilesystemFacade;
use tempfile::TempDir;

/// Facade over a counting in-memory client
pub struct MemoryFixture {
    pub facade: FilesystemFacade,
    pub memory: Arc<MemoryClient>,
    pub counting: Arc<CountingClient>,
}

impl MemoryFixture {
    pub fn new() -> Self {
        super::tracing::init_tracing_from_env();
        let memory = Arc::new(MemoryClient::new());
        let counting = Arc::new(CountingClient::new(memory.clone()));
        Self {
            facade: FilesystemFacade::new(counting.clone()),
            memory,
            counting,
        }
    }

    /// Client calls made since the last reset
    pub fn calls(&self) -> usize {
        self.counting.metrics().total_calls()
    }

    pub fn reset_calls(&self) {
        self.counting.reset_metrics();
    }
}

/// Facade over an in-memory client whose calls fail per `policy`
pub struct FailingFixture {
    pub facade: FilesystemFacade,
    pub memory: Arc<MemoryClient>,
    pub failing: Arc<FailingClient>,
}

impl FailingFixture {
    pub fn new(policy: FailurePolicy) -> Self {
        super::tracing::init_tracing_from_env();
        let memory = Arc::new(MemoryClient::new());
        let failing = Arc::new(FailingClient::new(memory.clone(), policy));
        Self {
            facade: FilesystemFacade::new(failing.clone()),
            memory,
            failing,
        }
    }
}

/// Facade over a local directory, plus a separate scratch directory for
/// transfer sources and targets
pub struct LocalFixture {
    pub facade: FilesystemFacade,
    pub root: TempDir,
    pub scratch: TempDir,
}

impl LocalFixture {
    pub fn new() -> Self {
        super::tracing::init_tracing_from_env();
        let root = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let client = LocalClient::new(root.path()).unwrap();
        Self {
            facade: FilesystemFacade::new(Arc::new(client)),
            root,
            scratch,
        }
    }

    /// Local path backing a remote path
    pub fn backing(&self, remote: &str) -> PathBuf {
        self.root.path().join(remote.trim_start_matches('/'))
    }

    /// Write a file in the scratch directory
    pub fn scratch_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.scratch.path().join(name);
        write_local(&path, contents);
        path
    }
}

pub fn write_local(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}
