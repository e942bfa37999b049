//! Options for transfer operations
//!
//! Each transfer has one canonical entry point taking one of these structs;
//! the defaults here are the values the short forms (`upload`, `download`)
//! use.

/// Options for copying a local file into the remote filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    /// Remove the local source after a successful copy (default: false)
    pub delete_source: bool,
    /// Replace an existing remote target (default: true)
    pub overwrite: bool,
}

impl UploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delete_source(mut self, delete_source: bool) -> Self {
        self.delete_source = delete_source;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            delete_source: false,
            overwrite: true,
        }
    }
}

/// Options for copying a remote file to the local filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownloadOptions {
    /// Remove the remote source after a successful copy (default: false)
    pub delete_source: bool,
    /// Write through the raw local filesystem, skipping client-side
    /// checksum files (default: false)
    pub use_raw_local_fs: bool,
}

impl DownloadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delete_source(mut self, delete_source: bool) -> Self {
        self.delete_source = delete_source;
        self
    }

    pub fn with_raw_local_fs(mut self, use_raw_local_fs: bool) -> Self {
        self.use_raw_local_fs = use_raw_local_fs;
        self
    }
}
