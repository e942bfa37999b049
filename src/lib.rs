// dfs-facade library - path-oriented facade over distributed filesystem clients

pub mod config;
pub mod error;
pub mod facade;
pub mod fs;
pub mod lifecycle;
pub mod services;

pub use config::{ConfigError, FacadeConfig};
pub use error::{FacadeError, FacadeResult, PreconditionError};
pub use facade::{BestEffort, DownloadOptions, FilesystemFacade, UploadOptions};
pub use lifecycle::{ClientConnector, FacadeLifecycle, LifecycleError, SchemeConnector};
