//! Client lifecycle management
//!
//! `FacadeLifecycle` owns the one shared client handle behind the facade:
//! it builds the client from a [`FacadeConfig`] at start-up and closes it
//! exactly once at shutdown (explicitly or on drop). Operations never open or
//! close the handle themselves.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, FacadeConfig};
use crate::facade::FilesystemFacade;
use crate::fs::{DfsClient, LocalClient, MemoryClient, MemoryClientOptions};

/// Errors raised while starting the facade
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("server address {0:?} has no scheme")]
    InvalidAddress(String),

    #[error("unsupported filesystem scheme {scheme:?} in {address}")]
    UnsupportedScheme { scheme: String, address: String },

    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },
}

/// Builds the client handle for a validated, enabled configuration
pub trait ClientConnector {
    fn connect(&self, config: &FacadeConfig) -> Result<Arc<dyn DfsClient>, LifecycleError>;
}

impl<F> ClientConnector for F
where
    F: Fn(&FacadeConfig) -> Result<Arc<dyn DfsClient>, LifecycleError>,
{
    fn connect(&self, config: &FacadeConfig) -> Result<Arc<dyn DfsClient>, LifecycleError> {
        self(config)
    }
}

/// Connector choosing a bundled client by address scheme:
/// `mem://<name>` for an in-memory namespace, `file://<dir>` for a local
/// directory tree
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemeConnector;

impl SchemeConnector {
    fn memory(config: &FacadeConfig) -> MemoryClient {
        let defaults = MemoryClientOptions::default();
        MemoryClient::with_options(MemoryClientOptions {
            username: config.username.clone().unwrap_or(defaults.username.clone()),
            working_directory: Some(config.namespace.clone()),
            replication: config.replication,
            ..defaults
        })
    }

    fn local(config: &FacadeConfig, location: &str) -> io::Result<LocalClient> {
        // file:///srv/dfs and file://host/srv/dfs both name /srv/dfs
        let root = match location.find('/') {
            Some(slash) => &location[slash..],
            None => "/",
        };
        LocalClient::new(root)?.with_working_directory(&config.namespace)
    }
}

impl ClientConnector for SchemeConnector {
    fn connect(&self, config: &FacadeConfig) -> Result<Arc<dyn DfsClient>, LifecycleError> {
        let address = config.server_address.trim();
        let (scheme, location) = address
            .split_once("://")
            .ok_or_else(|| LifecycleError::InvalidAddress(address.to_string()))?;

        match scheme {
            "mem" => Ok(Arc::new(Self::memory(config))),
            "file" => {
                let client =
                    Self::local(config, location).map_err(|source| LifecycleError::Connect {
                        address: address.to_string(),
                        source,
                    })?;
                Ok(Arc::new(client))
            }
            other => Err(LifecycleError::UnsupportedScheme {
                scheme: other.to_string(),
                address: address.to_string(),
            }),
        }
    }
}

/// Owner of the facade and its client handle
pub struct FacadeLifecycle {
    facade: Option<Arc<FilesystemFacade>>,
    closed: AtomicBool,
}

impl FacadeLifecycle {
    /// Validate `config` and connect; a disabled config yields a lifecycle
    /// without a facade
    pub fn start(
        config: &FacadeConfig,
        connector: &dyn ClientConnector,
    ) -> Result<Self, LifecycleError> {
        config.validate()?;

        if !config.enabled {
            tracing::info!("filesystem facade disabled by configuration");
            return Ok(Self {
                facade: None,
                closed: AtomicBool::new(false),
            });
        }

        let client = connector.connect(config)?;
        tracing::info!(
            address = %config.server_address,
            scheme = %client.scheme(),
            namespace = %config.namespace,
            "filesystem client connected"
        );
        Ok(Self {
            facade: Some(Arc::new(FilesystemFacade::new(client))),
            closed: AtomicBool::new(false),
        })
    }

    /// The facade, unless disabled or already shut down
    pub fn facade(&self) -> Option<&Arc<FilesystemFacade>> {
        if self.is_shut_down() {
            return None;
        }
        self.facade.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.facade.is_some()
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close the client handle; later calls do nothing
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(facade) = &self.facade {
            facade.close();
            tracing::info!("filesystem client closed");
        }
    }
}

impl Drop for FacadeLifecycle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
