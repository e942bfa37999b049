//! Facade configuration
//!
//! Read from a JSON file; every field has a default so a partial file (or an
//! empty object) is valid.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_namespace() -> String {
    "/".to_string()
}

fn default_replication() -> u16 {
    3
}

/// Connection settings for the filesystem facade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(extend("x-display-field" = "/server_address"))]
pub struct FacadeConfig {
    /// Whether the facade is started at all (default: false)
    #[serde(default)]
    pub enabled: bool,

    /// Filesystem address, e.g. `mem://local` or `file:///srv/dfs`
    #[serde(default)]
    pub server_address: String,

    /// Directory relative paths resolve against (default: "/")
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Replication factor for new files (default: 3)
    #[serde(default = "default_replication")]
    pub replication: u16,

    /// Identity to act as; the client's default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            server_address: String::new(),
            namespace: default_namespace(),
            replication: default_replication(),
            username: None,
        }
    }
}

impl FacadeConfig {
    /// Enabled config pointing at `server_address`, other fields defaulted
    pub fn for_address(server_address: impl Into<String>) -> Self {
        Self {
            enabled: true,
            server_address: server_address.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: FacadeConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path.as_ref(), contents)?;
        Ok(())
    }

    /// Validate the configuration; disabled configs are always valid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }

        if self.server_address.trim().is_empty() {
            return Err(ConfigError::Validation(
                "server_address must be set when enabled".to_string(),
            ));
        }

        if self.replication == 0 {
            return Err(ConfigError::Validation(
                "replication must be greater than 0".to_string(),
            ));
        }

        if !self.namespace.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "namespace must be an absolute path, got {:?}",
                self.namespace
            )));
        }

        if self
            .username
            .as_deref()
            .is_some_and(|u| u.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "username cannot be blank".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
