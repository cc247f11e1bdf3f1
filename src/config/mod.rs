use crate::store::emulator::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Migrator configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MigratorConfig {
    /// Account endpoint. For the local emulator this is a snapshot file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    /// Maximum number of results per page when enumerating
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            primary_key: None,
            page_size: default_page_size(),
        }
    }
}

impl MigratorConfig {
    /// Overlay explicitly given values on top of this configuration
    pub fn merge(
        mut self,
        endpoint: Option<String>,
        primary_key: Option<String>,
        page_size: Option<usize>,
    ) -> Self {
        if endpoint.is_some() {
            self.endpoint = endpoint;
        }
        if primary_key.is_some() {
            self.primary_key = primary_key;
        }
        if let Some(size) = page_size {
            self.page_size = size;
        }
        self
    }
}

/// Read the configuration file
pub async fn read_config(config_path: &Path) -> Result<Option<MigratorConfig>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(config_path).await?;
    let config: MigratorConfig = serde_json::from_str(&content)?;
    Ok(Some(config))
}
