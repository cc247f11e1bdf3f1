use crate::store::{Document, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

/// On-disk form of an emulated account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    /// Credential a connection must present
    pub primary_key: String,

    /// When the snapshot was last written
    #[serde(default)]
    pub updated_at: String,

    #[serde(default)]
    pub databases: BTreeMap<String, DatabaseSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSnapshot {
    #[serde(default)]
    pub containers: BTreeMap<String, ContainerSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSnapshot {
    #[serde(default)]
    pub partition_key_paths: Vec<String>,

    #[serde(default)]
    pub items: Vec<Document>,
}

impl AccountSnapshot {
    pub fn new(primary_key: impl Into<String>) -> Self {
        Self {
            primary_key: primary_key.into(),
            updated_at: crate::utils::now_iso(),
            databases: BTreeMap::new(),
        }
    }

    /// Add an empty database
    pub fn with_database(mut self, database: &str) -> Self {
        self.databases.entry(database.to_string()).or_default();
        self
    }

    /// Add an empty container, creating its database if needed
    pub fn with_container(
        mut self,
        database: &str,
        container: &str,
        partition_key_path: Option<&str>,
    ) -> Self {
        let paths = partition_key_path
            .map(|p| vec![p.to_string()])
            .unwrap_or_default();
        self.databases
            .entry(database.to_string())
            .or_default()
            .containers
            .insert(
                container.to_string(),
                ContainerSnapshot {
                    partition_key_paths: paths,
                    items: Vec::new(),
                },
            );
        self
    }

    /// Add a stored item, creating its database and container if needed
    pub fn with_document(mut self, database: &str, container: &str, document: Document) -> Self {
        self.databases
            .entry(database.to_string())
            .or_default()
            .containers
            .entry(container.to_string())
            .or_default()
            .items
            .push(document);
        self
    }
}

/// Read a snapshot file. Returns `None` if it does not exist.
pub async fn read_snapshot(path: &Path) -> Result<Option<AccountSnapshot>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).await?;
    let snapshot: AccountSnapshot = serde_json::from_str(&content)?;
    Ok(Some(snapshot))
}

/// Write a snapshot file atomically
pub async fn write_snapshot(path: &Path, snapshot: &AccountSnapshot) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    // Write atomically using temp file + rename
    let temp_path = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(snapshot)?;
    fs::write(&temp_path, &content).await?;
    fs::rename(&temp_path, path).await?;

    Ok(())
}
