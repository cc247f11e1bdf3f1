//! Connection-owning façade over the reconciler.
//!
//! `MigratorService` holds at most one live connection. Operations fail with
//! `ServiceError::NotInitialized` until `initialize` succeeds, and hand the
//! connection explicitly to the reconciliation functions.

use crate::reconciliation::{self, ReconcileError};
use crate::store::{CollectionRef, Document, DocumentStore, StoreConnection, StoreError};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Migrator service is not initialized.")]
    NotInitialized,

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct MigratorService<S: DocumentStore> {
    store: S,
    connection: Option<S::Connection>,
}

impl<S: DocumentStore> MigratorService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            connection: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.connection.is_some()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Connect to `endpoint`, replacing any existing connection
    pub async fn initialize(&mut self, endpoint: &str, credential: &str) -> Result<(), ServiceError> {
        self.shutdown().await;

        let connection = self.store.connect(endpoint, credential).await?;
        self.connection = Some(connection);

        info!(endpoint, "Migrator service initialized");
        Ok(())
    }

    /// The live connection
    pub fn connection(&self) -> Result<&S::Connection, ServiceError> {
        self.connection.as_ref().ok_or(ServiceError::NotInitialized)
    }

    /// Names of every database in the account
    pub async fn list_databases(&self) -> Result<Vec<String>, ServiceError> {
        let connection = self.connection()?;

        let mut databases = Vec::new();
        let mut continuation = None;
        loop {
            let page = connection.read_databases(continuation).await?;
            let more = page.has_more_results();
            databases.extend(page.items);
            if !more {
                break;
            }
            continuation = page.continuation;
        }

        Ok(databases)
    }

    /// Names of every container in `database`
    pub async fn list_containers(&self, database: &str) -> Result<Vec<String>, ServiceError> {
        let connection = self.connection()?;

        let mut containers = Vec::new();
        let mut continuation = None;
        loop {
            let page = connection.read_containers(database, continuation).await?;
            let more = page.has_more_results();
            containers.extend(page.items);
            if !more {
                break;
            }
            continuation = page.continuation;
        }

        Ok(containers)
    }

    /// Field name the container is partitioned by
    pub async fn get_partition_key_path(
        &self,
        collection: &CollectionRef,
    ) -> Result<String, ServiceError> {
        let connection = self.connection()?;
        let field = reconciliation::resolve_partition_key_path(connection, collection).await?;
        Ok(field)
    }

    /// Create every document of the batch. Missing ids are filled in place.
    pub async fn upload_documents(
        &self,
        collection: &CollectionRef,
        documents: &mut [Document],
    ) -> Result<(), ServiceError> {
        let connection = self.connection()?;
        reconciliation::upload_batch(connection, collection, documents).await?;
        Ok(())
    }

    /// Remove every document from the container
    pub async fn delete_all_items(&self, collection: &CollectionRef) -> Result<(), ServiceError> {
        let connection = self.connection()?;
        reconciliation::delete_all_items(connection, collection).await?;
        Ok(())
    }

    /// Release the connection. Safe to call repeatedly.
    pub async fn shutdown(&mut self) {
        if let Some(connection) = self.connection.take() {
            if let Err(e) = connection.disconnect().await {
                warn!("Failed to disconnect cleanly: {}", e);
            }
        }
    }
}
