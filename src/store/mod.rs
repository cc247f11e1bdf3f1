//! Document store capability.
//!
//! The migrator never talks to a database directly. Everything it needs from
//! the platform is expressed by two traits:
//!
//! - `DocumentStore` establishes a connection from an endpoint and credential
//! - `StoreConnection` enumerates databases and containers, reads container
//!   metadata, and creates, queries and deletes documents
//!
//! Enumerations are paged: callers keep requesting with the returned
//! continuation until it comes back as `None`.

pub mod emulator;
mod types;

pub use emulator::{
    read_snapshot, write_snapshot, AccountSnapshot, ContainerSnapshot, DatabaseSnapshot,
    EmulatorConnection, EmulatorStore,
};
pub use types::{CollectionRef, ContainerProperties, Document, Page, PartitionKey};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Authentication failed for endpoint {0}")]
    Authentication(String),

    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("Database {0} not found")]
    DatabaseNotFound(String),

    #[error("Container {0} not found")]
    ContainerNotFound(String),

    #[error("Document {id} not found in partition {partition_key}")]
    DocumentNotFound { id: String, partition_key: String },

    #[error("Document {id} already exists in partition {partition_key}")]
    Conflict { id: String, partition_key: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Connection is closed")]
    Closed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Entry point to a document database platform.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    type Connection: StoreConnection;

    /// Open a connection to the account at `endpoint`.
    async fn connect(&self, endpoint: &str, credential: &str)
        -> Result<Self::Connection, StoreError>;
}

/// An open connection to one account.
#[async_trait]
pub trait StoreConnection: Send + Sync {
    /// Read one page of database names.
    async fn read_databases(&self, continuation: Option<String>)
        -> Result<Page<String>, StoreError>;

    /// Read one page of container names within `database`.
    async fn read_containers(
        &self,
        database: &str,
        continuation: Option<String>,
    ) -> Result<Page<String>, StoreError>;

    /// Read the current metadata of a container.
    async fn read_container(
        &self,
        collection: &CollectionRef,
    ) -> Result<ContainerProperties, StoreError>;

    /// Create a single document routed to `partition_key`.
    async fn create_document(
        &self,
        collection: &CollectionRef,
        document: &Document,
        partition_key: &PartitionKey,
    ) -> Result<(), StoreError>;

    /// Read one page of documents projected onto `fields`.
    ///
    /// Fields a document does not have are left out of its projection.
    async fn query_projected(
        &self,
        collection: &CollectionRef,
        fields: &[String],
        continuation: Option<String>,
    ) -> Result<Page<Document>, StoreError>;

    /// Delete the document `id` in `partition_key`.
    async fn delete_document(
        &self,
        collection: &CollectionRef,
        id: &str,
        partition_key: &PartitionKey,
    ) -> Result<(), StoreError>;

    /// Release the connection. No other call is valid afterwards.
    async fn disconnect(&self) -> Result<(), StoreError>;
}
