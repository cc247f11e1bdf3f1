#![allow(dead_code)]

use async_trait::async_trait;
use cosmos_migrator::store::{
    AccountSnapshot, CollectionRef, ContainerProperties, Document, DocumentStore,
    EmulatorConnection, EmulatorStore, Page, PartitionKey, StoreConnection, StoreError,
};
use serde_json::Value;
use std::sync::Mutex;

pub const ENDPOINT: &str = "https://localhost:8081";
pub const PRIMARY_KEY: &str = "test-key";

/// Build a document from a `json!` object literal
pub fn doc(value: Value) -> Document {
    value.as_object().cloned().expect("document must be a JSON object")
}

pub fn orders() -> CollectionRef {
    CollectionRef::new("shop", "orders")
}

/// An account with `shop/orders` partitioned by `/category`
pub fn shop_account() -> AccountSnapshot {
    AccountSnapshot::new(PRIMARY_KEY).with_container("shop", "orders", Some("/category"))
}

/// An in-memory store serving `snapshot` at `ENDPOINT`
pub async fn create_store(snapshot: AccountSnapshot, page_size: usize) -> EmulatorStore {
    let store = EmulatorStore::in_memory().with_page_size(page_size);
    store
        .register_account(ENDPOINT, snapshot)
        .await
        .expect("Should register account");
    store
}

pub async fn connect(store: &EmulatorStore) -> EmulatorConnection {
    store
        .connect(ENDPOINT, PRIMARY_KEY)
        .await
        .expect("Should connect")
}

/// Store calls observed by `RecordingConnection`
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ReadContainer,
    Create { id: String, partition_key: String },
    Query,
    Delete { id: String, partition_key: String },
}

/// Connection wrapper that records every call before forwarding it
pub struct RecordingConnection {
    inner: EmulatorConnection,
    calls: Mutex<Vec<Call>>,
}

impl RecordingConnection {
    pub fn new(inner: EmulatorConnection) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn creates(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Create { id, partition_key } => Some((id, partition_key)),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete { id, partition_key } => Some((id, partition_key)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl StoreConnection for RecordingConnection {
    async fn read_databases(
        &self,
        continuation: Option<String>,
    ) -> Result<Page<String>, StoreError> {
        self.inner.read_databases(continuation).await
    }

    async fn read_containers(
        &self,
        database: &str,
        continuation: Option<String>,
    ) -> Result<Page<String>, StoreError> {
        self.inner.read_containers(database, continuation).await
    }

    async fn read_container(
        &self,
        collection: &CollectionRef,
    ) -> Result<ContainerProperties, StoreError> {
        self.record(Call::ReadContainer);
        self.inner.read_container(collection).await
    }

    async fn create_document(
        &self,
        collection: &CollectionRef,
        document: &Document,
        partition_key: &PartitionKey,
    ) -> Result<(), StoreError> {
        let id = document
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        self.record(Call::Create {
            id,
            partition_key: partition_key.to_string(),
        });
        self.inner
            .create_document(collection, document, partition_key)
            .await
    }

    async fn query_projected(
        &self,
        collection: &CollectionRef,
        fields: &[String],
        continuation: Option<String>,
    ) -> Result<Page<Document>, StoreError> {
        self.record(Call::Query);
        self.inner
            .query_projected(collection, fields, continuation)
            .await
    }

    async fn delete_document(
        &self,
        collection: &CollectionRef,
        id: &str,
        partition_key: &PartitionKey,
    ) -> Result<(), StoreError> {
        self.record(Call::Delete {
            id: id.to_string(),
            partition_key: partition_key.to_string(),
        });
        self.inner
            .delete_document(collection, id, partition_key)
            .await
    }

    async fn disconnect(&self) -> Result<(), StoreError> {
        self.inner.disconnect().await
    }
}
