//! Local emulation of a partitioned document database account.
//!
//! Accounts live either in memory (registered per endpoint) or in a JSON
//! snapshot file whose path doubles as the endpoint. File-backed accounts are
//! re-read for every call and rewritten after every mutation, holding a
//! process-wide lock for that path across the read-modify-write.

mod account;
mod snapshot;

pub use snapshot::{
    read_snapshot, write_snapshot, AccountSnapshot, ContainerSnapshot, DatabaseSnapshot,
};

use super::{
    CollectionRef, ContainerProperties, Document, DocumentStore, Page, PartitionKey,
    StoreConnection, StoreError,
};
use crate::utils::now_iso;
use account::Account;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Per-path locks for snapshot file access
static SNAPSHOT_LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

async fn snapshot_lock(path: &Path) -> Arc<Mutex<()>> {
    // Absolute path so relative and absolute endpoints share a lock
    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let locks = SNAPSHOT_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
    locks.lock().await.entry(key).or_default().clone()
}

async fn load_account(path: &Path) -> Result<Account, StoreError> {
    let snapshot = read_snapshot(path)
        .await?
        .ok_or_else(|| StoreError::Unreachable(path.display().to_string()))?;
    Account::from_snapshot(snapshot)
}

enum Backing {
    Memory(Mutex<HashMap<String, Arc<Mutex<Account>>>>),
    File,
}

/// Where a connection's account lives
enum Source {
    Memory(Arc<Mutex<Account>>),
    File(PathBuf),
}

pub struct EmulatorStore {
    backing: Backing,
    page_size: usize,
}

impl EmulatorStore {
    /// A store whose accounts are registered in memory
    pub fn in_memory() -> Self {
        Self {
            backing: Backing::Memory(Mutex::new(HashMap::new())),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// A store that treats each endpoint as the path of a snapshot file
    pub fn file_backed() -> Self {
        Self {
            backing: Backing::File,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make an account reachable at `endpoint`
    pub async fn register_account(
        &self,
        endpoint: &str,
        snapshot: AccountSnapshot,
    ) -> Result<(), StoreError> {
        let account = Account::from_snapshot(snapshot)?;
        match &self.backing {
            Backing::Memory(accounts) => {
                accounts
                    .lock()
                    .await
                    .insert(endpoint.to_string(), Arc::new(Mutex::new(account)));
                Ok(())
            }
            Backing::File => {
                let path = PathBuf::from(endpoint);
                let lock = snapshot_lock(&path).await;
                let _guard = lock.lock().await;
                write_snapshot(&path, &account.to_snapshot(now_iso())).await
            }
        }
    }

    /// Current contents of the account at `endpoint`
    pub async fn account_snapshot(&self, endpoint: &str) -> Result<AccountSnapshot, StoreError> {
        match &self.backing {
            Backing::Memory(accounts) => {
                let account = accounts
                    .lock()
                    .await
                    .get(endpoint)
                    .cloned()
                    .ok_or_else(|| StoreError::Unreachable(endpoint.to_string()))?;
                let snapshot = account.lock().await.to_snapshot(now_iso());
                Ok(snapshot)
            }
            Backing::File => read_snapshot(&PathBuf::from(endpoint))
                .await?
                .ok_or_else(|| StoreError::Unreachable(endpoint.to_string())),
        }
    }
}

#[async_trait]
impl DocumentStore for EmulatorStore {
    type Connection = EmulatorConnection;

    async fn connect(
        &self,
        endpoint: &str,
        credential: &str,
    ) -> Result<EmulatorConnection, StoreError> {
        let (primary_key, source) = match &self.backing {
            Backing::Memory(accounts) => {
                let account = accounts
                    .lock()
                    .await
                    .get(endpoint)
                    .cloned()
                    .ok_or_else(|| StoreError::Unreachable(endpoint.to_string()))?;
                let primary_key = account.lock().await.primary_key.clone();
                (primary_key, Source::Memory(account))
            }
            Backing::File => {
                let path = PathBuf::from(endpoint);
                let account = load_account(&path).await?;
                (account.primary_key, Source::File(path))
            }
        };

        if primary_key != credential {
            return Err(StoreError::Authentication(endpoint.to_string()));
        }

        debug!(endpoint, "Connected to emulator account");

        Ok(EmulatorConnection {
            endpoint: endpoint.to_string(),
            source,
            page_size: self.page_size,
            closed: AtomicBool::new(false),
        })
    }
}

pub struct EmulatorConnection {
    endpoint: String,
    source: Source,
    page_size: usize,
    closed: AtomicBool,
}

impl EmulatorConnection {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    /// Run `f` against the current account state
    async fn read<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Account) -> Result<T, StoreError> + Send,
        T: Send,
    {
        self.ensure_open()?;
        match &self.source {
            Source::Memory(account) => f(&*account.lock().await),
            Source::File(path) => {
                let lock = snapshot_lock(path).await;
                let _guard = lock.lock().await;
                f(&load_account(path).await?)
            }
        }
    }

    /// Apply `f` to the account. File-backed changes only count once the
    /// snapshot is written; a failed write leaves the file as it was.
    async fn modify<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Account) -> Result<(), StoreError> + Send,
    {
        self.ensure_open()?;
        match &self.source {
            Source::Memory(account) => f(&mut *account.lock().await),
            Source::File(path) => {
                let lock = snapshot_lock(path).await;
                let _guard = lock.lock().await;
                let mut account = load_account(path).await?;
                f(&mut account)?;
                write_snapshot(path, &account.to_snapshot(now_iso())).await
            }
        }
    }
}

fn decode_item_token(token: String) -> Result<(String, String), StoreError> {
    serde_json::from_str(&token)
        .map_err(|_| StoreError::BadRequest(format!("invalid continuation token: {}", token)))
}

#[async_trait]
impl StoreConnection for EmulatorConnection {
    async fn read_databases(
        &self,
        continuation: Option<String>,
    ) -> Result<Page<String>, StoreError> {
        let page_size = self.page_size;
        self.read(|account| Ok(account.database_names(continuation, page_size)))
            .await
    }

    async fn read_containers(
        &self,
        database: &str,
        continuation: Option<String>,
    ) -> Result<Page<String>, StoreError> {
        let page_size = self.page_size;
        self.read(|account| account.container_names(database, continuation, page_size))
            .await
    }

    async fn read_container(
        &self,
        collection: &CollectionRef,
    ) -> Result<ContainerProperties, StoreError> {
        self.read(|account| account.properties(collection)).await
    }

    async fn create_document(
        &self,
        collection: &CollectionRef,
        document: &Document,
        partition_key: &PartitionKey,
    ) -> Result<(), StoreError> {
        self.modify(|account| account.insert(collection, document, partition_key))
            .await
    }

    async fn query_projected(
        &self,
        collection: &CollectionRef,
        fields: &[String],
        continuation: Option<String>,
    ) -> Result<Page<Document>, StoreError> {
        let after = continuation.map(decode_item_token).transpose()?;
        let page_size = self.page_size;

        let (items, next) = self
            .read(|account| account.project(collection, fields, after, page_size))
            .await?;

        let continuation = next
            .map(|key| serde_json::to_string(&key))
            .transpose()?;
        Ok(Page {
            items,
            continuation,
        })
    }

    async fn delete_document(
        &self,
        collection: &CollectionRef,
        id: &str,
        partition_key: &PartitionKey,
    ) -> Result<(), StoreError> {
        self.modify(|account| account.remove(collection, id, partition_key))
            .await
    }

    async fn disconnect(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        debug!(endpoint = %self.endpoint, "Disconnected from emulator account");
        Ok(())
    }
}
