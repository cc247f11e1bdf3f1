pub mod config;
pub mod input;
pub mod reconciliation;
pub mod service;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::{read_config, ConfigError, MigratorConfig};
pub use input::{load_documents, parse_documents, InputError};
pub use reconciliation::{
    delete_all_items, resolve_partition_key_path, upload_batch, ReconcileError,
};
pub use service::{MigratorService, ServiceError};
pub use store::{
    CollectionRef, ContainerProperties, Document, DocumentStore, EmulatorStore, Page,
    PartitionKey, StoreConnection, StoreError,
};
