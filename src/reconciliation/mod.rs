//! Document reconciliation against a live container.
//!
//! Every operation derives the partition key field from the container's
//! current metadata, then issues one store call per document in order.
//! Nothing is retried or rolled back: a failure part way through a batch
//! leaves the earlier documents applied.

mod partition;
mod purge;
mod upload;

pub use partition::{document_id, partition_key_value, resolve_partition_key_path};
pub use purge::delete_all_items;
pub use upload::upload_batch;

use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Partition key property '{field}' cannot be null or empty.")]
    Validation { field: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
