use super::ReconcileError;
use crate::store::{CollectionRef, Document, PartitionKey, StoreConnection};
use crate::utils::ID_FIELD;
use tracing::debug;

/// Resolve the top-level field a container is partitioned by.
///
/// Reads the container's current metadata on every call and returns its
/// first declared partition key path without the leading `/`.
pub async fn resolve_partition_key_path<C>(
    connection: &C,
    collection: &CollectionRef,
) -> Result<String, ReconcileError>
where
    C: StoreConnection + ?Sized,
{
    let properties = connection.read_container(collection).await?;

    let path = properties
        .partition_key_paths
        .first()
        .ok_or_else(|| {
            ReconcileError::Configuration(format!(
                "no partition key defined for container {}",
                collection
            ))
        })?;

    let field = path.trim_start_matches('/').to_string();
    debug!(collection = %collection, field = %field, "Resolved partition key path");
    Ok(field)
}

/// The routing value of `document`, if it has a non-empty one
pub fn partition_key_value(document: &Document, field: &str) -> Option<PartitionKey> {
    document.get(field).and_then(PartitionKey::from_value)
}

/// The `id` of `document` as text, if present and non-empty
pub fn document_id(document: &Document) -> Option<String> {
    document
        .get(ID_FIELD)
        .and_then(PartitionKey::from_value)
        .map(|id| id.as_str().to_string())
}
