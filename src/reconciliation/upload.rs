use super::partition::{document_id, partition_key_value, resolve_partition_key_path};
use super::ReconcileError;
use crate::store::{CollectionRef, Document, StoreConnection};
use crate::utils::{generate_document_id, ID_FIELD};
use serde_json::Value;
use tracing::{debug, info};

/// Create every document of `documents` in `collection`, in order.
///
/// The partition key field is resolved once for the whole batch. A document
/// without an `id` gets a freshly generated one written back into it. A
/// document without a partition key value stops the batch with
/// `ReconcileError::Validation`; documents before it stay created.
pub async fn upload_batch<C>(
    connection: &C,
    collection: &CollectionRef,
    documents: &mut [Document],
) -> Result<(), ReconcileError>
where
    C: StoreConnection + ?Sized,
{
    let field = resolve_partition_key_path(connection, collection).await?;

    info!(
        collection = %collection,
        count = documents.len(),
        "Uploading documents"
    );

    for document in documents.iter_mut() {
        let partition_key = partition_key_value(document, &field).ok_or_else(|| {
            ReconcileError::Validation {
                field: field.clone(),
            }
        })?;

        if document_id(document).is_none() {
            document.insert(ID_FIELD.to_string(), Value::String(generate_document_id()));
        }

        debug!(
            collection = %collection,
            partition_key = %partition_key,
            "Creating document"
        );
        connection
            .create_document(collection, document, &partition_key)
            .await?;
    }

    info!(collection = %collection, count = documents.len(), "Upload complete");
    Ok(())
}
