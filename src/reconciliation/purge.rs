use super::partition::{document_id, partition_key_value, resolve_partition_key_path};
use super::ReconcileError;
use crate::store::{CollectionRef, StoreConnection};
use crate::utils::ID_FIELD;
use tracing::{debug, info, warn};

/// Delete every document in `collection`.
///
/// Pages through a projection of `id` and the partition key field, deleting
/// each row as it is read. Rows lacking either value are skipped.
pub async fn delete_all_items<C>(
    connection: &C,
    collection: &CollectionRef,
) -> Result<(), ReconcileError>
where
    C: StoreConnection + ?Sized,
{
    let field = resolve_partition_key_path(connection, collection).await?;
    let fields = vec![ID_FIELD.to_string(), field.clone()];

    let mut deleted = 0usize;
    let mut skipped = 0usize;
    let mut continuation = None;

    loop {
        let page = connection
            .query_projected(collection, &fields, continuation)
            .await?;

        for row in &page.items {
            match (document_id(row), partition_key_value(row, &field)) {
                (Some(id), Some(partition_key)) => {
                    debug!(collection = %collection, id = %id, "Deleting document");
                    connection
                        .delete_document(collection, &id, &partition_key)
                        .await?;
                    deleted += 1;
                }
                _ => {
                    warn!(collection = %collection, "Skipping row without id or partition key");
                    skipped += 1;
                }
            }
        }

        if !page.has_more_results() {
            break;
        }
        continuation = page.continuation;
    }

    info!(collection = %collection, deleted, skipped, "Deleted all items");
    Ok(())
}
