mod common;

use common::{connect, create_store, doc, orders, shop_account, Call, RecordingConnection, ENDPOINT};
use cosmos_migrator::reconciliation::{
    delete_all_items, resolve_partition_key_path, upload_batch, ReconcileError,
};
use cosmos_migrator::store::{AccountSnapshot, CollectionRef, Document, StoreError};
use serde_json::json;
use std::collections::HashSet;

// ============ Partition Key Resolution ============

#[tokio::test]
async fn test_resolve_partition_key_path_strips_separator() {
    let store = create_store(shop_account(), 100).await;
    let connection = connect(&store).await;

    let field = resolve_partition_key_path(&connection, &orders())
        .await
        .expect("Should resolve");
    assert_eq!(field, "category");
}

#[tokio::test]
async fn test_resolve_partition_key_path_takes_first_path() {
    let mut snapshot = shop_account();
    snapshot
        .databases
        .get_mut("shop")
        .unwrap()
        .containers
        .get_mut("orders")
        .unwrap()
        .partition_key_paths = vec!["/tenant".to_string(), "/region".to_string()];

    let store = create_store(snapshot, 100).await;
    let connection = connect(&store).await;

    let field = resolve_partition_key_path(&connection, &orders()).await.unwrap();
    assert_eq!(field, "tenant");
}

#[tokio::test]
async fn test_resolve_partition_key_path_without_paths() {
    let snapshot = AccountSnapshot::new(common::PRIMARY_KEY).with_container("shop", "orders", None);
    let store = create_store(snapshot, 100).await;
    let connection = connect(&store).await;

    let result = resolve_partition_key_path(&connection, &orders()).await;
    match result {
        Err(ReconcileError::Configuration(message)) => {
            assert!(message.contains("no partition key defined"));
        }
        other => panic!("Expected configuration error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_resolve_partition_key_path_unknown_container() {
    let store = create_store(shop_account(), 100).await;
    let connection = connect(&store).await;

    let result =
        resolve_partition_key_path(&connection, &CollectionRef::new("shop", "missing")).await;
    assert!(matches!(
        result,
        Err(ReconcileError::Store(StoreError::ContainerNotFound(_)))
    ));
}

// ============ Upload ============

#[tokio::test]
async fn test_upload_batch_creates_and_generates_ids() {
    let store = create_store(shop_account(), 100).await;
    let connection = RecordingConnection::new(connect(&store).await);

    let mut batch = vec![
        doc(json!({"id": "a1", "category": "x"})),
        doc(json!({"category": "y"})),
    ];

    upload_batch(&connection, &orders(), &mut batch)
        .await
        .expect("Should upload");

    let creates = connection.creates();
    assert_eq!(creates.len(), 2);
    assert_eq!(creates[0], ("a1".to_string(), "x".to_string()));
    assert_eq!(creates[1].1, "y");

    // Existing id untouched, generated id written back into the document
    assert_eq!(batch[0]["id"], "a1");
    let generated = batch[1]["id"].as_str().expect("id should be a string");
    assert!(!generated.is_empty());
    assert_eq!(creates[1].0, generated);

    let snapshot = store.account_snapshot(ENDPOINT).await.unwrap();
    assert_eq!(snapshot.databases["shop"].containers["orders"].items.len(), 2);
}

#[tokio::test]
async fn test_upload_batch_resolves_partition_key_once() {
    let store = create_store(shop_account(), 100).await;
    let connection = RecordingConnection::new(connect(&store).await);

    let mut batch: Vec<_> = (0..5)
        .map(|i| doc(json!({"id": format!("d{}", i), "category": "x"})))
        .collect();

    upload_batch(&connection, &orders(), &mut batch).await.unwrap();

    let reads = connection
        .calls()
        .into_iter()
        .filter(|c| *c == Call::ReadContainer)
        .count();
    assert_eq!(reads, 1);
    assert_eq!(connection.creates().len(), 5);
}

#[tokio::test]
async fn test_upload_batch_generated_ids_are_distinct() {
    let store = create_store(shop_account(), 100).await;
    let connection = RecordingConnection::new(connect(&store).await);

    let mut batch: Vec<_> = (0..20).map(|_| doc(json!({"category": "x"}))).collect();
    upload_batch(&connection, &orders(), &mut batch).await.unwrap();

    let ids: HashSet<String> = connection.creates().into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids.len(), 20);
    assert!(ids.iter().all(|id| !id.is_empty()));
}

#[tokio::test]
async fn test_upload_batch_replaces_empty_id() {
    let store = create_store(shop_account(), 100).await;
    let connection = RecordingConnection::new(connect(&store).await);

    let mut batch = vec![doc(json!({"id": "", "category": "x"}))];
    upload_batch(&connection, &orders(), &mut batch).await.unwrap();

    assert!(!batch[0]["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_batch_missing_partition_key() {
    let store = create_store(shop_account(), 100).await;
    let connection = RecordingConnection::new(connect(&store).await);

    let mut batch = vec![doc(json!({"id": "a1"}))];
    let err = upload_batch(&connection, &orders(), &mut batch)
        .await
        .expect_err("Should fail validation");

    match &err {
        ReconcileError::Validation { field } => assert_eq!(field, "category"),
        other => panic!("Expected validation error, got {:?}", other),
    }
    assert!(err.to_string().contains("category"));
    assert!(connection.creates().is_empty());
}

#[tokio::test]
async fn test_upload_batch_stops_at_invalid_document() {
    let store = create_store(shop_account(), 100).await;
    let connection = RecordingConnection::new(connect(&store).await);

    let mut batch = vec![
        doc(json!({"id": "a1", "category": "x"})),
        doc(json!({"id": "a2", "category": ""})),
        doc(json!({"id": "a3", "category": "z"})),
    ];

    let result = upload_batch(&connection, &orders(), &mut batch).await;
    assert!(matches!(result, Err(ReconcileError::Validation { .. })));

    // The first document stays created; nothing after the invalid one is sent
    assert_eq!(connection.creates(), vec![("a1".to_string(), "x".to_string())]);
    let snapshot = store.account_snapshot(ENDPOINT).await.unwrap();
    let items = &snapshot.databases["shop"].containers["orders"].items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "a1");
}

#[tokio::test]
async fn test_upload_batch_propagates_store_errors() {
    let store = create_store(shop_account(), 100).await;
    let connection = RecordingConnection::new(connect(&store).await);

    let mut batch = vec![
        doc(json!({"id": "dup", "category": "x"})),
        doc(json!({"id": "dup", "category": "x"})),
        doc(json!({"id": "after", "category": "x"})),
    ];

    let result = upload_batch(&connection, &orders(), &mut batch).await;
    assert!(matches!(
        result,
        Err(ReconcileError::Store(StoreError::Conflict { .. }))
    ));
    assert_eq!(connection.creates().len(), 2);
}

#[tokio::test]
async fn test_upload_empty_batch() {
    let store = create_store(shop_account(), 100).await;
    let connection = RecordingConnection::new(connect(&store).await);

    let mut batch: Vec<Document> = Vec::new();
    upload_batch(&connection, &orders(), &mut batch).await.unwrap();
    assert!(connection.creates().is_empty());
}

// ============ Delete All ============

#[tokio::test]
async fn test_delete_all_items_on_empty_container() {
    let store = create_store(shop_account(), 100).await;
    let connection = RecordingConnection::new(connect(&store).await);

    delete_all_items(&connection, &orders())
        .await
        .expect("Should succeed on empty container");
    assert!(connection.deletes().is_empty());
}

#[tokio::test]
async fn test_delete_all_items_skips_rows_without_partition_key() {
    let snapshot = shop_account()
        .with_document("shop", "orders", doc(json!({"id": "a", "category": "x", "total": 3})))
        .with_document("shop", "orders", doc(json!({"id": "b"})))
        .with_document("shop", "orders", doc(json!({"id": "c", "category": "y"})));
    let store = create_store(snapshot, 100).await;
    let connection = RecordingConnection::new(connect(&store).await);

    delete_all_items(&connection, &orders()).await.unwrap();

    let mut deletes = connection.deletes();
    deletes.sort();
    assert_eq!(
        deletes,
        vec![
            ("a".to_string(), "x".to_string()),
            ("c".to_string(), "y".to_string()),
        ]
    );

    let snapshot = store.account_snapshot(ENDPOINT).await.unwrap();
    let items = &snapshot.databases["shop"].containers["orders"].items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "b");
}

#[tokio::test]
async fn test_delete_all_items_across_pages() {
    let mut snapshot = shop_account();
    for i in 0..5 {
        snapshot = snapshot.with_document(
            "shop",
            "orders",
            doc(json!({"id": format!("item-{}", i), "category": format!("c{}", i % 2)})),
        );
    }
    let store = create_store(snapshot, 2).await;
    let connection = RecordingConnection::new(connect(&store).await);

    delete_all_items(&connection, &orders()).await.unwrap();

    assert_eq!(connection.deletes().len(), 5);
    let queries = connection
        .calls()
        .into_iter()
        .filter(|c| *c == Call::Query)
        .count();
    assert_eq!(queries, 3);

    let snapshot = store.account_snapshot(ENDPOINT).await.unwrap();
    assert!(snapshot.databases["shop"].containers["orders"].items.is_empty());
}

#[tokio::test]
async fn test_delete_all_items_without_partition_key_definition() {
    let snapshot = AccountSnapshot::new(common::PRIMARY_KEY)
        .with_container("shop", "orders", None)
        .with_document("shop", "orders", doc(json!({"id": "a"})));
    let store = create_store(snapshot, 100).await;
    let connection = RecordingConnection::new(connect(&store).await);

    let result = delete_all_items(&connection, &orders()).await;
    assert!(matches!(result, Err(ReconcileError::Configuration(_))));
    assert!(!connection.calls().contains(&Call::Query));
}
