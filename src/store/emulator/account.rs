use super::snapshot::{AccountSnapshot, ContainerSnapshot, DatabaseSnapshot};
use crate::store::{CollectionRef, ContainerProperties, Document, Page, PartitionKey, StoreError};
use std::collections::BTreeMap;
use std::ops::Bound;

/// Items are addressed by partition key text and id. Items stored without a
/// partition key value use the empty string and cannot be addressed by callers.
type ItemKey = (String, String);

/// Live state of one emulated account
#[derive(Debug, Clone)]
pub(crate) struct Account {
    pub primary_key: String,
    databases: BTreeMap<String, Database>,
}

#[derive(Debug, Clone, Default)]
struct Database {
    containers: BTreeMap<String, Container>,
}

#[derive(Debug, Clone, Default)]
struct Container {
    partition_key_paths: Vec<String>,
    items: BTreeMap<ItemKey, Document>,
}

impl Container {
    fn partition_field(&self) -> Option<&str> {
        self.partition_key_paths
            .first()
            .map(|path| path.trim_start_matches('/'))
    }

    fn key_of(&self, document: &Document) -> String {
        self.partition_field()
            .and_then(|field| document.get(field))
            .and_then(PartitionKey::from_value)
            .map(|key| key.as_str().to_string())
            .unwrap_or_default()
    }
}

fn document_id(document: &Document) -> Option<&str> {
    document
        .get("id")
        .and_then(|v| v.as_str())
        .filter(|id| !id.is_empty())
}

/// Take up to `page_size` entries strictly after `after`.
fn page_after<'a, K: Ord + Clone, V>(
    map: &'a BTreeMap<K, V>,
    after: Option<K>,
    page_size: usize,
) -> (Vec<(&'a K, &'a V)>, Option<K>) {
    let lower = match after {
        Some(key) => Bound::Excluded(key),
        None => Bound::Unbounded,
    };
    let mut entries: Vec<(&K, &V)> = map
        .range((lower, Bound::Unbounded))
        .take(page_size + 1)
        .collect();

    if entries.len() > page_size {
        entries.truncate(page_size);
        let next = entries.last().map(|(k, _)| (*k).clone());
        (entries, next)
    } else {
        (entries, None)
    }
}

impl Account {
    pub fn from_snapshot(snapshot: AccountSnapshot) -> Result<Self, StoreError> {
        let mut databases = BTreeMap::new();

        for (db_name, db) in snapshot.databases {
            let mut containers = BTreeMap::new();

            for (container_name, container) in db.containers {
                let mut live = Container {
                    partition_key_paths: container.partition_key_paths,
                    items: BTreeMap::new(),
                };

                for document in container.items {
                    let id = document_id(&document)
                        .ok_or_else(|| {
                            StoreError::BadRequest(format!(
                                "item without id in {}/{}",
                                db_name, container_name
                            ))
                        })?
                        .to_string();
                    let key = (live.key_of(&document), id);
                    if live.items.contains_key(&key) {
                        return Err(StoreError::BadRequest(format!(
                            "duplicate item {} in partition {:?} of {}/{}",
                            key.1, key.0, db_name, container_name
                        )));
                    }
                    live.items.insert(key, document);
                }

                containers.insert(container_name, live);
            }

            databases.insert(db_name, Database { containers });
        }

        Ok(Self {
            primary_key: snapshot.primary_key,
            databases,
        })
    }

    pub fn to_snapshot(&self, updated_at: String) -> AccountSnapshot {
        AccountSnapshot {
            primary_key: self.primary_key.clone(),
            updated_at,
            databases: self
                .databases
                .iter()
                .map(|(name, db)| {
                    let containers = db
                        .containers
                        .iter()
                        .map(|(name, c)| {
                            let snapshot = ContainerSnapshot {
                                partition_key_paths: c.partition_key_paths.clone(),
                                items: c.items.values().cloned().collect(),
                            };
                            (name.clone(), snapshot)
                        })
                        .collect();
                    (name.clone(), DatabaseSnapshot { containers })
                })
                .collect(),
        }
    }

    fn database(&self, name: &str) -> Result<&Database, StoreError> {
        self.databases
            .get(name)
            .ok_or_else(|| StoreError::DatabaseNotFound(name.to_string()))
    }

    fn container(&self, collection: &CollectionRef) -> Result<&Container, StoreError> {
        self.database(&collection.database)?
            .containers
            .get(&collection.container)
            .ok_or_else(|| StoreError::ContainerNotFound(collection.to_string()))
    }

    fn container_mut(&mut self, collection: &CollectionRef) -> Result<&mut Container, StoreError> {
        self.databases
            .get_mut(&collection.database)
            .ok_or_else(|| StoreError::DatabaseNotFound(collection.database.clone()))?
            .containers
            .get_mut(&collection.container)
            .ok_or_else(|| StoreError::ContainerNotFound(collection.to_string()))
    }

    pub fn database_names(&self, after: Option<String>, page_size: usize) -> Page<String> {
        let (entries, next) = page_after(&self.databases, after, page_size);
        Page {
            items: entries.into_iter().map(|(name, _)| name.clone()).collect(),
            continuation: next,
        }
    }

    pub fn container_names(
        &self,
        database: &str,
        after: Option<String>,
        page_size: usize,
    ) -> Result<Page<String>, StoreError> {
        let db = self.database(database)?;
        let (entries, next) = page_after(&db.containers, after, page_size);
        Ok(Page {
            items: entries.into_iter().map(|(name, _)| name.clone()).collect(),
            continuation: next,
        })
    }

    pub fn properties(&self, collection: &CollectionRef) -> Result<ContainerProperties, StoreError> {
        let container = self.container(collection)?;
        Ok(ContainerProperties {
            id: collection.container.clone(),
            partition_key_paths: container.partition_key_paths.clone(),
        })
    }

    pub fn insert(
        &mut self,
        collection: &CollectionRef,
        document: &Document,
        partition_key: &PartitionKey,
    ) -> Result<(), StoreError> {
        let container = self.container_mut(collection)?;

        let id = document_id(document)
            .ok_or_else(|| StoreError::BadRequest("document is missing a string id".to_string()))?
            .to_string();

        if container.partition_field().is_some() {
            let declared = container.key_of(document);
            if declared != partition_key.as_str() {
                return Err(StoreError::BadRequest(format!(
                    "partition key {} does not match document value {:?}",
                    partition_key, declared
                )));
            }
        }

        let key = (partition_key.as_str().to_string(), id);
        if container.items.contains_key(&key) {
            return Err(StoreError::Conflict {
                id: key.1,
                partition_key: key.0,
            });
        }

        container.items.insert(key, document.clone());
        Ok(())
    }

    pub fn project(
        &self,
        collection: &CollectionRef,
        fields: &[String],
        after: Option<ItemKey>,
        page_size: usize,
    ) -> Result<(Vec<Document>, Option<ItemKey>), StoreError> {
        let container = self.container(collection)?;
        let (entries, next) = page_after(&container.items, after, page_size);

        let rows = entries
            .into_iter()
            .map(|(_, document)| {
                fields
                    .iter()
                    .filter_map(|field| {
                        document
                            .get(field)
                            .map(|value| (field.clone(), value.clone()))
                    })
                    .collect::<Document>()
            })
            .collect();

        Ok((rows, next))
    }

    pub fn remove(
        &mut self,
        collection: &CollectionRef,
        id: &str,
        partition_key: &PartitionKey,
    ) -> Result<(), StoreError> {
        let container = self.container_mut(collection)?;
        let key = (partition_key.as_str().to_string(), id.to_string());

        match container.items.remove(&key) {
            Some(_) => Ok(()),
            None => Err(StoreError::DocumentNotFound {
                id: key.1,
                partition_key: key.0,
            }),
        }
    }
}
