use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A structured record as stored in a container (ordered field map)
pub type Document = serde_json::Map<String, Value>;

/// Identifies a container within a database
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRef {
    pub database: String,
    pub container: String,
}

impl CollectionRef {
    pub fn new(database: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            container: container.into(),
        }
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.database, self.container)
    }
}

/// The value a document is routed by
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionKey(String);

impl PartitionKey {
    /// Build a key from a raw string. Empty strings are not valid keys.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Derive a key from a JSON field value.
    ///
    /// Strings are taken verbatim; numbers and booleans use their JSON text;
    /// objects and arrays use their compact JSON encoding. `null` has no key.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Self::new(s.as_str()),
            other => Self::new(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Container metadata as reported by the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerProperties {
    pub id: String,
    /// Declared partition key paths, e.g. `/category`
    #[serde(default)]
    pub partition_key_paths: Vec<String>,
}

/// One page of a paged enumeration
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token to resume from. `None` when there are no more results.
    pub continuation: Option<String>,
}

impl<T> Page<T> {
    pub fn has_more_results(&self) -> bool {
        self.continuation.is_some()
    }
}
