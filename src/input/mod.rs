use crate::store::Document;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Element {0} is not a JSON object")]
    NotAnObject(usize),
}

/// Parse a batch from JSON text: an array of objects or a single object
pub fn parse_documents(content: &str) -> Result<Vec<Document>, InputError> {
    match serde_json::from_str::<Value>(content)? {
        Value::Array(values) => values
            .into_iter()
            .enumerate()
            .map(|(index, value)| match value {
                Value::Object(document) => Ok(document),
                _ => Err(InputError::NotAnObject(index)),
            })
            .collect(),
        Value::Object(document) => Ok(vec![document]),
        _ => Err(InputError::NotAnObject(0)),
    }
}

/// Load a batch of documents from a JSON file
pub async fn load_documents(path: &Path) -> Result<Vec<Document>, InputError> {
    let content = fs::read_to_string(path).await?;
    parse_documents(&content)
}
