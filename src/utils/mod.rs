use uuid::Uuid;

/// Name of the field every document is identified by
pub const ID_FIELD: &str = "id";

/// Get current timestamp in ISO 8601 format
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Generate a fresh globally-unique document id
pub fn generate_document_id() -> String {
    Uuid::new_v4().to_string()
}
